use std::collections::BTreeMap;

/// Icons used when configuration does not override them.
pub const DEFAULT_PROFILE_ICONS: &[(&str, &str)] = &[
    ("sei", ":vmw2:"),
    ("seix", ":lizard:"),
    ("3x", ":vmware:"),
    ("uma", ":floppy_disk:"),
];

/// Profile -> chat emoji. Built once from configuration at startup and
/// handed to the notifier; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIcons(BTreeMap<String, String>);

impl ProfileIcons {
    /// Exactly `map`, no built-in icons.
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Built-in icons with `overrides` applied on top.
    pub fn with_overrides(overrides: BTreeMap<String, String>) -> Self {
        let mut icons = Self::default();
        icons.0.extend(overrides);
        icons
    }

    /// Empty string for unmapped profiles.
    pub fn icon_for(&self, profile: &str) -> &str {
        self.0.get(profile).map(String::as_str).unwrap_or("")
    }
}

impl Default for ProfileIcons {
    fn default() -> Self {
        Self(
            DEFAULT_PROFILE_ICONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
