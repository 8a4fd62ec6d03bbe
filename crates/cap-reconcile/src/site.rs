const SITE_REMAP: &[(&str, &str)] = &[("POK1E", "POK02"), ("DAL1E", "DAL00")];

/// Map a telemetry site id onto the inventory's naming. Unlisted ids pass
/// through unchanged.
pub fn normalize_site(site: &str) -> String {
    SITE_REMAP
        .iter()
        .find(|(from, _)| *from == site)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| site.to_string())
}
