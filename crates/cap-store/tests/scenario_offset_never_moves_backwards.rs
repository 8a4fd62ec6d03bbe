use cap_store::*;

#[test]
fn scenario_offset_is_monotonic_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capacityOffset.json");

    let mut cp = FileCheckpoint::new(&path);
    cp.read_offset().unwrap();
    for offset in [5, 6, 9] {
        assert_eq!(cp.advance(offset).unwrap(), Advance::Written);
    }
    drop(cp);

    // Restart: a late/replayed record below the persisted position is ignored.
    let mut cp = FileCheckpoint::new(&path);
    assert_eq!(cp.read_offset().unwrap().offset, 9);
    assert_eq!(cp.advance(7).unwrap(), Advance::Stale { current: 9 });
    assert_eq!(cp.read_offset().unwrap().offset, 9);

    // Re-writing the same position is allowed (at-least-once replay).
    assert_eq!(cp.advance(9).unwrap(), Advance::Written);
    assert_eq!(cp.read_offset().unwrap().resume_position(), 10);
}

#[test]
fn scenario_advance_without_prior_read_still_guards() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capacityOffset.json");
    std::fs::write(&path, r#"{"offset":20}"#).unwrap();

    let mut cp = FileCheckpoint::new(&path);
    assert_eq!(cp.advance(3).unwrap(), Advance::Stale { current: 20 });
    assert_eq!(cp.advance(21).unwrap(), Advance::Written);
    assert!(!dir.path().join("capacityOffset.json.tmp").exists());
}

#[test]
fn scenario_unwritable_location_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the parent directory should be.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();

    let mut cp = FileCheckpoint::new(blocker.join("capacityOffset.json"));
    assert!(matches!(cp.advance(1), Err(CheckpointError::Io { .. })));
}
