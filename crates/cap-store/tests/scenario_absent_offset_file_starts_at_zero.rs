use cap_store::*;

#[test]
fn scenario_absent_offset_file_reads_zero_and_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output").join("capacityOffset.json");
    assert!(!path.exists());

    let mut cp = FileCheckpoint::new(&path);
    let fresh = cp.read_offset().unwrap();
    assert_eq!(fresh.offset, 0);
    assert_eq!(fresh.resume_position(), 0);
    assert!(path.exists());

    let on_disk: OffsetState =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, OffsetState::FRESH);

    // First processed record's position becomes the persisted offset.
    assert_eq!(cp.advance(0).unwrap(), Advance::Written);
    assert_eq!(cp.advance(1).unwrap(), Advance::Written);
    assert_eq!(
        FileCheckpoint::new(&path).read_offset().unwrap(),
        OffsetState::processed(1)
    );
}

#[test]
fn scenario_processed_record_zero_is_not_read_again_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capacityOffset.json");

    let mut cp = FileCheckpoint::new(&path);
    assert_eq!(cp.read_offset().unwrap().resume_position(), 0);
    assert_eq!(cp.advance(0).unwrap(), Advance::Written);
    drop(cp);

    let state = FileCheckpoint::new(&path).read_offset().unwrap();
    assert_eq!(state.offset, 0);
    assert_eq!(state.resume_position(), 1);
}
