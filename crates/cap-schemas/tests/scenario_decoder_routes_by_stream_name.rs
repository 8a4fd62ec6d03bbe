use cap_schemas::*;

#[test]
fn scenario_decoder_routes_each_stream_to_its_record_shape() {
    let vm = br#"{"streamName":"xseries.vminfo","data":[{
        "VM_NAME":"vm-1","CPU":4,"MEMORY_REQUESTED_GB":16,"STORAGE_REQUESTED_GB":200,
        "PODID":"7","SITE_ID":"DAL1E","DATACENTER":"DAL09"}]}"#;
    match decode(vm).unwrap() {
        TelemetryRecord::Vm { data } => {
            assert_eq!(data.len(), 1);
            assert_eq!(data[0].name, "vm-1");
            assert_eq!(data[0].storage_requested_gb, 200);
        }
        other => panic!("expected vm record, got {other:?}"),
    }

    let ds = br#"{"streamName":"xseries.datastore","data":[{
        "DATASTORE_NAME":"DS1","PODID":"7","DATACENTER":"DAL09","TOTAL_GB":1000,
        "REQUESTED_GB":500,"COMMITTED_GB":450,"SITE_ID":"DAL1E","DOCID":"ignored"}]}"#;
    let rec = decode(ds).unwrap();
    assert_eq!(rec.kind(), RecordKind::Datastore);
    assert_eq!(rec.len(), 1);

    let host = br#"{"streamName":"xseries.esx_host","data":[{
        "HOSTNAME":"esx-09","PODID":"7","ESXNAME":"POOL-A","DATACENTER":"DAL09"}]}"#;
    match decode(host).unwrap() {
        TelemetryRecord::ClusterHost { data } => assert_eq!(data[0].cluster_name, "POOL-A"),
        other => panic!("expected cluster-host record, got {other:?}"),
    }
}

#[test]
fn scenario_both_cluster_streams_decode_to_cluster_records_tagged_with_their_stream() {
    let pool = br#"{"streamName":"xseries.resource_pool","data":[{
        "SITE_ID":"POK1E","PODID":"7","DATACENTER":"DAL09","POOL_NAME":"POOL-A",
        "VCPU_TOTAL":100,"VCPU_REQUESTED":40,"MEMORY_TOTAL_GB":512,"MEMORY_REQUESTED_GB":128,
        "VCPU_TOTAL_REQUESTED_PCT":40.0,"VERSION":"CMS 3.x"}]}"#;
    match decode(pool).unwrap() {
        TelemetryRecord::Cluster { stream, data } => {
            assert_eq!(stream, StreamKind::ResourcePool);
            assert!(data[0].is_resource_pool());
            assert_eq!(data[0].esx_name, "");
        }
        other => panic!("expected cluster record, got {other:?}"),
    }

    let cluster = br#"{"streamName":"xseries.esx_cluster","data":[{
        "SITE_ID":"DAL10","PODID":"2","DATACENTER":"DAL10","ESXNAME":"CL-1",
        "VCPU_TOTAL":100,"VCPU_REQUESTED":40,"MEMORY_TOTAL_GB":512,"MEMORY_REQUESTED_GB":128,
        "VERSION":"CMS 2.x"}]}"#;
    let rec = decode(cluster).unwrap();
    assert_eq!(rec.stream(), StreamKind::EsxCluster);
    assert_eq!(rec.kind(), RecordKind::Cluster);
}

#[test]
fn scenario_unknown_stream_is_reported_not_guessed() {
    let err = decode(br#"{"streamName":"xseries.nsx_edge","data":[]}"#).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnknownStreamKind {
            stream_name: "xseries.nsx_edge".to_string()
        }
    );
}

#[test]
fn scenario_missing_or_mistyped_fields_are_malformed() {
    // VCPU_REQUESTED missing.
    let missing = br#"{"streamName":"xseries.esx_cluster","data":[{
        "SITE_ID":"DAL10","PODID":"2","DATACENTER":"DAL10","ESXNAME":"CL-1",
        "VCPU_TOTAL":100,"MEMORY_TOTAL_GB":512,"MEMORY_REQUESTED_GB":128}]}"#;
    match decode(missing).unwrap_err() {
        DecodeError::MalformedPayload { stream, .. } => {
            assert_eq!(stream, Some(StreamKind::EsxCluster))
        }
        other => panic!("expected malformed payload, got {other:?}"),
    }

    // REQUESTED_GB as a string.
    let mistyped = br#"{"streamName":"xseries.datastore","data":[{
        "DATASTORE_NAME":"DS1","PODID":"7","DATACENTER":"DAL09","TOTAL_GB":1000,
        "REQUESTED_GB":"500","COMMITTED_GB":450,"SITE_ID":"DAL1E"}]}"#;
    assert!(matches!(
        decode(mistyped),
        Err(DecodeError::MalformedPayload { .. })
    ));

    // Not JSON at all, and no discriminator.
    assert!(matches!(
        decode(b"not json"),
        Err(DecodeError::MalformedPayload { stream: None, .. })
    ));
    assert!(matches!(
        decode(br#"{"data":[]}"#),
        Err(DecodeError::MalformedPayload { stream: None, .. })
    ));
}

#[test]
fn scenario_empty_data_array_is_a_valid_empty_record() {
    let rec = decode(br#"{"streamName":"xseries.vminfo","data":[]}"#).unwrap();
    assert!(rec.is_empty());
}
