#[test]
fn test_log_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h36m.log");

    let _guard = env_tracing_logger::initiate_logging(Some(&path), true, "debug").unwrap();
    tracing::info!("decoded {} cameras", 4);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("decoded 4 cameras"), "{contents}");

    // only one global subscriber per process
    assert!(env_tracing_logger::initiate_logging::<&str>(None, true, "info").is_err());
}
