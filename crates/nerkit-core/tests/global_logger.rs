use nerkit_core::{Logger, NerError};

#[test]
fn second_global_install_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let first = Logger::new(dir.path().join("log.txt")).unwrap();
    let second = Logger::new(dir.path().join("log.txt")).unwrap();

    first.install_global().unwrap();
    tracing::info!("global event");

    assert!(matches!(
        second.install_global(),
        Err(NerError::LoggerAlreadyInstalled)
    ));

    let log = std::fs::read_to_string(first.path()).unwrap();
    assert_eq!(log.matches("global event").count(), 1);
}
