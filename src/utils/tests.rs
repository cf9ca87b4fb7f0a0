use super::error::TransportError;
use super::logging;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warning");
    logging::init("nonsense");
}

#[test]
fn transport_error_messages() {
    assert_eq!(TransportError::Closed.to_string(), "feed connection is closed");
    assert_eq!(
        TransportError::Exhausted.to_string(),
        "no connection available"
    );
}
