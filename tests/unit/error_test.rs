//! Tests for error types

use prometheus_client_pool::core::ClientPoolError;

#[test]
fn test_invalid_config_error() {
    let err = ClientPoolError::InvalidConfig("channel id must not be empty".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: channel id must not be empty"
    );
}

#[test]
fn test_client_start_error() {
    let err = ClientPoolError::ClientStart {
        priority: 2,
        reason: "refused".to_string(),
    };
    assert_eq!(format!("{}", err), "client 2 failed to start: refused");
}

#[test]
fn test_reset_cancelled_error() {
    let err = ClientPoolError::ResetCancelled {
        priority: 1,
        attempts: 3,
    };
    assert_eq!(
        format!("{}", err),
        "reset of client 1 cancelled after 3 attempts"
    );
}

#[test]
fn test_client_not_found_error() {
    let err = ClientPoolError::ClientNotFound(9);
    assert_eq!(format!("{}", err), "no client for priority 9");
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn fabric() -> Result<(), ClientPoolError> {
        Err(ClientPoolError::Fabric("socket closed".to_string()))
    }
    fn fails() -> prometheus_client_pool::core::AppResult<()> {
        fabric()?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "fabric error: socket closed");
    assert!(err.downcast_ref::<ClientPoolError>().is_some());
}
