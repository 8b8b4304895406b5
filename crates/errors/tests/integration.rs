//! Integration tests for error types

#[cfg(test)]
mod tests {
    use soldeploy_errors::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = ImportError::TimedOut {
            package: "Core".into(),
            job_id: "job-1".into(),
            elapsed_secs: 60,
        }
        .into();
        assert!(matches!(err, Error::Import(ImportError::TimedOut { .. })));
    }

    #[test]
    fn test_error_display() {
        let err = DeployError::NotFound {
            package: "Core".into(),
        };
        assert_eq!(err.to_string(), "package not installed: Core");
    }

    #[test]
    fn test_failed_import_keeps_remote_message_verbatim() {
        let err: Error = ImportError::Failed {
            package: "Core".into(),
            status_code: 31,
            message: "Solution dependency missing: Base 1.2".into(),
        }
        .into();
        assert!(err.to_string().contains("Solution dependency missing: Base 1.2"));
        assert_eq!(err.remote_status_code(), Some(31));
        assert_eq!(err.user_code(), Some("import.failed"));
    }

    #[test]
    fn test_remote_timeout_detection() {
        let timeout: Error = RemoteError::Timeout {
            operation: "delete".into(),
        }
        .into();
        assert!(timeout.is_remote_timeout());
        assert!(timeout.is_retryable());

        let import_timeout: Error = ImportError::TimedOut {
            package: "Core".into(),
            job_id: "job".into(),
            elapsed_secs: 5,
        }
        .into();
        assert!(!import_timeout.is_remote_timeout());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }

    #[test]
    fn test_config_hint_for_incompatible_settings() {
        let err = ConfigError::Incompatible {
            package: "Core".into(),
            reason: "force_upgrade with promote".into(),
        };
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }
}
