//! Integration tests for gateway

#[cfg(test)]
mod tests {
    use soldeploy_errors::{DeployError, Error, ImportError, RemoteError};
    use soldeploy_events::{channel, AppEvent, DeployEvent, GeneralEvent};
    use soldeploy_gateway::*;
    use soldeploy_remote::{AsyncJobSnapshot, ImportRequest, RemoteService};
    use soldeploy_types::{AsyncJobStatus, ImportOptions, RemoteImportResult, SolutionVersion};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// Remote double that replays scripted poll statuses and records calls
    #[derive(Default)]
    struct ScriptedRemote {
        polls: Mutex<VecDeque<i32>>,
        sync_error: Mutex<Option<Error>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        fn with_polls(codes: &[i32]) -> Self {
            Self {
                polls: Mutex::new(codes.iter().copied().collect()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    #[async_trait::async_trait]
    impl RemoteService for ScriptedRemote {
        async fn resolve_installed_version(
            &self,
            unique_name: &str,
        ) -> Result<Option<SolutionVersion>, Error> {
            self.record(format!("resolve {unique_name}"));
            Ok(None)
        }

        async fn import_sync(&self, request: &ImportRequest) -> Result<(), Error> {
            self.record(format!("import_sync {}", request.label));
            match self.sync_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn import_async_submit(&self, request: &ImportRequest) -> Result<String, Error> {
            self.record(format!("submit {}", request.label));
            Ok("job-1".to_string())
        }

        async fn import_async_poll(&self, job_id: &str) -> Result<AsyncJobSnapshot, Error> {
            self.record("poll");
            let code = self.polls.lock().unwrap().pop_front().unwrap_or(20);
            Ok(AsyncJobSnapshot {
                job_id: job_id.to_string(),
                status: AsyncJobStatus::from_code(code),
                message: format!("status {code}"),
            })
        }

        async fn fetch_import_report(
            &self,
            import_job_id: Uuid,
        ) -> Result<RemoteImportResult, Error> {
            self.record("report");
            Ok(RemoteImportResult::succeeded(
                import_job_id.to_string(),
                "Import completed",
            ))
        }

        async fn promote(&self, unique_name: &str) -> Result<(), Error> {
            self.record(format!("promote {unique_name}"));
            Ok(())
        }

        async fn delete_by_name(&self, unique_name: &str) -> Result<(), Error> {
            self.record(format!("delete {unique_name}"));
            Err(RemoteError::NotFound {
                name: unique_name.to_string(),
            }
            .into())
        }
    }

    fn subject(dir: &TempDir) -> ImportSubject {
        let path = dir.path().join("Core.zip");
        std::fs::write(&path, b"package").unwrap();
        ImportSubject {
            unique_name: "Core".to_string(),
            version: SolutionVersion::new(2, 0, 0),
            path,
        }
    }

    fn async_options() -> ImportOptions {
        ImportOptions {
            use_async: true,
            poll_interval: Duration::from_secs(15),
            timeout: Duration::from_secs(3600),
            ..ImportOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_import_polls_until_succeeded() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::with_polls(&[20, 20, 20, 30]));
        let (tx, mut rx) = channel();
        let mut gateway = ImportGateway::new(remote.clone()).with_event_sender(tx);

        let started = tokio::time::Instant::now();
        let result = gateway
            .import(&subject(&dir), &async_options())
            .await
            .unwrap();

        assert_eq!(result.message, "Import completed");
        assert!(started.elapsed() < Duration::from_secs(3600));
        assert_eq!(
            remote.calls(),
            ["submit Core", "poll", "poll", "poll", "poll", "report"]
        );
        assert_eq!(gateway.state(), &GatewayState::Idle);

        let mut polled = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let AppEvent::Deploy(DeployEvent::ImportPolled { status, .. }) = msg.event {
                polled.push(status.code());
            }
        }
        assert_eq!(polled, [20, 20, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_import_times_out_distinctly() {
        let dir = TempDir::new().unwrap();
        // Never terminal
        let remote = Arc::new(ScriptedRemote::with_polls(&[]));
        let mut gateway = ImportGateway::new(remote);

        let options = ImportOptions {
            timeout: Duration::from_secs(60),
            ..async_options()
        };
        let err = gateway.import(&subject(&dir), &options).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Import(ImportError::TimedOut { elapsed_secs, .. }) if elapsed_secs >= 60
        ));
        assert_eq!(gateway.state(), &GatewayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pausing_job_is_failure_with_remote_message() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::with_polls(&[20, 21]));
        let mut gateway = ImportGateway::new(remote);

        let err = gateway
            .import(&subject(&dir), &async_options())
            .await
            .unwrap_err();
        match err {
            Error::Import(ImportError::Failed {
                status_code,
                message,
                ..
            }) => {
                assert_eq!(status_code, 21);
                assert_eq!(message, "status 21");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_wait_returns_current_status() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::with_polls(&[10]));
        let mut gateway = ImportGateway::new(remote.clone());

        let options = ImportOptions {
            wait_for_completion: false,
            ..async_options()
        };
        let result = gateway.import(&subject(&dir), &options).await.unwrap();
        assert_eq!(result.status_code, 10);
        assert_eq!(result.correlation_id, "job-1");
        assert_eq!(remote.calls(), ["submit Core", "poll"]);
        // The outstanding job is the caller's to follow
        assert_eq!(gateway.state(), &GatewayState::Idle);
    }

    #[tokio::test]
    async fn test_sync_transport_failure_fetches_report_then_reraises() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::default());
        *remote.sync_error.lock().unwrap() = Some(
            RemoteError::Transport {
                operation: "import".to_string(),
                message: "connection reset".to_string(),
            }
            .into(),
        );
        let mut gateway = ImportGateway::new(remote.clone());

        let err = gateway
            .import(&subject(&dir), &ImportOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote(RemoteError::Transport { .. })));
        assert_eq!(remote.calls(), ["import_sync Core", "report"]);
        assert_eq!(gateway.state(), &GatewayState::Idle);
    }

    #[tokio::test]
    async fn test_sync_fault_keeps_status_code() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::default());
        *remote.sync_error.lock().unwrap() = Some(
            RemoteError::Fault {
                code: -2_147_188_707,
                message: "missing dependency".to_string(),
            }
            .into(),
        );
        let mut gateway = ImportGateway::new(remote);

        let err = gateway
            .import(&subject(&dir), &ImportOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.remote_status_code(), Some(-2_147_188_707));
        assert!(err.to_string().contains("missing dependency"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_import_leaves_gateway_in_flight() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(ScriptedRemote::with_polls(&[]));
        let mut gateway = ImportGateway::new(remote);
        let subject = subject(&dir);

        let pending = tokio::time::timeout(
            Duration::from_secs(30),
            gateway.import(&subject, &async_options()),
        )
        .await;
        assert!(pending.is_err());

        let err = gateway
            .import(&subject, &ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Import(ImportError::AlreadyInProgress { .. })
        ));

        assert_eq!(gateway.abandon_in_flight().as_deref(), Some("job-1"));
        assert!(gateway
            .import(&subject, &ImportOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_absent_maps_to_not_found() {
        let gateway = ImportGateway::new(Arc::new(ScriptedRemote::default()));
        let err = gateway.delete_by_name("Core").await.unwrap_err();
        assert!(matches!(err, Error::Deploy(DeployError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_reports_state_on_debug_channel() {
        let (tx, mut rx) = channel();
        let gateway = ImportGateway::new(Arc::new(ScriptedRemote::default())).with_event_sender(tx);

        assert_eq!(gateway.resolve_installed_version("Core").await.unwrap(), None);

        let msg = rx.try_recv().unwrap();
        match msg.event {
            AppEvent::General(GeneralEvent::DebugLog { message }) => {
                assert_eq!(message, "Core is not installed");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
