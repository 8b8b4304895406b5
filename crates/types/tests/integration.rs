//! Integration tests for types

#[cfg(test)]
mod tests {
    use soldeploy_types::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_descriptor_from_parsed_version() {
        let version: SolutionVersion = "2.0.0.0".parse().unwrap();
        let desc = PackageDescriptor::new("Core", version, PathBuf::from("out/Core.zip"))
            .with_force_upgrade(true);

        assert_eq!(desc.version, SolutionVersion::new(2, 0, 0));
        assert_eq!(desc.holding_name, holding_name("Core"));
        assert_eq!(desc.holding_path, holding_path(Path::new("out/Core.zip")));
        assert!(desc.force_upgrade);
    }

    #[test]
    fn test_version_serde_as_string() {
        let v = SolutionVersion::with_revision(1, 2, 3, 4);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#""1.2.3.4""#);
        let back: SolutionVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_promote_strategy_never_forces() {
        assert!(!PackageStrategy::AtomicPromote.force_upgrade());
        assert!(PackageStrategy::LegacyHolding {
            force_upgrade: true
        }
        .force_upgrade());
        assert_eq!(
            PackageStrategy::AtomicPromote.upgrade_strategy(),
            UpgradeStrategy::Promote
        );
    }

    #[test]
    fn test_default_pipeline_settings() {
        let settings = PipelineSettings::default();
        assert!(settings.use_holding_packages);
        assert_eq!(settings.upgrade_strategy, UpgradeStrategy::Legacy);
        assert_eq!(settings.failure_policy, FailurePolicy::FailFast);
        assert!(settings.poll_interval < settings.async_timeout);
    }
}
