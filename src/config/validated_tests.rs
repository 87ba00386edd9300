//! Tests for configuration merging and validation.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::cli::Cli;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;
use super::validated::{ValidatedConfig, write_default_config};
use crate::target::{Backoff, TargetMethod};

fn cli(extra: &[&str]) -> Cli {
    let mut args = vec!["ocr-hook", "targets"];
    args.extend_from_slice(extra);
    Cli::parse_from_iter(args)
}

fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

const TWO_TARGETS: &str = r#"
    [[targets]]
    name = "n8n"
    url = "https://n8n.example.com/hook"

    [[targets]]
    name = "archive"
    url = "https://archive.example.com/ingest"
    method = "PUT"
    retry_max_attempts = 7
"#;

mod targets {
    use super::*;

    #[test]
    fn file_targets_in_order() {
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml(TWO_TARGETS))).unwrap();

        let names: Vec<&str> = config.targets.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["n8n", "archive"]);
        assert_eq!(config.targets[1].method(), TargetMethod::Put);
        assert_eq!(config.targets[1].retry_policy().max_attempts, 7);
    }

    #[test]
    fn no_sources_yields_no_targets() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();

        assert!(config.targets.is_empty());
    }

    #[test]
    fn cli_url_adds_default_target() {
        let config = ValidatedConfig::from_raw(
            &cli(&[
                "--url",
                "https://hook.example.com/ocr",
                "--header",
                "X-Api-Key=secret",
                "--header",
                "X-Source: ocr",
                "--bearer",
                "tok",
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.targets.len(), 1);
        let target = &config.targets[0];
        assert_eq!(target.name(), "default");
        assert_eq!(target.url().as_str(), "https://hook.example.com/ocr");
        assert_eq!(target.headers()["x-api-key"], "secret");
        assert_eq!(target.headers()["x-source"], "ocr");
        assert_eq!(target.headers()["authorization"], "Bearer tok");
    }

    #[test]
    fn cli_default_target_follows_file_targets() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--url", "https://hook.example.com"]),
            Some(&toml(TWO_TARGETS)),
        )
        .unwrap();

        let names: Vec<&str> = config.targets.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["n8n", "archive", "default"]);
    }

    #[test]
    fn cli_default_target_replaces_file_target() {
        let file = toml(
            r#"
            [[targets]]
            name = "default"
            url = "https://from-file.example.com"
        "#,
        );

        let config = ValidatedConfig::from_raw(
            &cli(&["--url", "https://from-cli.example.com"]),
            Some(&file),
        )
        .unwrap();

        assert_eq!(config.targets.len(), 1);
        assert_eq!(
            config.targets[0].url().as_str(),
            "https://from-cli.example.com/"
        );
    }

    #[test]
    fn duplicate_file_target_is_rejected() {
        let file = toml(
            r#"
            [[targets]]
            name = "n8n"
            url = "https://a.example.com"

            [[targets]]
            name = "n8n"
            url = "https://b.example.com"
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(result, Err(ConfigError::DuplicateTarget(name)) if name == "n8n"));
    }

    #[test]
    fn invalid_file_target_is_rejected() {
        let file = toml(
            r#"
            [[targets]]
            name = "ftp"
            url = "ftp://files.example.com"
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(result, Err(ConfigError::Target(_))));
    }

    #[test]
    fn invalid_cli_url_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--url", "not a url"]), None);

        assert!(matches!(result, Err(ConfigError::Target(_))));
    }

    #[test]
    fn malformed_cli_header_is_rejected() {
        let result = ValidatedConfig::from_raw(
            &cli(&["--url", "https://hook.example.com", "--header", "NoSeparator"]),
            None,
        );

        assert!(matches!(
            result,
            Err(ConfigError::InvalidHeader { value }) if value == "NoSeparator"
        ));
    }

    #[test]
    fn zero_retry_attempts_is_rejected() {
        let result = ValidatedConfig::from_raw(
            &cli(&["--url", "https://hook.example.com", "--retry-max", "0"]),
            None,
        );

        assert!(matches!(result, Err(ConfigError::Target(_))));
    }
}

mod defaults_merge {
    use super::*;

    const WITH_DEFAULTS: &str = r#"
        [defaults]
        method = "PUT"
        timeout_ms = 4000
        retry_max_attempts = 4
        retry_delay_ms = 100
        backoff = "fixed"

        [defaults.headers]
        X-Source = "file"

        [[targets]]
        name = "plain"
        url = "https://plain.example.com"

        [[targets]]
        name = "own"
        url = "https://own.example.com"
        method = "GET"
        timeout_ms = 9000
        [targets.headers]
        X-Source = "own"
    "#;

    #[test]
    fn file_defaults_fill_unset_fields() {
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml(WITH_DEFAULTS))).unwrap();
        let plain = &config.targets[0];

        assert_eq!(plain.method(), TargetMethod::Put);
        assert_eq!(plain.timeout(), Duration::from_millis(4000));
        assert_eq!(plain.retry_policy().max_attempts, 4);
        assert_eq!(plain.retry_policy().delay, Duration::from_millis(100));
        assert_eq!(plain.retry_policy().backoff, Backoff::Fixed);
        assert_eq!(plain.headers()["x-source"], "file");
    }

    #[test]
    fn target_fields_win_over_defaults() {
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml(WITH_DEFAULTS))).unwrap();
        let own = &config.targets[1];

        assert_eq!(own.method(), TargetMethod::Get);
        assert_eq!(own.timeout(), Duration::from_millis(9000));
        assert_eq!(own.headers()["x-source"], "own");
    }

    #[test]
    fn cli_overrides_file_defaults() {
        let config = ValidatedConfig::from_raw(
            &cli(&[
                "--method",
                "POST",
                "--timeout-ms",
                "1500",
                "--retry-max",
                "2",
                "--backoff",
                "exponential",
            ]),
            Some(&toml(WITH_DEFAULTS)),
        )
        .unwrap();

        let plain = &config.targets[0];
        assert_eq!(plain.method(), TargetMethod::Post);
        assert_eq!(plain.timeout(), Duration::from_millis(1500));
        assert_eq!(plain.retry_policy().max_attempts, 2);
        assert_eq!(plain.retry_policy().backoff, Backoff::Exponential);
        // Not overridden on the command line
        assert_eq!(plain.retry_policy().delay, Duration::from_millis(100));

        let own = &config.targets[1];
        assert_eq!(own.method(), TargetMethod::Get);
        assert_eq!(own.timeout(), Duration::from_millis(9000));
    }

    #[test]
    fn default_target_gets_file_default_headers() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--url", "https://hook.example.com"]),
            Some(&toml(WITH_DEFAULTS)),
        )
        .unwrap();

        let default = config.targets.last().unwrap();
        assert_eq!(default.name(), "default");
        assert_eq!(default.headers()["x-source"], "file");
        assert_eq!(default.method(), TargetMethod::Put);
    }
}

mod engine_settings {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();

        assert_eq!(config.history_capacity, NonZeroUsize::new(1000).unwrap());
        assert_eq!(config.shutdown_grace, Duration::from_secs(30));
        assert!(!config.verbose);
    }

    #[test]
    fn file_values_apply() {
        let file = toml(
            r"
            [delivery]
            history_capacity = 25
            shutdown_grace_ms = 2000
        ",
        );

        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&file)).unwrap();

        assert_eq!(config.history_capacity.get(), 25);
        assert_eq!(config.shutdown_grace, Duration::from_secs(2));
    }

    #[test]
    fn cli_values_win() {
        let file = toml(
            r"
            [delivery]
            history_capacity = 25
            shutdown_grace_ms = 2000
        ",
        );

        let config = ValidatedConfig::from_raw(
            &cli(&["--history-capacity", "5", "--shutdown-grace-ms", "700", "-v"]),
            Some(&file),
        )
        .unwrap();

        assert_eq!(config.history_capacity.get(), 5);
        assert_eq!(config.shutdown_grace, Duration::from_millis(700));
        assert!(config.verbose);
    }

    #[test]
    fn zero_history_capacity_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--history-capacity", "0"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: f, .. }) if f == field::HISTORY_CAPACITY
        ));
    }

    #[test]
    fn zero_shutdown_grace_is_rejected() {
        let file = toml(
            r"
            [delivery]
            shutdown_grace_ms = 0
        ",
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: f, .. }) if f == field::SHUTDOWN_GRACE
        ));
    }
}

mod loading {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_reads_config_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{TWO_TARGETS}").unwrap();
        let path = file.path().to_str().unwrap();

        let config = ValidatedConfig::load(&cli(&["--config", path])).unwrap();

        assert_eq!(config.targets.len(), 2);
    }

    #[test]
    fn load_missing_file_fails() {
        let result = ValidatedConfig::load(&cli(&["--config", "missing_ocr_hook_12345.toml"]));

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn display_lists_target_names() {
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml(TWO_TARGETS))).unwrap();
        let shown = config.to_string();

        assert!(shown.contains("n8n, archive"));
        assert!(shown.contains("history_capacity: 1000"));
    }
}

mod init_file {
    use super::*;

    #[test]
    fn writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocr-hook.toml");

        write_default_config(&path, false).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(TomlConfig::parse(&written).is_ok());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocr-hook.toml");
        std::fs::write(&path, "# mine").unwrap();

        let result = write_default_config(&path, false);

        assert!(matches!(result, Err(ConfigError::FileExists { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }

    #[test]
    fn force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocr-hook.toml");
        std::fs::write(&path, "# mine").unwrap();

        write_default_config(&path, true).unwrap();

        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }

    #[test]
    fn unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("ocr-hook.toml");

        let result = write_default_config(&path, false);

        assert!(matches!(result, Err(ConfigError::FileWrite { .. })));
    }
}
