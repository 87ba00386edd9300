//! Tests for CLI argument parsing.

use super::cli::{Cli, Command};
use crate::target::Backoff;

mod parsing {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_default_target_options() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "targets",
            "--url",
            "https://example.com/webhook",
            "--method",
            "PUT",
            "--header",
            "X-Api-Key=secret",
            "--header",
            "X-Source: ocr",
            "--bearer",
            "token123",
        ]);

        assert_eq!(cli.url.as_deref(), Some("https://example.com/webhook"));
        assert_eq!(cli.method.as_deref(), Some("PUT"));
        assert_eq!(cli.headers, vec!["X-Api-Key=secret", "X-Source: ocr"]);
        assert_eq!(cli.bearer.as_deref(), Some("token123"));
    }

    #[test]
    fn parse_retry_options() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "targets",
            "--retry-max",
            "5",
            "--retry-delay-ms",
            "250",
            "--timeout-ms",
            "8000",
            "--backoff",
            "exponential",
        ]);

        assert_eq!(cli.retry_max, Some(5));
        assert_eq!(cli.retry_delay_ms, Some(250));
        assert_eq!(cli.timeout_ms, Some(8000));
        assert_eq!(cli.backoff, Some(Backoff::Exponential));
    }

    #[test]
    fn parse_engine_options() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "targets",
            "--history-capacity",
            "50",
            "--shutdown-grace-ms",
            "1500",
            "-v",
        ]);

        assert_eq!(cli.history_capacity, Some(50));
        assert_eq!(cli.shutdown_grace_ms, Some(1500));
        assert!(cli.verbose);
    }

    #[test]
    fn global_options_may_precede_subcommand() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "--config",
            "/path/to/config.toml",
            "targets",
        ]);

        assert_eq!(
            cli.config.as_ref().unwrap().to_str(),
            Some("/path/to/config.toml")
        );
        assert!(matches!(cli.command, Command::Targets));
    }

    #[test]
    fn invalid_backoff_is_rejected() {
        let result = Cli::try_parse_from(["ocr-hook", "targets", "--backoff", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn subcommand_is_required() {
        let result = Cli::try_parse_from(["ocr-hook"]);
        assert!(result.is_err());
    }
}

mod init_command {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_init_with_default_output() {
        let cli = Cli::parse_from_iter(["ocr-hook", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Command::Init { output, force } => {
                assert_eq!(output, PathBuf::from("ocr-hook.toml"));
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_custom_output_and_force() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "init",
            "--output",
            "/custom/path/config.toml",
            "--force",
        ]);

        match cli.command {
            Command::Init { output, force } => {
                assert_eq!(output, PathBuf::from("/custom/path/config.toml"));
                assert!(force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn is_init_false_for_other_commands() {
        let cli = Cli::parse_from_iter(["ocr-hook", "targets"]);

        assert!(!cli.is_init());
    }
}

mod delivery_commands {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parse_test_command() {
        let cli = Cli::parse_from_iter(["ocr-hook", "test", "--target", "n8n"]);

        match cli.command {
            Command::Test { target } => assert_eq!(target, "n8n"),
            _ => panic!("Expected Test command"),
        }
    }

    #[test]
    fn parse_send_with_targets() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "send",
            "-p",
            "result.json",
            "-t",
            "a",
            "--target",
            "b",
            "--correlation-id",
            "job-7",
        ]);

        match cli.command {
            Command::Send {
                payload,
                targets,
                correlation_id,
                envelope,
                filename,
            } => {
                assert_eq!(payload, PathBuf::from("result.json"));
                assert_eq!(targets, vec!["a", "b"]);
                assert_eq!(correlation_id.as_deref(), Some("job-7"));
                assert!(!envelope);
                assert!(filename.is_none());
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn parse_send_with_envelope() {
        let cli = Cli::parse_from_iter([
            "ocr-hook",
            "send",
            "--payload",
            "ocr.json",
            "--envelope",
            "--filename",
            "scan.pdf",
        ]);

        match cli.command {
            Command::Send {
                targets,
                envelope,
                filename,
                ..
            } => {
                assert!(targets.is_empty());
                assert!(envelope);
                assert_eq!(filename.as_deref(), Some("scan.pdf"));
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn filename_requires_envelope() {
        let result = Cli::try_parse_from([
            "ocr-hook",
            "send",
            "--payload",
            "ocr.json",
            "--filename",
            "scan.pdf",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn send_requires_payload() {
        let result = Cli::try_parse_from(["ocr-hook", "send"]);
        assert!(result.is_err());
    }
}
