//! Tests for validated configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use crate::model::{HttpMethod, TriggerType};

use super::ConfigError;
use super::cli::Cli;
use super::toml::{TomlConfig, default_config_template};
use super::validated::{ValidatedConfig, write_default_config};

/// Helper to create CLI args from a slice; `list` is used as subcommand
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["alert-webhooks", "list"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

fn load(content: &str) -> Result<ValidatedConfig, ConfigError> {
    ValidatedConfig::from_raw(&cli(&[]), Some(&toml(content)))
}

mod precedence {
    use super::*;

    #[test]
    fn defaults_without_toml() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();

        assert!(config.webhooks.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.log_file, PathBuf::from("webhook-logs.jsonl"));
        assert!(!config.strict_templates);
        assert!(!config.verbose);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load(
            r#"
            [dispatch]
            timeout_secs = 9
            max_concurrency = 3
            log_file = "audit.jsonl"
        "#,
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(9));
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.log_file, PathBuf::from("audit.jsonl"));
    }

    #[test]
    fn cli_overrides_toml() {
        let toml = toml(
            r#"
            [dispatch]
            timeout_secs = 9
            max_concurrency = 3
            log_file = "audit.jsonl"
        "#,
        );
        let cli = cli(&[
            "--timeout",
            "2",
            "--concurrency",
            "16",
            "--log-file",
            "cli.jsonl",
            "-v",
        ]);

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.log_file, PathBuf::from("cli.jsonl"));
        assert!(config.verbose);
    }

    #[test]
    fn strict_templates_is_or_of_sources() {
        let strict_toml = toml("[template]\nstrict = true");

        assert!(ValidatedConfig::from_raw(&cli(&[]), Some(&strict_toml)).unwrap().strict_templates);
        assert!(ValidatedConfig::from_raw(&cli(&["--strict-templates"]), None).unwrap().strict_templates);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--timeout", "0"]), None);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration { field: "timeout", .. })
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = load("[dispatch]\nmax_concurrency = 0");
        assert!(matches!(result, Err(ConfigError::InvalidConcurrency(_))));
    }
}

mod webhooks {
    use super::*;

    #[test]
    fn minimal_entry_gets_defaults() {
        let config = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://example.com/hook"
        "#,
        )
        .unwrap();

        let webhook = &config.webhooks[0];
        assert_eq!(webhook.id, "WH1");
        assert_eq!(webhook.http_method, "POST");
        assert!(webhook.forward_all);
        assert_eq!(webhook.headers, json!({}));
        assert_eq!(webhook.trigger_type, None);
        assert!(webhook.is_active());
    }

    #[test]
    fn full_entry_is_carried_over() {
        let config = load(
            r#"
            [[webhook]]
            id = "WH1"
            name = "Resolved"
            organization = "acme"
            username = "user"
            password = "pass"
            authorization_header = "Bearer t"
            trigger_template = "{{ escalated }}"
            headers_template = '{"X-Id": "{{ id }}"}'
            url_template = "https://example.com/{{ id }}"
            data = '{"id": "{{ id }}"}'
            forward_all = false
            http_method = "PUT"
            trigger_type = "alert-group-resolve"

            [webhook.headers]
            X-Source = "alerting"
        "#,
        )
        .unwrap();

        let webhook = &config.webhooks[0];
        assert_eq!(webhook.display_name(), "Resolved");
        assert_eq!(webhook.organization.as_deref(), Some("acme"));
        assert_eq!(webhook.basic_credentials(), Some(("user", "pass")));
        assert_eq!(webhook.headers, json!({"X-Source": "alerting"}));
        assert!(!webhook.forward_all);
        assert_eq!(HttpMethod::parse(&webhook.http_method), Some(HttpMethod::Put));
        assert_eq!(webhook.trigger_type, Some(TriggerType::AlertGroupResolve));
        assert_eq!(webhook.url, None);
    }

    #[test]
    fn missing_ids_are_generated_without_collision() {
        let config = load(
            r#"
            [[webhook]]
            url = "https://a.example.com"

            [[webhook]]
            id = "WHFIXED000001"
            url = "https://b.example.com"

            [[webhook]]
            url = "https://c.example.com"
        "#,
        )
        .unwrap();

        let ids: Vec<_> = config.webhooks.iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids[1], "WHFIXED000001");
        assert!(ids[0].starts_with("WH") && ids[0].len() == 13);
        assert!(ids[2].starts_with("WH") && ids[2].len() == 13);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://a.example.com"

            [[webhook]]
            id = "WH1"
            url = "https://b.example.com"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateWebhook(ref id)) if id == "WH1"));
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let result = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://example.com"
            http_method = "PATCH"
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidMethod { ref method, .. }) if method == "PATCH"
        ));
    }

    #[test]
    fn unknown_trigger_type_is_rejected() {
        let result = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://example.com"
            trigger_type = "alert-group-exploded"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidTriggerType { .. })));
    }

    #[test]
    fn missing_url_is_rejected() {
        let result = load("[[webhook]]\nid = \"WH1\"");
        assert!(matches!(result, Err(ConfigError::MissingUrl { ref webhook }) if webhook == "WH1"));
    }

    #[test]
    fn invalid_static_url_is_rejected() {
        for url in ["not a url", "ftp://example.com/x"] {
            let result = load(&format!("[[webhook]]\nid = \"WH1\"\nurl = \"{url}\""));
            assert!(
                matches!(result, Err(ConfigError::InvalidUrl { .. })),
                "expected {url} to be rejected"
            );
        }
    }

    #[test]
    fn url_template_skips_static_url_check() {
        let config = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "not a url"
            url_template = "https://example.com/{{ id }}"
        "#,
        )
        .unwrap();
        assert_eq!(config.webhooks.len(), 1);
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let result = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://example.com"

            [webhook.headers]
            "Bad Header" = "x"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidHeaderName { .. })));
    }

    #[test]
    fn template_syntax_errors_name_the_field() {
        let result = load(
            r#"
            [[webhook]]
            id = "WH1"
            url = "https://example.com"
            data = "{{#if}}"
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTemplate { field: "data", .. })
        ));
    }
}

mod files {
    use super::*;

    #[test]
    fn load_reads_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("webhooks.toml");
        std::fs::write(&path, "[[webhook]]\nid = \"WH1\"\nurl = \"https://example.com\"").unwrap();

        let cli = cli(&["-c", path.to_str().unwrap()]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.webhooks[0].id, "WH1");
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let cli = cli(&["-c", path.to_str().unwrap()]);
        assert!(matches!(
            ValidatedConfig::load(&cli),
            Err(ConfigError::FileRead { .. })
        ));
    }

    #[test]
    fn written_default_config_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("webhooks.toml");

        write_default_config(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, default_config_template());
        let config = ValidatedConfig::load(&cli(&["-c", path.to_str().unwrap()])).unwrap();
        assert_eq!(config.webhooks[0].id, "WHEXAMPLE0001");
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("webhooks.toml");

        assert!(matches!(
            write_default_config(&path),
            Err(ConfigError::FileWrite { .. })
        ));
    }
}
