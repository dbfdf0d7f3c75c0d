//! Tests for CLI argument parsing.

use std::path::{Path, PathBuf};

use clap::Parser;

use super::cli::{Cli, Command, TriggerTypeArg};
use crate::model::{OwnerScope, TriggerType};

mod parsing {
    use super::*;

    #[test]
    fn parse_list_with_defaults() {
        let cli = Cli::parse_from_iter(["alert-webhooks", "list"]);

        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.config, None);
        assert_eq!(cli.config_path(), Path::new("webhooks.toml"));
        assert_eq!(cli.timeout, None);
        assert_eq!(cli.concurrency, None);
        assert!(!cli.verbose);
        assert!(!cli.strict_templates);
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::parse_from_iter([
            "alert-webhooks",
            "list",
            "-c",
            "custom.toml",
            "--timeout",
            "10",
            "--concurrency",
            "3",
            "--log-file",
            "audit.jsonl",
            "--strict-templates",
            "-v",
        ]);

        assert_eq!(cli.config_path(), Path::new("custom.toml"));
        assert_eq!(cli.timeout, Some(10));
        assert_eq!(cli.concurrency, Some(3));
        assert_eq!(cli.log_file, Some(PathBuf::from("audit.jsonl")));
        assert!(cli.strict_templates);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_dispatch() {
        let cli = Cli::parse_from_iter([
            "alert-webhooks",
            "dispatch",
            "--trigger",
            "alert-group-resolve",
            "--event",
            "event.json",
            "--organization",
            "acme",
            "--team",
            "sre",
        ]);

        let Command::Dispatch { trigger, event, .. } = &cli.command else {
            panic!("expected dispatch, got {:?}", cli.command);
        };
        assert_eq!(*trigger, TriggerTypeArg::AlertGroupResolve);
        assert_eq!(event, &PathBuf::from("event.json"));
        assert_eq!(
            cli.command.scope(),
            OwnerScope::organization("acme").with_team("sre")
        );
    }

    #[test]
    fn parse_test_with_dry_run() {
        let cli = Cli::parse_from_iter([
            "alert-webhooks",
            "test",
            "--webhook",
            "WH1",
            "--event",
            "-",
            "--dry-run",
        ]);

        let Command::Test {
            webhook,
            event,
            dry_run,
        } = &cli.command
        else {
            panic!("expected test");
        };
        assert_eq!(webhook, "WH1");
        assert_eq!(event, &PathBuf::from("-"));
        assert!(*dry_run);
        assert_eq!(cli.command.scope(), OwnerScope::default());
    }

    #[test]
    fn parse_logs() {
        let cli = Cli::parse_from_iter(["alert-webhooks", "logs", "--webhook", "WH1"]);
        assert!(matches!(cli.command, Command::Logs { ref webhook } if webhook == "WH1"));
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        let result = Cli::try_parse_from([
            "alert-webhooks",
            "dispatch",
            "--trigger",
            "alert-group-exploded",
            "--event",
            "e.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["alert-webhooks"]).is_err());
    }
}

mod init_command {
    use super::*;

    #[test]
    fn default_output() {
        let cli = Cli::parse_from_iter(["alert-webhooks", "init"]);

        assert!(cli.is_init());
        assert!(
            matches!(cli.command, Command::Init { ref output } if output == Path::new("webhooks.toml"))
        );
    }

    #[test]
    fn custom_output() {
        let cli = Cli::parse_from_iter(["alert-webhooks", "init", "-o", "out.toml"]);
        assert!(matches!(cli.command, Command::Init { ref output } if output == Path::new("out.toml")));
    }

    #[test]
    fn other_commands_are_not_init() {
        let cli = Cli::parse_from_iter(["alert-webhooks", "list"]);
        assert!(!cli.is_init());
    }
}

mod trigger_type_arg {
    use super::*;

    #[test]
    fn every_value_maps_to_same_named_trigger_type() {
        use clap::ValueEnum;

        for arg in TriggerTypeArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            let trigger: TriggerType = (*arg).into();
            assert_eq!(trigger.as_str(), name);
        }
    }
}
