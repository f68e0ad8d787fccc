//! Library integration tests.

use kap::KapError;

#[test]
fn error_types_are_public() {
    let err = KapError::OrganizationNotFound {
        handle: "acme".into(),
    };
    assert_eq!(err.to_string(), "Organization not found: acme");
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> kap::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use kap::cli::{Cli, Commands};

    let cli = Cli::parse_from(["kap", "use", "acme"]);

    if let Some(Commands::Use(args)) = cli.command {
        assert_eq!(args.handle.as_deref(), Some("acme"));
    } else {
        panic!("Expected Use command");
    }
}

#[test]
fn child_environment_names_are_stable() {
    use kap::dispatch::env::{CONTEXT_ENV, CREDENTIALS_ENV, PARENT_CLI_ENV, PARENT_PATH_ENV};

    assert_eq!(PARENT_CLI_ENV, "KAP_PARENT_CLI");
    assert_eq!(CREDENTIALS_ENV, "KAP_CREDENTIALS");
    assert_eq!(PARENT_PATH_ENV, "KAP_PARENT_PATH");
    assert_eq!(CONTEXT_ENV, "KAP_CONTEXT");
}
