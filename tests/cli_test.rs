//! Integration tests for the kap binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A kap invocation isolated in its own home directory.
fn kap(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("kap"));
    cmd.env("KAP_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("KAP_CREDENTIALS_TOKEN")
        .env_remove("KAP_DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pluggable command launcher"))
        .stdout(predicate::str::contains("organizations"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_without_arguments_prints_usage_and_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn cli_help_word_is_rewritten() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
    kap(&home)
        .args(["help", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Package reference"));
    Ok(())
}

#[test]
fn cli_first_run_creates_user_registry() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No commands installed"));
    assert!(home.path().join("kap/commands.json").is_file());
    Ok(())
}

#[test]
fn cli_logout_when_signed_out() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
    Ok(())
}

#[test]
fn cli_whoami_requires_sign_in() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .arg("whoami")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("kap login"));
    Ok(())
}

#[test]
fn cli_unknown_command_does_not_exist() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .args(["ghost", "--flag"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist, try --help"));
    Ok(())
}

#[test]
fn cli_install_reference_needs_name() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .args(["install", "@acme/deploy-tool"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid command name"));
    Ok(())
}

#[test]
fn cli_uninstall_missing_command_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .args(["rm", "ghost"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not installed"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_linked_command_is_listed() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let work = TempDir::new()?;
    fs::write(
        work.path().join("package.json"),
        r#"{ "name": "@acme/tool", "version": "0.1.0", "command": "tool", "description": "Acme tooling" }"#,
    )?;

    kap(&home)
        .args(["link", "--path"])
        .arg(work.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked command tool"));

    kap(&home)
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\": \"tool\""))
        .stdout(predicate::str::contains("\"linked\": true"));

    kap(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme tooling"));
    Ok(())
}

#[test]
fn cli_generates_completions() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kap(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kap"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_upgrade_result_is_printed_when_piped() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let work = TempDir::new()?;
    fs::write(
        work.path().join("package.json"),
        r#"{ "name": "@acme/tool", "command": "tool" }"#,
    )?;
    kap(&home)
        .args(["link", "--path"])
        .arg(work.path())
        .assert()
        .success();

    kap(&home)
        .args(["upgrade", "tool"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Skipped tool: linked to a working directory",
        ));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_install_result_is_printed_when_piped() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new()?;
    let bin = TempDir::new()?;
    let npm = bin.path().join("npm");
    fs::write(
        &npm,
        "#!/bin/sh\nmkdir -p \"$4/node_modules/mypkg\"\n\
         echo '{\"name\":\"mypkg\",\"version\":\"1.0.0\"}' > \"$4/node_modules/mypkg/package.json\"\n",
    )?;
    fs::set_permissions(&npm, fs::Permissions::from_mode(0o755))?;
    fs::create_dir_all(home.path().join("kap"))?;
    fs::write(
        home.path().join("kap/config.yml"),
        format!("package_manager: '{}'\n", npm.display()),
    )?;

    kap(&home)
        .args(["install", "mypkg", "tool"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed command tool from mypkg"));

    let registry = fs::read_to_string(home.path().join("kap/commands.json"))?;
    assert!(registry.contains("\"tool\""));
    Ok(())
}
