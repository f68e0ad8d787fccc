//! kap CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches};
use kap::cli::{plugin_help, AppContext, Cli, CommandDispatcher};
use kap::dispatch::normalize_help;
use kap::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
///
/// Logs go to stderr; stdout belongs to command output.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("kap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kap=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Whether debug logging was requested before the command word.
///
/// Flags after a plugin command name belong to the plugin.
fn wants_debug(args: &[String]) -> bool {
    let flag = args
        .iter()
        .take_while(|a| a.starts_with('-'))
        .any(|a| a == "--debug");
    let env = std::env::var("KAP_DEBUG")
        .map(|v| !matches!(v.as_str(), "" | "0" | "false"))
        .unwrap_or(false);
    flag || env
}

/// Install the default command set on first run.
fn provision(ctx: &AppContext) {
    let mut registry = match ctx.registry() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!("Could not open the command registry: {}", e);
            return;
        }
    };
    if registry.is_initialized() {
        return;
    }

    tracing::info!("Installing default commands");
    if let Err(e) = registry.ensure_defaults() {
        tracing::warn!("Could not install default commands: {}", e);
    }
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    init_tracing(wants_debug(&raw));

    let ctx = match AppContext::discover() {
        Ok(ctx) => ctx,
        Err(e) => {
            create_ui(OutputMode::Normal, false).error(&format!("Error: {}", e));
            return ExitCode::from(1);
        }
    };
    provision(&ctx);

    let mut command = Cli::command();
    if let Some(help) = ctx.registry().ok().as_ref().and_then(plugin_help) {
        command = command.after_help(help);
    }

    let Some(args) = normalize_help(raw) else {
        eprintln!("{}", command.render_help());
        return ExitCode::from(1);
    };

    let matches = command
        .clone()
        .get_matches_from(std::iter::once("kap".to_string()).chain(args));
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    tracing::debug!("kap starting with args: {:?}", cli);

    if cli.command.is_none() {
        eprintln!("{}", command.render_help());
        return ExitCode::from(1);
    }

    let mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = create_ui(mode, cli.no_color);

    let dispatcher = CommandDispatcher::new(&ctx);
    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(u8::try_from(result.exit_code).unwrap_or(1)),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
