//! Argument normalization and executable resolution.

use std::path::{Path, PathBuf};

use crate::error::{KapError, Result, SpawnFailure};
use crate::paths::Paths;
use crate::registry::{validate_slot_name, CommandRegistry};

/// Extensions probed for a local override entry point, in order.
const OVERRIDE_EXTENSIONS: &[&str] = &["js", "ts", "mjs"];

/// Extensions run through the script interpreter.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts"];

/// Rewrite `help` forms into `--help` flags.
///
/// Returns `None` when there are no arguments at all, which means usage
/// should be shown and the process should fail.
///
/// - `help` becomes `--help`
/// - `help <cmd> ...` becomes `<cmd> --help ...`
/// - `<cmd> help ...` becomes `<cmd> --help ...`
///
/// Leading flags are skipped when looking for the command word.
pub fn normalize_help(mut args: Vec<String>) -> Option<Vec<String>> {
    if args.is_empty() {
        return None;
    }

    let Some(first) = args.iter().position(|a| !a.starts_with('-')) else {
        return Some(args);
    };

    if args[first] == "help" {
        if first + 1 == args.len() {
            args[first] = "--help".to_string();
        } else {
            args.swap(first, first + 1);
            args[first + 1] = "--help".to_string();
        }
    } else if args.get(first + 1).is_some_and(|a| a == "help") {
        args[first + 1] = "--help".to_string();
    }

    Some(args)
}

/// Entry point from the local override directory next to the binary.
///
/// Probes `commands/<name>/index.js`, `.ts`, `.mjs`, then the bare `index`.
pub fn local_override(paths: &Paths, name: &str) -> Option<PathBuf> {
    let base = paths.local_commands_dir().join(name).join("index");

    OVERRIDE_EXTENSIONS
        .iter()
        .map(|ext| base.with_extension(ext))
        .chain(std::iter::once(base.clone()))
        .find(|candidate| candidate.is_file())
}

/// Find the executable for the plugin command `name`.
pub fn resolve_executable(
    paths: &Paths,
    registry: &CommandRegistry,
    name: &str,
) -> Result<PathBuf> {
    validate_slot_name(name)?;

    if let Some(path) = local_override(paths, name) {
        tracing::debug!("Using local override {}", path.display());
        return Ok(path);
    }

    match registry.describe(name) {
        Ok(info) => Ok(info.executable_path),
        Err(KapError::NotFound { .. }) => Err(KapError::Spawn {
            path: paths.command_dir(name),
            kind: SpawnFailure::Missing,
        }),
        Err(e) => Err(e),
    }
}

/// Whether `path` must be run through the script interpreter.
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}
