//! Registry files and the ordered list of seed manifests.
//!
//! The user registry, the default manifest and the CI manifest all share
//! one shape: a JSON object mapping command names to package references.
//!
//! ```json
//! { "hello": "@kapeta/kap-hello", "deploy": "@kapeta/kap-deploy@^2" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KapError, Result};
use crate::paths::Paths;

/// Command name to package reference.
pub type CommandMap = BTreeMap<String, String>;

/// Ordered candidate locations for the command set.
///
/// The first existing, non-empty candidate wins. Later candidates are
/// fallbacks only and are never merged into earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySource {
    candidates: Vec<PathBuf>,
}

impl RegistrySource {
    /// Create a source from explicit candidates, highest priority first.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// The standard candidate list: user registry, then CI or default manifest.
    pub fn for_paths(paths: &Paths, ci: bool) -> Self {
        let seed = if ci {
            paths.ci_manifest()
        } else {
            paths.default_manifest()
        };
        Self::new(vec![paths.user_registry(), seed])
    }

    /// Candidate locations in priority order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Load the first usable candidate.
    ///
    /// Returns `None` when no candidate exists or all of them are empty.
    pub fn load_first(&self) -> Result<Option<(PathBuf, CommandMap)>> {
        for path in &self.candidates {
            if !path.is_file() {
                continue;
            }

            let commands = read_command_map(path)?;
            if commands.is_empty() {
                tracing::debug!("Skipping empty command manifest {}", path.display());
                continue;
            }

            tracing::debug!(
                "Loaded {} command(s) from {}",
                commands.len(),
                path.display()
            );
            return Ok(Some((path.clone(), commands)));
        }

        Ok(None)
    }
}

/// Read a command map, treating a blank file as empty.
pub fn read_command_map(path: &Path) -> Result<CommandMap> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(CommandMap::new());
    }

    serde_json::from_str(&content).map_err(|e| KapError::ManifestParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a command map using atomic write.
///
/// Uses the write-to-temp-then-rename pattern to prevent corruption.
pub fn write_command_map(path: &Path, commands: &CommandMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(commands)
        .map_err(|e| KapError::Other(anyhow::anyhow!("Failed to serialize registry: {}", e)))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
