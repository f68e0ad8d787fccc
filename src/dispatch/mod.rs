//! Dispatch of plugin commands to child processes.
//!
//! Resolution order for `kap <name>`:
//! 1. `<install root>/commands/<name>/index{.js,.ts,.mjs,}`
//! 2. The installed command's manifest entry point
//!
//! Script entry points run through the configured interpreter. The child
//! inherits stdio and the environment plus the variables in [`env`].

pub mod env;
pub mod process;
pub mod resolve;

pub use env::ChildEnvironment;
pub use process::{exit_code, LaunchPlan};
pub use resolve::{is_script, local_override, normalize_help, resolve_executable};

use crate::config::Settings;
use crate::error::Result;
use crate::paths::Paths;
use crate::registry::CommandRegistry;

/// Runs plugin commands as child processes.
pub struct ProcessDispatcher<'a> {
    paths: &'a Paths,
    settings: &'a Settings,
    registry: &'a CommandRegistry,
}

impl<'a> ProcessDispatcher<'a> {
    pub fn new(paths: &'a Paths, settings: &'a Settings, registry: &'a CommandRegistry) -> Self {
        Self {
            paths,
            settings,
            registry,
        }
    }

    /// Plan the launch of `name` with `args`.
    pub fn prepare(
        &self,
        name: &str,
        args: &[String],
        env: ChildEnvironment,
    ) -> Result<LaunchPlan> {
        let executable = resolve_executable(self.paths, self.registry, name)?;
        Ok(LaunchPlan::new(
            executable,
            args,
            &self.settings.script_interpreter,
            env,
        ))
    }

    /// Run `name` to completion, returning the exit code to pass through.
    pub fn dispatch(&self, name: &str, args: &[String], env: ChildEnvironment) -> Result<i32> {
        let plan = self.prepare(name, args, env)?;
        process::run(&plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NpmInstaller;
    use std::ffi::OsString;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn env() -> ChildEnvironment {
        ChildEnvironment {
            parent_cli: "kap".into(),
            credentials: PathBuf::from("/tmp/authentication.json"),
            parent_path: PathBuf::from("/opt/kap/bin/kap"),
            context: None,
        }
    }

    #[test]
    fn prepares_installed_script_with_interpreter() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(temp.path().join("home"), temp.path().join("install"));
        let dir = paths.command_dir("hello");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), r#"{ "main": "cli.js" }"#).unwrap();
        let registry =
            CommandRegistry::open(paths.clone(), Arc::new(NpmInstaller::default())).unwrap();
        let settings = Settings {
            script_interpreter: "/usr/local/bin/node".into(),
            ..Settings::default()
        };

        let dispatcher = ProcessDispatcher::new(&paths, &settings, &registry);
        let plan = dispatcher
            .prepare("hello", &["world".to_string()], env())
            .unwrap();

        assert_eq!(plan.program, OsString::from("/usr/local/bin/node"));
        assert_eq!(plan.executable, dir.join("cli.js"));
        assert_eq!(plan.args.last(), Some(&OsString::from("world")));
    }

    #[cfg(unix)]
    #[test]
    fn dispatches_local_override_binary() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::new(temp.path().join("home"), temp.path().join("install"));
        let dir = paths.local_commands_dir().join("test");
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink("/bin/sh", dir.join("index")).unwrap();
        let registry =
            CommandRegistry::open(paths.clone(), Arc::new(NpmInstaller::default())).unwrap();
        let settings = Settings::default();

        let dispatcher = ProcessDispatcher::new(&paths, &settings, &registry);
        let code = dispatcher
            .dispatch("test", &["-c".to_string(), "exit 7".to_string()], env())
            .unwrap();

        assert_eq!(code, 7);
    }
}
