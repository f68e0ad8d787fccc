//! Environment handed to plugin commands.

use std::ffi::OsString;
use std::path::PathBuf;

/// Name of the root command, so plugins can print correct usage.
pub const PARENT_CLI_ENV: &str = "KAP_PARENT_CLI";

/// Path of the session file.
pub const CREDENTIALS_ENV: &str = "KAP_CREDENTIALS";

/// Path of the running root executable.
pub const PARENT_PATH_ENV: &str = "KAP_PARENT_PATH";

/// Handle of the active organization context, when one is set.
pub const CONTEXT_ENV: &str = "KAP_CONTEXT";

/// Variables added on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEnvironment {
    pub parent_cli: String,
    pub credentials: PathBuf,
    pub parent_path: PathBuf,
    pub context: Option<String>,
}

impl ChildEnvironment {
    /// Variables to set in the child.
    pub fn vars(&self) -> Vec<(&'static str, OsString)> {
        let mut vars = vec![
            (PARENT_CLI_ENV, OsString::from(&self.parent_cli)),
            (CREDENTIALS_ENV, self.credentials.clone().into_os_string()),
            (PARENT_PATH_ENV, self.parent_path.clone().into_os_string()),
        ];
        if let Some(context) = &self.context {
            vars.push((CONTEXT_ENV, OsString::from(context)));
        }
        vars
    }

    /// Variables to strip from the inherited environment.
    pub fn removed(&self) -> Vec<&'static str> {
        if self.context.is_none() {
            vec![CONTEXT_ENV]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(context: Option<&str>) -> ChildEnvironment {
        ChildEnvironment {
            parent_cli: "kap".into(),
            credentials: PathBuf::from("/home/me/.kapeta/authentication.json"),
            parent_path: PathBuf::from("/opt/kap/bin/kap"),
            context: context.map(String::from),
        }
    }

    #[test]
    fn exports_parent_and_credentials() {
        let vars = env(None).vars();
        let names: Vec<_> = vars.iter().map(|(k, _)| *k).collect();

        assert_eq!(names, vec![PARENT_CLI_ENV, CREDENTIALS_ENV, PARENT_PATH_ENV]);
        assert_eq!(vars[0].1, OsString::from("kap"));
    }

    #[test]
    fn context_is_exported_only_when_set() {
        let with = env(Some("acme"));
        assert!(with
            .vars()
            .contains(&(CONTEXT_ENV, OsString::from("acme"))));
        assert!(with.removed().is_empty());

        let without = env(None);
        assert_eq!(without.removed(), vec![CONTEXT_ENV]);
    }
}
