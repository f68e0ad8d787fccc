//! Output verbosity.

use std::fmt;
use std::str::FromStr;

/// How much kap prints about its own work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Everything, including debug detail.
    Verbose,
    /// Status lines and spinners.
    #[default]
    Normal,
    /// Results and errors only.
    Quiet,
    /// Errors only.
    Silent,
}

impl OutputMode {
    /// Pick a mode from the global `--verbose` / `--quiet` flags.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }

    /// Whether status lines (success, warning, headers) are shown.
    pub fn shows_status(self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Whether spinners are drawn.
    pub fn shows_spinners(self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Whether plain messages, such as command results, are shown.
    pub fn shows_messages(self) -> bool {
        !matches!(self, Self::Silent)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verbose => "verbose",
            Self::Normal => "normal",
            Self::Quiet => "quiet",
            Self::Silent => "silent",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" => Ok(Self::Verbose),
            "normal" => Ok(Self::Normal),
            "quiet" => Ok(Self::Quiet),
            "silent" => Ok(Self::Silent),
            other => Err(format!("unknown output mode: {}", other)),
        }
    }
}
