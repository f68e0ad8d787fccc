//! Configuration for kap.
//!
//! - Settings file and environment overrides in [`settings`]
//!
//! # Example
//!
//! ```
//! use kap::config::Settings;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let settings = Settings::from_file(&temp.path().join("config.yml")).unwrap();
//! assert_eq!(settings.script_interpreter, "node");
//! ```

pub mod settings;

pub use settings::{
    Settings, BASE_URL_ENV, CLIENT_ID_ENV, DEFAULT_BASE_URL, DEFAULT_CLIENT_ID,
};
