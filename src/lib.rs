pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::SystemNetwork;
pub use config::{ErrorPolicy, LogFormat, ProbeSettings};
pub use core::{checker::SiteChecker, probe::ProbeEngine};
pub use utils::error::{CheckError, Result};
