//! CLI commands module.

mod cluster;
mod config;
mod encode;
mod util;

pub use cluster::ClusterCommand;
pub use config::ConfigCommand;
pub use encode::EncodeCommand;

pub(crate) use util::*;
