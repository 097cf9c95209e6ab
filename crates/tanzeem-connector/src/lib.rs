//! Tanzeem Connector - sync scheduler and admin surface
//!
//! Wires the hierarchy store, resolver, mapping manager, account
//! provisioner and reconcilers into one process:
//! - TOML and environment configuration
//! - A directory client reading a JSON export from disk
//! - A scheduler running Jamaat and Member syncs on their own intervals
//!
//! The binary exposes the same operations as CLI subcommands.

pub mod config;
pub mod connector;
pub mod directory;
pub mod runner;

pub use config::ConnectorConfig;
pub use connector::TanzeemConnector;
pub use directory::FileDirectory;
pub use runner::SyncRunner;
