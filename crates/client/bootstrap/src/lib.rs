//! Shared bootstrap utilities for battle hosts.
//!
//! Provides configuration loading, the settings file reader, a demo roster
//! source and the runtime setup that a binary (or a test harness) can reuse.
pub mod builder;
pub mod config;
pub mod player;
pub mod roster;
pub mod settings;

pub use builder::{SessionBuilder, SessionSetup};
pub use config::ClientConfig;
pub use player::SimulatedPlayer;
pub use roster::{RosterError, RosterSource};
pub use settings::{FileSettings, SettingsError};
