//! Configuration management for NetPulse.
//!
//! Settings are JSON stored in the platform configuration directory, or in
//! a file named on the command line.

mod settings;

pub use settings::{AppSettings, Paths};
