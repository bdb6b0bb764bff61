//! gradesync-io: File adapters around the grading core.
//!
//! Loads exam solutions and detected answer sheets, persists the adjusted
//! result store, and reads and writes rosters in delimited text or
//! spreadsheet form. Every persisted write goes through [`atomic`].

pub mod answers;
pub mod config;
pub mod error;
pub mod roster;
pub mod solutions;
pub mod store;

pub use gradesync_core::atomic;

pub use config::{load_config, load_config_from, GradeConfig};
pub use error::InputError;
