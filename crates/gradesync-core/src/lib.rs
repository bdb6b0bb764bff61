//! gradesync-core: Score adjustment and identity reconciliation engine.
//!
//! This crate holds the exam data model and the pure logic that turns raw
//! answer sheets into marks and reconciles detected student identifiers
//! against an authoritative roster.

pub mod atomic;
pub mod error;
pub mod matching;
pub mod merge;
pub mod model;
pub mod report;
pub mod scoring;
pub mod shuffle;
pub mod statistics;
