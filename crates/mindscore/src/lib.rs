//! Scoring core for reflective free-text assessments.
//!
//! Responses are turned into psycholinguistic signatures, scored per phase,
//! folded into a 0-700 composite, matched against an archetype catalog, and
//! recorded in a hashed, append-only ledger.

pub mod config;
pub mod error;
pub mod ledger;
pub mod scoring;
pub mod telemetry;
