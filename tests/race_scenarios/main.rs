//! End-to-end race detection tests
//!
//! Scripted traces run through full sessions: race reports, trace table
//! output, configuration files and the end-of-run dump.

#[path = "../common/mod.rs"]
mod common;

mod config_files;
mod determinism;
mod embedding;
mod scenarios;
mod trace_table;
