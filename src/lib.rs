//! Core library for the `stress-test` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, the request dispatch engine, result
//! aggregation and report rendering. The primary user-facing interface is the
//! `stress-test` command-line application.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod report;
pub mod shutdown;
pub mod version;
