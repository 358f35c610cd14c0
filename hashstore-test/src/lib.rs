//! Test utilities for the hashstore load test.
//!
//! This crate provides an in-process stand-in for the hashstore service and a logger for tests.
//! See the modules for all available utilities.

pub mod server;
pub mod tracing;
