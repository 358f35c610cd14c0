//! A load test for the read endpoints of the hashstore file service.
//!
//! Every [`VirtualUser`] repeatedly picks one of three tasks, `info`, `meta` or `object`, picks a
//! random [`TestCase`] from a fixed table and requests `/{task}/{pid}` from the service. The
//! check passes if the response status matches the status expected for that identifier and task.
//! Expecting a `404` is valid: identifiers without system metadata answer `meta` that way.
//!
//! Users pause for a random think time between tasks. The [`run`] function drives many users
//! concurrently for a fixed duration and reports per-path request counts, latencies and
//! failures.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod case;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod runner;
pub mod stats;
pub mod user;

pub use crate::case::{Operation, TestCase};
pub use crate::runner::run;
pub use crate::user::{Attempt, UserBehavior, VirtualUser};
