//! Shared utilities.
//!
//! Test doubles for the runner and probe seams live here.

#[cfg(test)]
pub mod testutil;
