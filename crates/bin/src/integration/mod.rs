//! Integration module for the command-line runner.
//!
//! Wires platform defaults and terminal feedback around the library
//! pipeline.

pub(crate) mod cache_manager;
pub(crate) mod progress;
