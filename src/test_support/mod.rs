//! Test utilities for linkfold unit tests.

pub mod fixtures;

pub use fixtures::*;
