//! Shared fixtures for unit tests.

mod builder;

pub use builder::{ClassBuilder, ElementValue};
