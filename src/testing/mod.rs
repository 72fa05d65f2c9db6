//! Test-only fake ADB server and fixtures.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
