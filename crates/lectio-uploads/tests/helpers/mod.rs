//! Shared test infrastructure for upload pipeline tests.

pub mod fixtures;
pub mod mocks;
