//! Helpers for tests that need a real database.
pub mod prepare_env;
