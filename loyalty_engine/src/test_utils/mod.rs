//! Helpers for setting up throwaway ledgers in tests.
pub mod prepare_env;

pub use prepare_env::{prepare_test_env, random_db_path};
