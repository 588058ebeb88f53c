//! Shared helpers for inventory integration tests.

pub mod fake_postgrest;
