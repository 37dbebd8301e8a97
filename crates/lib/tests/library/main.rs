//! Library-level tests for stagetree-lib.

mod compose_tests;
mod determinism_tests;
