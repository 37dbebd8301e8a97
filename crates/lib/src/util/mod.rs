//! Shared utilities.
//!
//! Hashing (identifiers and tree digests) and filesystem helpers.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
