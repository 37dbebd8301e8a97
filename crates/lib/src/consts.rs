//! Shared constants.

/// Prefix of every internal variable identifier.
pub const VAR_NAME_PREFIX: &str = "file_";

/// Subdirectory of the build directory holding staged text content.
pub const STAGING_DIR: &str = "staging";

/// Subdirectory of the build directory holding scratch dirs for validators.
pub const CHECK_SCRATCH_DIR: &str = "check";

/// Subdirectory of the build directory where the output tree is assembled.
pub const TREE_DIR: &str = "tree";

/// Prefix of the private build directory created next to the output root.
pub const BUILD_DIR_PREFIX: &str = ".stagetree-build-";

/// Argument zero handed to the shell when running a validator.
pub const CHECK_ARG0: &str = "stagetree-check";

pub const DEFAULT_TEXT_MODE: u32 = 0o644;
pub const DEFAULT_EXECUTABLE_MODE: u32 = 0o755;

/// Upper bound on filesystem closures queued on the blocking pool by one build.
pub const BLOCKING_SLOTS: u32 = 256;
