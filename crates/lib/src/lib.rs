//! stagetree-lib: declarative multi-file artifact composer.
//!
//! Given an [`ArtifactSpec`](spec::ArtifactSpec) mapping destination paths to
//! either literal text or a link to an existing artifact, this crate builds a
//! single output tree, running an optional validator on each text entry before
//! it is committed:
//! - `spec`: the spec model and its validation
//! - `plan`: ordered installation steps derived from a valid spec
//! - `install`: staging, checking and publishing the tree
//! - `resolve`: injected resolution of link targets

pub mod compose;
pub mod config;
pub mod consts;
pub mod error;
pub mod install;
pub mod plan;
pub mod resolve;
pub mod spec;
pub mod util;

pub use compose::{compose, plan_spec};
pub use config::ComposeConfig;
pub use error::ComposeError;
