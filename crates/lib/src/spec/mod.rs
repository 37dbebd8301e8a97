//! Artifact specifications and their validation.
//!
//! An [`ArtifactSpec`] maps destination paths to the rule producing each one.
//! The wire form ([`RawEntry`]) may be malformed; [`validate`] turns it into
//! typed [`ValidEntry`] values or fails on the first offending entry.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "": { "text": "#!/bin/sh\necho hi", "executable": true },
//!   "/share/doc": { "link": "/opt/docs" },
//!   "/etc/app.json": { "text": "{}", "mode": "0600", "check": "jq empty" }
//! }
//! ```
//!
//! # Submodules
//!
//! - [`validate`] - path/mode grammar and entry classification

mod types;
pub mod validate;

pub use types::*;
pub use validate::validate;
