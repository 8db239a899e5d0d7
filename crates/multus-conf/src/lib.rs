//! Composition of the multus CNI configuration.
//!
//! Takes the bytes of a delegate ("master") CNI config and the operator's
//! plugin settings and produces the text of `00-multus.conf` or
//! `00-multus.conflist`. Everything here is pure: directory scans arrive as
//! in-memory snapshots and nothing touches the filesystem.

mod delegate;
mod error;
mod render;
mod select;
mod version;

pub use delegate::DelegateConfig;
pub use error::ConfError;
pub use render::{compose, ComposedConfig, PluginSettings};
pub use select::{
    has_candidate_extension, is_eligible, select_master, Candidate, CANDIDATE_EXTENSIONS,
};
pub use version::{CniVersion, ConfShape, VersionParseError, CONFLIST_THRESHOLD};

/// Network name written into every composed config.
pub const MULTUS_NETWORK_NAME: &str = "multus-cni-network";

/// Plugin type of the composed entry.
pub const MULTUS_PLUGIN_TYPE: &str = "multus";

/// File stem shared by the `.conf` and `.conflist` outputs.
pub const COMPOSED_FILE_STEM: &str = "00-multus";
