//! Existence checks run before each synthesis cycle.

use std::path::Path;

use crate::error::SynthesisError;
use crate::options::{SynthesisOptions, LEGACY_CONF_AUTO};

/// Check that the directories and files the cycle depends on exist.
///
/// Checks, in order: the CNI config directory, the autoconfig directory the
/// master config is read from, the CNI binary directory, the multus binary
/// and the legacy multus config (skipped when `auto`).
/// Any file type counts; contents and permissions are not inspected.
/// Fails on the first missing path.
pub fn verify(options: &SynthesisOptions) -> Result<(), SynthesisError> {
    require("cni conf directory", &options.cni_conf_dir)?;
    require("multus autoconfig directory", &options.multus_autoconfig_dir)?;
    require("cni bin directory", &options.cni_bin_dir)?;
    require("multus bin file", &options.multus_bin_file)?;

    if options.multus_conf_file != LEGACY_CONF_AUTO {
        require("multus conf file", Path::new(&options.multus_conf_file))?;
    }

    Ok(())
}

fn require(what: &'static str, path: &Path) -> Result<(), SynthesisError> {
    if path.as_os_str().is_empty() || !path.exists() {
        return Err(SynthesisError::not_found(what, path));
    }
    Ok(())
}
