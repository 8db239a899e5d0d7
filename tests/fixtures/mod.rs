//! Shared fixtures for the integration tests
//!
//! - Delegate configs under `tests/fixtures/delegates/`
//! - A throwaway host layout (`HostLayout`) with CNI dirs, a multus binary
//!   and service-account credentials under a restricted root

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use multus_thin_entrypoint::{HostRoot, SynthesisOptions};
use tempfile::TempDir;

/// Kubeconfig path the golden documents embed.
pub const KUBECONFIG_HOST: &str = "/etc/foobar_kubeconfig";

/// Path to a delegate fixture
pub fn delegate_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/delegates")
        .join(name)
}

/// Contents of a delegate fixture
pub fn delegate(name: &str) -> String {
    fs::read_to_string(delegate_path(name)).expect("delegate fixture")
}

/// Temporary host filesystem
pub struct HostLayout {
    pub dir: TempDir,
    pub cni_conf_dir: PathBuf,
    pub cni_bin_dir: PathBuf,
    pub autoconfig_dir: PathBuf,
    pub multus_bin_file: PathBuf,
}

impl HostLayout {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let cni_conf_dir = dir.path().join("host/etc/cni/net.d");
        let cni_bin_dir = dir.path().join("host/opt/cni/bin");
        let autoconfig_dir = dir.path().join("auto_conf");
        let multus_bin_file = dir.path().join("multus");

        fs::create_dir_all(&cni_conf_dir).unwrap();
        fs::create_dir_all(&cni_bin_dir).unwrap();
        fs::create_dir_all(&autoconfig_dir).unwrap();
        fs::write(&multus_bin_file, b"").unwrap();

        Self {
            dir,
            cni_conf_dir,
            cni_bin_dir,
            autoconfig_dir,
            multus_bin_file,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Options pointing at this layout, with only the kubeconfig path set
    /// among the plugin knobs.
    pub fn options(&self) -> SynthesisOptions {
        let mut options = SynthesisOptions {
            cni_conf_dir: self.cni_conf_dir.clone(),
            cni_bin_dir: self.cni_bin_dir.clone(),
            multus_autoconfig_dir: self.autoconfig_dir.clone(),
            multus_bin_file: self.multus_bin_file.clone(),
            multus_kubeconfig_file_host: KUBECONFIG_HOST.to_string(),
            ..Default::default()
        };
        options.api_endpoint.host = "10.96.0.1".to_string();
        options.api_endpoint.port = "443".to_string();
        // credentials keep their default absolute paths, re-anchored here
        options.credentials.root = HostRoot::new(self.root());
        options
    }

    /// Drop a delegate config into the autoconfig directory.
    pub fn add_delegate(&self, name: &str, content: &str) -> PathBuf {
        let path = self.autoconfig_dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write the service-account CA and token under the root.
    pub fn write_credentials(&self, ca: &str, token: &str) {
        let secrets = self
            .root()
            .join("var/run/secrets/kubernetes.io/serviceaccount");
        fs::create_dir_all(&secrets).unwrap();
        fs::write(secrets.join("ca.crt"), ca).unwrap();
        fs::write(secrets.join("token"), token).unwrap();
    }
}
