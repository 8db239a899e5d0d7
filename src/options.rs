//! Synthesis options
//!
//! One immutable snapshot per cycle. Layers, lowest precedence first:
//! 1. Built-in defaults (the in-cluster daemonset paths)
//! 2. Options file (TOML, `--config`)
//! 3. CLI flags (applied by the binary)
//!
//! String knobs left as `None` or empty are omitted from the composed config.

use std::path::{Path, PathBuf};

use multus_conf::PluginSettings;
use serde::Deserialize;

use crate::root::HostRoot;

/// Default CNI config directory (destination, and default delegate source).
pub const DEFAULT_CNI_CONF_DIR: &str = "/host/etc/cni/net.d";

/// Default CNI binary directory.
pub const DEFAULT_CNI_BIN_DIR: &str = "/host/opt/cni/bin";

/// Default location of the multus plugin binary inside the image.
pub const DEFAULT_MULTUS_BIN_FILE: &str = "/usr/src/multus-cni/bin/multus";

/// Kubeconfig path as seen from the host, written into the composed config.
pub const DEFAULT_KUBECONFIG_FILE_HOST: &str = "/etc/cni/net.d/multus.d/multus.kubeconfig";

/// Legacy config value meaning "generate the config, nothing to check".
pub const LEGACY_CONF_AUTO: &str = "auto";

/// Service account CA bundle mounted into the pod.
pub const SERVICE_ACCOUNT_CA_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Service account bearer token mounted into the pod.
pub const SERVICE_ACCOUNT_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Options for one synthesis cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Destination directory for the composed config.
    pub cni_conf_dir: PathBuf,
    /// Directory the CNI binaries are installed into.
    pub cni_bin_dir: PathBuf,
    /// Directory scanned for the delegate config.
    pub multus_autoconfig_dir: PathBuf,
    /// Explicit delegate file name inside `multus_autoconfig_dir`.
    pub multus_master_cni_file_name: Option<String>,
    pub multus_bin_file: PathBuf,
    /// Legacy plugin config, only checked for existence; `auto` skips the check.
    pub multus_conf_file: String,
    pub multus_kubeconfig_file_host: String,

    /// Pin the composed `cniVersion`.
    pub cni_version: Option<String>,
    /// Rewrite the delegate to `cni_version` instead of rejecting a mismatch.
    pub force_cni_version: bool,

    pub namespace_isolation: bool,
    pub global_namespaces: Option<String>,
    pub multus_log_to_stderr: bool,
    pub multus_log_level: Option<String>,
    pub multus_log_file: Option<String>,
    pub additional_bin_dir: Option<String>,
    /// CNI config directory as the dispatcher sees it.
    pub multus_cni_conf_dir: Option<String>,
    pub readiness_indicator_file: Option<String>,

    pub skip_tls_verify: bool,
    /// CA bundle embedded in the kubeconfig instead of the service account CA.
    pub kube_ca_file: Option<PathBuf>,
    pub api_endpoint: ApiEndpoint,
    pub credentials: CredentialPaths,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            cni_conf_dir: PathBuf::from(DEFAULT_CNI_CONF_DIR),
            cni_bin_dir: PathBuf::from(DEFAULT_CNI_BIN_DIR),
            multus_autoconfig_dir: PathBuf::from(DEFAULT_CNI_CONF_DIR),
            multus_master_cni_file_name: None,
            multus_bin_file: PathBuf::from(DEFAULT_MULTUS_BIN_FILE),
            multus_conf_file: LEGACY_CONF_AUTO.to_string(),
            multus_kubeconfig_file_host: DEFAULT_KUBECONFIG_FILE_HOST.to_string(),
            cni_version: None,
            force_cni_version: false,
            namespace_isolation: false,
            global_namespaces: None,
            multus_log_to_stderr: false,
            multus_log_level: None,
            multus_log_file: None,
            additional_bin_dir: None,
            multus_cni_conf_dir: None,
            readiness_indicator_file: None,
            skip_tls_verify: false,
            kube_ca_file: None,
            api_endpoint: ApiEndpoint::default(),
            credentials: CredentialPaths::default(),
        }
    }
}

impl SynthesisOptions {
    /// Load options from a TOML file, missing keys taking the defaults.
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        if !path.exists() {
            return Err(OptionsError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse options from a TOML string.
    pub fn parse(content: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(content)?)
    }

    /// The knobs that end up on the composed multus entry.
    pub fn plugin_settings(&self) -> PluginSettings {
        PluginSettings {
            namespace_isolation: self.namespace_isolation,
            global_namespaces: self.global_namespaces.clone(),
            log_to_stderr: self.multus_log_to_stderr,
            log_level: self.multus_log_level.clone(),
            log_file: self.multus_log_file.clone(),
            bin_dir: self.additional_bin_dir.clone(),
            cni_conf_dir: self.multus_cni_conf_dir.clone(),
            readiness_indicator_file: self.readiness_indicator_file.clone(),
            kubeconfig: self.multus_kubeconfig_file_host.clone(),
        }
    }

    /// Explicit delegate file name, if one is set and non-empty.
    pub fn master_cni_file_name(&self) -> Option<&str> {
        self.multus_master_cni_file_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

/// Kubernetes API server the kubeconfig points at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiEndpoint {
    pub protocol: String,
    pub host: String,
    pub port: String,
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            host: String::new(),
            port: String::new(),
        }
    }
}

impl ApiEndpoint {
    /// `protocol://host:port`, bracketing IPv6 literals.
    pub fn server_url(&self) -> String {
        let protocol = if self.protocol.is_empty() {
            "https"
        } else {
            &self.protocol
        };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        if self.port.is_empty() {
            format!("{}://{}", protocol, host)
        } else {
            format!("{}://{}:{}", protocol, host, self.port)
        }
    }
}

/// Where the credential inputs live, resolved under `root`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialPaths {
    pub root: HostRoot,
    pub ca_file: PathBuf,
    pub token_file: PathBuf,
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self {
            root: HostRoot::default(),
            ca_file: PathBuf::from(SERVICE_ACCOUNT_CA_FILE),
            token_file: PathBuf::from(SERVICE_ACCOUNT_TOKEN_FILE),
        }
    }
}

/// Errors loading an options file.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Options file not found: {0}")]
    NotFound(PathBuf),
}
