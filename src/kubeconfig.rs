//! Credential file builder
//!
//! Reads the service-account CA bundle and bearer token, renders the
//! kubeconfig the multus binary uses to reach the API server, and returns
//! fingerprints of both inputs so a driver can detect rotation without
//! diffing the rendered document.
//!
//! Every path is resolved under [`CredentialPaths::root`], so the builder
//! works unchanged inside an isolated filesystem root.
//!
//! [`CredentialPaths::root`]: crate::options::CredentialPaths

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::error::SynthesisError;
use crate::fingerprint::Fingerprint;
use crate::fsutil::write_private;
use crate::options::SynthesisOptions;

/// Subdirectory of the CNI config directory holding the kubeconfig.
pub const KUBECONFIG_SUBDIR: &str = "multus.d";

pub const KUBECONFIG_FILE_NAME: &str = "multus.kubeconfig";

/// Fingerprints of the two credential inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFingerprints {
    pub ca: Fingerprint,
    pub token: Fingerprint,
}

/// CA and token bytes read for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    ca: Vec<u8>,
    token: Vec<u8>,
}

impl CredentialBundle {
    pub fn new(ca: impl Into<Vec<u8>>, token: impl Into<Vec<u8>>) -> Self {
        Self {
            ca: ca.into(),
            token: token.into(),
        }
    }

    /// Read the CA and token, preferring override bytes when given.
    pub fn read(
        options: &SynthesisOptions,
        ca_override: Option<&[u8]>,
        token_override: Option<&[u8]>,
    ) -> Result<Self, SynthesisError> {
        let paths = &options.credentials;

        let ca = match ca_override {
            Some(bytes) => bytes.to_vec(),
            None => read_under_root(options, "CA bundle", &paths.ca_file)?,
        };
        let token = match token_override {
            Some(bytes) => bytes.to_vec(),
            None => read_under_root(options, "service account token", &paths.token_file)?,
        };

        Ok(Self { ca, token })
    }

    pub fn fingerprints(&self) -> CredentialFingerprints {
        CredentialFingerprints {
            ca: Fingerprint::of(&self.ca),
            token: Fingerprint::of(&self.token),
        }
    }

    /// Render the kubeconfig document.
    ///
    /// `kube_ca_file`, when set, replaces the embedded CA content.
    pub fn render(&self, options: &SynthesisOptions) -> Result<String, SynthesisError> {
        let tls = if options.skip_tls_verify {
            "insecure-skip-tls-verify: true".to_string()
        } else {
            let ca = match &options.kube_ca_file {
                Some(path) => read_under_root(options, "kube CA file", path)?,
                None => self.ca.clone(),
            };
            format!("certificate-authority-data: {}", STANDARD.encode(ca))
        };

        // a JSON string is a valid YAML double-quoted scalar
        let token = Value::from(String::from_utf8_lossy(&self.token).trim()).to_string();

        Ok(format!(
            "# Kubeconfig file for Multus CNI plugin.\n\
             apiVersion: v1\n\
             kind: Config\n\
             clusters:\n\
             - name: local\n\
             \x20 cluster:\n\
             \x20   server: {server}\n\
             \x20   {tls}\n\
             users:\n\
             - name: multus\n\
             \x20 user:\n\
             \x20   token: {token}\n\
             contexts:\n\
             - name: multus-context\n\
             \x20 context:\n\
             \x20   cluster: local\n\
             \x20   user: multus\n\
             current-context: multus-context\n",
            server = options.api_endpoint.server_url(),
            tls = tls,
            token = token,
        ))
    }

    /// Render and write the kubeconfig, creating its directory if absent.
    ///
    /// The file carries the bearer token, so it is readable by its owner only.
    pub fn write(&self, options: &SynthesisOptions) -> Result<PathBuf, SynthesisError> {
        let text = self.render(options)?;
        let path = kubeconfig_path(options);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| SynthesisError::write_failed(dir, e))?;
        }
        write_private(&path, text.as_bytes())
            .map_err(|e| SynthesisError::write_failed(&path, e))?;

        Ok(path)
    }
}

/// Where the kubeconfig is written, resolved under the credential root.
pub fn kubeconfig_path(options: &SynthesisOptions) -> PathBuf {
    options
        .credentials
        .root
        .resolve(&options.cni_conf_dir)
        .join(KUBECONFIG_SUBDIR)
        .join(KUBECONFIG_FILE_NAME)
}

/// Read credentials, write the kubeconfig and return the input fingerprints.
pub fn build_credentials(
    options: &SynthesisOptions,
    ca_override: Option<&[u8]>,
    token_override: Option<&[u8]>,
) -> Result<CredentialFingerprints, SynthesisError> {
    let bundle = CredentialBundle::read(options, ca_override, token_override)?;
    bundle.write(options)?;
    Ok(bundle.fingerprints())
}

fn read_under_root(
    options: &SynthesisOptions,
    what: &'static str,
    path: &Path,
) -> Result<Vec<u8>, SynthesisError> {
    let resolved = options.credentials.root.resolve(path);
    // unreadable counts as missing
    fs::read(&resolved).map_err(|_| SynthesisError::not_found(what, &resolved))
}
