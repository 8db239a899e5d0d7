//! Composed config rendering
//!
//! The multus entry is written line by line rather than through a JSON
//! serializer: key order and indentation are fixed, and the embedded delegate
//! sits compact on its own line. Both shapes share the same plugin body.
//!
//! Flat shape (`.conf`), fields at 8 spaces, delegate at 16:
//!
//! ```text
//! {
//!         "cniVersion": "0.3.1",
//!         "name": "multus-cni-network",
//!         "type": "multus",
//!         ...
//!         "delegates": [
//!                 {...}
//!         ]
//! }
//! ```
//!
//! List shape (`.conflist`), chain fields at 4, plugin at 8, delegate at 12.

use serde_json::Value;

use crate::delegate::{canonical_json, DelegateConfig};
use crate::error::ConfError;
use crate::version::ConfShape;
use crate::{MULTUS_NETWORK_NAME, MULTUS_PLUGIN_TYPE};

/// Operator settings carried on the multus plugin entry.
///
/// `None`, empty strings and `false` leave the key out of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSettings {
    pub namespace_isolation: bool,
    pub global_namespaces: Option<String>,
    /// When false the entry carries `"logToStderr": false`.
    pub log_to_stderr: bool,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// Extra directory the dispatcher searches for delegate binaries.
    pub bin_dir: Option<String>,
    /// CNI config directory as seen by the dispatcher.
    pub cni_conf_dir: Option<String>,
    pub readiness_indicator_file: Option<String>,
    /// Kubeconfig path on the host; always emitted.
    pub kubeconfig: String,
}

/// A rendered composed config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedConfig {
    pub shape: ConfShape,
    pub cni_version: String,
    pub text: String,
}

impl ComposedConfig {
    pub fn file_name(&self) -> String {
        self.shape.file_name()
    }
}

/// Merge a delegate with plugin settings into the composed document.
///
/// The shape follows the delegate's `cniVersion`.
pub fn compose(delegate: &DelegateConfig, settings: &PluginSettings) -> Result<ComposedConfig, ConfError> {
    let shape = ConfShape::for_version(delegate.cni_version());
    let body = plugin_body(delegate, settings)?;
    let embedded = delegate.to_canonical_json()?;
    let version = delegate.cni_version();

    let text = match shape {
        ConfShape::Conf => render_conf(version, &body, &embedded),
        ConfShape::Conflist => render_conflist(version, &body, &embedded),
    };

    Ok(ComposedConfig {
        shape,
        cni_version: version.to_string(),
        text,
    })
}

/// Ordered `(key, encoded value)` pairs of the multus entry, `delegates` excluded.
fn plugin_body(
    delegate: &DelegateConfig,
    settings: &PluginSettings,
) -> Result<Vec<(&'static str, String)>, ConfError> {
    let mut fields = vec![("type", quote(MULTUS_PLUGIN_TYPE))];

    if let Some(capabilities) = delegate.capabilities() {
        fields.push(("capabilities", canonical_json(&capabilities)?));
    }
    if settings.namespace_isolation {
        fields.push(("namespaceIsolation", "true".to_string()));
    }
    if let Some(namespaces) = non_empty(&settings.global_namespaces) {
        fields.push(("globalNamespaces", quote(namespaces)));
    }
    if !settings.log_to_stderr {
        fields.push(("logToStderr", "false".to_string()));
    }
    if let Some(level) = non_empty(&settings.log_level) {
        fields.push(("logLevel", quote(&level.to_lowercase())));
    }
    if let Some(file) = non_empty(&settings.log_file) {
        fields.push(("logFile", quote(file)));
    }
    if let Some(dir) = non_empty(&settings.bin_dir) {
        fields.push(("binDir", quote(dir)));
    }
    if let Some(dir) = non_empty(&settings.cni_conf_dir) {
        fields.push(("cniConf", quote(dir)));
    }
    if let Some(file) = non_empty(&settings.readiness_indicator_file) {
        fields.push(("readinessindicatorfile", quote(file)));
    }
    fields.push(("kubeconfig", quote(&settings.kubeconfig)));

    Ok(fields)
}

fn render_conf(version: &str, body: &[(&'static str, String)], embedded: &str) -> String {
    let mut out = String::from("{\n");
    push_field(&mut out, 8, "cniVersion", &quote(version));
    push_field(&mut out, 8, "name", &quote(MULTUS_NETWORK_NAME));
    for (key, value) in body {
        push_field(&mut out, 8, key, value);
    }
    push_delegates(&mut out, 8, 16, embedded);
    out.push_str("}\n");
    out
}

fn render_conflist(version: &str, body: &[(&'static str, String)], embedded: &str) -> String {
    let mut out = String::from("{\n");
    push_field(&mut out, 4, "cniVersion", &quote(version));
    push_field(&mut out, 4, "name", &quote(MULTUS_NETWORK_NAME));
    out.push_str("    \"plugins\": [ {\n");
    for (key, value) in body {
        push_field(&mut out, 8, key, value);
    }
    push_delegates(&mut out, 8, 12, embedded);
    out.push_str("    }]\n");
    out.push_str("}\n");
    out
}

fn push_field(out: &mut String, indent: usize, key: &str, value: &str) {
    out.push_str(&" ".repeat(indent));
    out.push_str(&quote(key));
    out.push_str(": ");
    out.push_str(value);
    out.push_str(",\n");
}

/// The `delegates` array, always the last key of the multus entry.
fn push_delegates(out: &mut String, indent: usize, inner: usize, embedded: &str) {
    let pad = " ".repeat(indent);
    out.push_str(&pad);
    out.push_str("\"delegates\": [\n");
    out.push_str(&" ".repeat(inner));
    out.push_str(embedded);
    out.push('\n');
    out.push_str(&pad);
    out.push_str("]\n");
}

fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
