//! Delegate (master) CNI config
//!
//! The delegate is kept as its full JSON object so that fields this crate
//! does not interpret are forwarded untouched into the composed config.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ConfError;

/// A parsed and validated delegate CNI config.
#[derive(Debug, Clone, PartialEq)]
pub struct DelegateConfig {
    fields: Map<String, Value>,
}

impl DelegateConfig {
    /// Parse delegate bytes and check the required fields.
    ///
    /// Requires a string `cniVersion`, a string `name`, and either a string
    /// `type` (plain config) or a non-empty `plugins` array (conflist).
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ConfError::malformed(format!("invalid JSON: {}", e)))?;

        let Value::Object(fields) = value else {
            return Err(ConfError::malformed("top level is not a JSON object"));
        };

        let delegate = Self { fields };
        delegate.validate()?;
        Ok(delegate)
    }

    fn validate(&self) -> Result<(), ConfError> {
        for field in ["cniVersion", "name"] {
            match self.fields.get(field) {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(ConfError::malformed(format!("`{}` is not a string", field)))
                }
                None => {
                    return Err(ConfError::malformed(format!(
                        "missing required field `{}`",
                        field
                    )))
                }
            }
        }

        if self.is_conflist() {
            return Ok(());
        }

        match self.fields.get("type") {
            Some(Value::String(_)) => Ok(()),
            Some(_) => Err(ConfError::malformed("`type` is not a string")),
            None => Err(ConfError::malformed(
                "missing required field `type` (or a non-empty `plugins` array)",
            )),
        }
    }

    pub fn cni_version(&self) -> &str {
        self.str_field("cniVersion")
    }

    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    /// Plugin type of a plain config; `None` for a conflist delegate.
    pub fn plugin_type(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// Whether the delegate is itself a conflist (has a non-empty `plugins` array).
    pub fn is_conflist(&self) -> bool {
        self.fields
            .get("plugins")
            .and_then(Value::as_array)
            .is_some_and(|plugins| !plugins.is_empty())
    }

    /// Capabilities to advertise on the composed multus entry.
    ///
    /// A plain delegate's `capabilities` object is returned as is. For a
    /// conflist delegate it is the union of every plugin capability set to
    /// `true`. Returns `None` when there is nothing to advertise.
    pub fn capabilities(&self) -> Option<Value> {
        if self.is_conflist() {
            let plugins = self.fields.get("plugins").and_then(Value::as_array)?;
            let enabled: Map<String, Value> = plugins
                .iter()
                .filter_map(|plugin| plugin.get("capabilities").and_then(Value::as_object))
                .flat_map(|caps| caps.iter())
                .filter(|(_, enabled)| enabled.as_bool() == Some(true))
                .map(|(name, _)| (name.clone(), Value::Bool(true)))
                .collect();

            return if enabled.is_empty() {
                None
            } else {
                Some(Value::Object(enabled))
            };
        }

        self.fields
            .get("capabilities")
            .filter(|caps| !caps.is_null())
            .cloned()
    }

    /// Reconcile the delegate's `cniVersion` with a pinned multus version.
    ///
    /// With `force` the delegate (and thus the embedded copy) is rewritten to
    /// the pinned version. Without it a differing version is an error.
    pub fn apply_version_pin(&mut self, pinned: Option<&str>, force: bool) -> Result<(), ConfError> {
        let Some(pinned) = pinned.filter(|v| !v.is_empty()) else {
            return Ok(());
        };

        if force {
            self.fields
                .insert("cniVersion".to_string(), Value::String(pinned.to_string()));
            return Ok(());
        }

        if self.cni_version() != pinned {
            return Err(ConfError::VersionMismatch {
                configured: pinned.to_string(),
                delegate: self.cni_version().to_string(),
            });
        }
        Ok(())
    }

    /// Compact JSON with keys sorted (RFC 8785), as embedded in `delegates`.
    pub fn to_canonical_json(&self) -> Result<String, ConfError> {
        canonical_json(&self.fields)
    }

    /// The full delegate object, including fields not interpreted here.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn str_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}

/// Render any JSON value in JCS form (compact, keys sorted).
pub(crate) fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ConfError> {
    let bytes = serde_json_canonicalizer::to_vec(value)
        .map_err(|e| ConfError::malformed(format!("JCS canonicalization error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ConfError::malformed(format!("JCS output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<DelegateConfig, ConfError> {
        DelegateConfig::parse(value.to_string().as_bytes())
    }

    #[test]
    fn test_parse_plain_delegate() {
        let delegate = parse(json!({
            "cniVersion": "0.3.1",
            "name": "test1",
            "type": "cnitesttype"
        }))
        .unwrap();

        assert_eq!(delegate.cni_version(), "0.3.1");
        assert_eq!(delegate.name(), "test1");
        assert_eq!(delegate.plugin_type(), Some("cnitesttype"));
        assert!(!delegate.is_conflist());
        assert!(delegate.capabilities().is_none());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = DelegateConfig::parse(b"cniVersion: 0.3.1").unwrap_err();
        assert!(matches!(err, ConfError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = parse(json!(["not", "an", "object"])).unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse(json!({"name": "n", "type": "t"})).unwrap_err();
        assert!(err.to_string().contains("cniVersion"));

        let err = parse(json!({"cniVersion": "0.3.1", "type": "t"})).unwrap_err();
        assert!(err.to_string().contains("name"));

        let err = parse(json!({"cniVersion": "0.3.1", "name": "n"})).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_non_string_version_is_malformed() {
        let err = parse(json!({"cniVersion": 1, "name": "n", "type": "t"})).unwrap_err();
        assert!(err.to_string().contains("`cniVersion` is not a string"));
    }

    #[test]
    fn test_conflist_delegate_needs_no_top_level_type() {
        let delegate = parse(json!({
            "cniVersion": "1.0.0",
            "name": "chain",
            "plugins": [{"type": "bridge"}, {"type": "portmap"}]
        }))
        .unwrap();

        assert!(delegate.is_conflist());
        assert_eq!(delegate.plugin_type(), None);
    }

    #[test]
    fn test_empty_plugins_is_not_a_conflist() {
        let err = parse(json!({"cniVersion": "1.0.0", "name": "n", "plugins": []})).unwrap_err();
        assert!(matches!(err, ConfError::Malformed { .. }));
    }

    #[test]
    fn test_plain_capabilities_copied_verbatim() {
        let delegate = parse(json!({
            "cniVersion": "0.3.1",
            "name": "test1",
            "type": "cnitesttype",
            "capabilities": {"portMappings": false, "bandwidth": true}
        }))
        .unwrap();

        assert_eq!(
            delegate.capabilities(),
            Some(json!({"bandwidth": true, "portMappings": false}))
        );
    }

    #[test]
    fn test_conflist_capabilities_are_union_of_enabled() {
        let delegate = parse(json!({
            "cniVersion": "1.0.0",
            "name": "chain",
            "plugins": [
                {"type": "bridge", "capabilities": {"ips": true, "mac": false}},
                {"type": "portmap", "capabilities": {"portMappings": true}},
                {"type": "tuning"}
            ]
        }))
        .unwrap();

        assert_eq!(
            delegate.capabilities(),
            Some(json!({"ips": true, "portMappings": true}))
        );
    }

    #[test]
    fn test_conflist_without_enabled_capabilities() {
        let delegate = parse(json!({
            "cniVersion": "1.0.0",
            "name": "chain",
            "plugins": [{"type": "bridge", "capabilities": {"mac": false}}]
        }))
        .unwrap();

        assert!(delegate.capabilities().is_none());
    }

    #[test]
    fn test_canonical_json_sorts_keys_and_keeps_unknown_fields() {
        let bytes = br#"{
            "type": "cnitesttype",
            "name": "test1",
            "ipam": {"type": "host-local", "subnet": "10.1.0.0/16"},
            "cniVersion": "0.3.1"
        }"#;
        let delegate = DelegateConfig::parse(bytes).unwrap();

        assert_eq!(
            delegate.to_canonical_json().unwrap(),
            r#"{"cniVersion":"0.3.1","ipam":{"subnet":"10.1.0.0/16","type":"host-local"},"name":"test1","type":"cnitesttype"}"#
        );
    }

    #[test]
    fn test_version_pin_matching() {
        let mut delegate =
            parse(json!({"cniVersion": "0.3.1", "name": "n", "type": "t"})).unwrap();
        delegate.apply_version_pin(Some("0.3.1"), false).unwrap();
        delegate.apply_version_pin(None, false).unwrap();
        delegate.apply_version_pin(Some(""), false).unwrap();
        assert_eq!(delegate.cni_version(), "0.3.1");
    }

    #[test]
    fn test_version_pin_mismatch() {
        let mut delegate =
            parse(json!({"cniVersion": "0.3.1", "name": "n", "type": "t"})).unwrap();
        let err = delegate.apply_version_pin(Some("0.4.0"), false).unwrap_err();
        assert_eq!(
            err,
            ConfError::VersionMismatch {
                configured: "0.4.0".to_string(),
                delegate: "0.3.1".to_string(),
            }
        );
    }

    #[test]
    fn test_version_pin_forced() {
        let mut delegate =
            parse(json!({"cniVersion": "0.3.1", "name": "n", "type": "t"})).unwrap();
        delegate.apply_version_pin(Some("1.0.0"), true).unwrap();
        assert_eq!(delegate.cni_version(), "1.0.0");
        assert_eq!(delegate.fields()["cniVersion"], "1.0.0");
    }
}
