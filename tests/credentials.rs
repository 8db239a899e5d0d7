//! Credential file builder tests
//!
//! Kubeconfig rendering under a restricted root and rotation detection.

mod fixtures;

use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fixtures::HostLayout;
use multus_thin_entrypoint::{build_credentials, kubeconfig_path, ErrorKind, Fingerprint};

#[test]
fn test_writes_kubeconfig_under_root() {
    let layout = HostLayout::new();
    layout.write_credentials("ca-data", "token-data");
    let options = layout.options();

    let fingerprints = build_credentials(&options, None, None).unwrap();
    assert_eq!(fingerprints.ca, Fingerprint::of(b"ca-data"));
    assert_eq!(fingerprints.token, Fingerprint::of(b"token-data"));

    let path = kubeconfig_path(&options);
    assert!(path.starts_with(layout.root()));
    assert!(path.ends_with("multus.d/multus.kubeconfig"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("    server: https://10.96.0.1:443\n"));
    assert!(text.contains(&format!(
        "    certificate-authority-data: {}\n",
        STANDARD.encode("ca-data")
    )));
    assert!(text.contains("    token: \"token-data\"\n"));
    assert!(text.ends_with("current-context: multus-context\n"));
}

#[test]
fn test_fingerprints_follow_content() {
    let layout = HostLayout::new();
    layout.write_credentials("ca", "token");
    let options = layout.options();

    let first = build_credentials(&options, None, None).unwrap();
    let again = build_credentials(&options, None, None).unwrap();
    assert_eq!(first, again);

    layout.write_credentials("ca", "rotated");
    let rotated = build_credentials(&options, None, None).unwrap();
    assert_eq!(rotated.ca, first.ca);
    assert_ne!(rotated.token, first.token);

    layout.write_credentials("new-ca", "rotated");
    let new_ca = build_credentials(&options, None, None).unwrap();
    assert_ne!(new_ca.ca, rotated.ca);
    assert_eq!(new_ca.token, rotated.token);
}

#[test]
fn test_overrides_skip_reads() {
    let layout = HostLayout::new();
    let options = layout.options();

    let fingerprints = build_credentials(
        &options,
        Some(b"injected-ca".as_slice()),
        Some(b"injected-token".as_slice()),
    )
    .unwrap();
    assert_eq!(fingerprints.ca, Fingerprint::of(b"injected-ca"));

    let text = fs::read_to_string(kubeconfig_path(&options)).unwrap();
    assert!(text.contains("token: \"injected-token\""));
}

#[test]
fn test_missing_ca() {
    let layout = HostLayout::new();
    let err = build_credentials(&layout.options(), None, Some(b"tok".as_slice())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!kubeconfig_path(&layout.options()).exists());
}

#[test]
fn test_skip_tls_verify() {
    let layout = HostLayout::new();
    layout.write_credentials("ca", "token");
    let mut options = layout.options();
    options.skip_tls_verify = true;

    build_credentials(&options, None, None).unwrap();
    let text = fs::read_to_string(kubeconfig_path(&options)).unwrap();
    assert!(text.contains("    insecure-skip-tls-verify: true\n"));
    assert!(!text.contains("certificate-authority-data"));
}

#[cfg(unix)]
#[test]
fn test_kubeconfig_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let layout = HostLayout::new();
    layout.write_credentials("ca", "token");
    let options = layout.options();

    build_credentials(&options, None, None).unwrap();
    let mode = fs::metadata(kubeconfig_path(&options))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o077, 0, "kubeconfig mode {:o}", mode);
}
