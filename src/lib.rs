//! Multus thin entrypoint
//!
//! Startup-time synthesizer for the multus CNI plugin: picks the delegate
//! network config dropped into the CNI config directory, composes it into
//! `00-multus.conf` / `00-multus.conflist`, and writes the kubeconfig the
//! plugin uses to reach the API server.
//!
//! The three operations a driver calls each cycle are [`verify`],
//! [`synthesize`] and [`build_credentials`]; [`run_cycle`] strings them
//! together with fingerprint-based change detection.

pub mod cycle;
pub mod error;
pub mod fingerprint;
pub mod fsutil;
pub mod kubeconfig;
pub mod options;
pub mod root;
pub mod shutdown;
pub mod synthesize;
pub mod verify;

pub use cycle::{run_cycle, CycleReport, CycleState};
pub use error::{ErrorKind, SynthesisError};
pub use fingerprint::Fingerprint;
pub use kubeconfig::{build_credentials, kubeconfig_path, CredentialBundle, CredentialFingerprints};
pub use options::{ApiEndpoint, CredentialPaths, OptionsError, SynthesisOptions};
pub use root::HostRoot;
pub use synthesize::{compose, composed_path, discover, synthesize, DiscoveredDelegate, Synthesis};
pub use verify::verify;

pub use multus_conf::ConfShape;
