//! One synthesis cycle: verify, merge, credentials.
//!
//! The driver keeps fingerprints from the previous cycle and only rewrites
//! an output when its inputs changed (or the output went missing).

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::SynthesisError;
use crate::fingerprint::Fingerprint;
use crate::kubeconfig::{kubeconfig_path, CredentialBundle, CredentialFingerprints};
use crate::options::SynthesisOptions;
use crate::synthesize::{compose, discover};
use crate::verify::verify;

/// What the previous cycle produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleState {
    pub master: Option<Fingerprint>,
    pub credentials: Option<CredentialFingerprints>,
    /// Composed config written last.
    pub composed_path: Option<PathBuf>,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub config_path: PathBuf,
    pub fingerprint: Fingerprint,
    pub config_written: bool,
    pub kubeconfig_written: bool,
}

/// Run one cycle, updating `state` with whatever was written.
pub fn run_cycle(
    options: &SynthesisOptions,
    state: &mut CycleState,
) -> Result<CycleReport, SynthesisError> {
    verify(options)?;

    let discovered = discover(options)?;
    let unchanged = match (&state.master, &state.composed_path) {
        (Some(previous), Some(path)) => *previous == discovered.fingerprint && path.exists(),
        _ => false,
    };

    let (config_path, config_written) = match (&state.composed_path, unchanged) {
        (Some(path), true) => {
            debug!("master config {} unchanged", discovered.source_name());
            (path.clone(), false)
        }
        _ => {
            let synthesis = compose(options, &discovered)?;
            info!(
                fingerprint = %synthesis.fingerprint,
                "wrote {:?} from {}",
                synthesis.path,
                discovered.source_name()
            );
            state.master = Some(synthesis.fingerprint);
            state.composed_path = Some(synthesis.path.clone());
            (synthesis.path, true)
        }
    };

    let bundle = CredentialBundle::read(options, None, None)?;
    let fingerprints = bundle.fingerprints();
    let kubeconfig_written = if state.credentials.as_ref() == Some(&fingerprints)
        && kubeconfig_path(options).exists()
    {
        debug!("credentials unchanged");
        false
    } else {
        let path = bundle.write(options)?;
        info!("wrote {:?}", path);
        state.credentials = Some(fingerprints);
        true
    };

    Ok(CycleReport {
        config_path,
        fingerprint: discovered.fingerprint,
        config_written,
        kubeconfig_written,
    })
}
