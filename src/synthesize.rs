//! Master config discovery and composed config output
//!
//! `synthesize` = `discover` + `compose`:
//! 1. Discover: injected bytes, else the named file, else the lowest-named
//!    eligible file in the autoconfig directory; fingerprint the raw bytes
//! 2. Compose: parse, apply the version pin, render, write-then-rename into
//!    the CNI config directory, remove the other shape's stale file
//!
//! A driver can compare the discovered fingerprint with the previous cycle's
//! before paying for the compose step.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use multus_conf::{has_candidate_extension, select_master, Candidate, ConfShape, DelegateConfig};
use walkdir::WalkDir;

use crate::error::SynthesisError;
use crate::fingerprint::Fingerprint;
use crate::fsutil::{remove_if_exists, write_atomic};
use crate::options::SynthesisOptions;

/// Raw delegate bytes as found, before any merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDelegate {
    /// File the bytes came from; `None` when injected by the caller.
    pub source: Option<PathBuf>,
    pub bytes: Vec<u8>,
    pub fingerprint: Fingerprint,
}

impl DiscoveredDelegate {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            source: None,
            fingerprint: Fingerprint::of(&bytes),
            bytes,
        }
    }

    fn from_file(path: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            source: Some(path),
            ..Self::from_bytes(bytes)
        }
    }

    /// Human-readable origin for error messages.
    pub fn source_name(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "<injected>".to_string(),
        }
    }
}

/// Result of one successful synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    /// Composed config written by this call.
    pub path: PathBuf,
    /// Fingerprint of the delegate bytes as discovered.
    pub fingerprint: Fingerprint,
    pub shape: ConfShape,
    pub source: Option<PathBuf>,
}

/// Discover the delegate, compose the multus config and write it.
///
/// `delegate_bytes` bypasses discovery entirely.
pub fn synthesize(
    options: &SynthesisOptions,
    delegate_bytes: Option<&[u8]>,
) -> Result<Synthesis, SynthesisError> {
    let discovered = match delegate_bytes {
        Some(bytes) => DiscoveredDelegate::from_bytes(bytes),
        None => discover(options)?,
    };
    compose(options, &discovered)
}

/// Find and read the delegate config without writing anything.
pub fn discover(options: &SynthesisOptions) -> Result<DiscoveredDelegate, SynthesisError> {
    let dir = &options.multus_autoconfig_dir;

    if let Some(name) = options.master_cni_file_name() {
        let path = dir.join(name);
        let bytes = read_source(&path)?;
        return Ok(DiscoveredDelegate::from_file(path, bytes));
    }

    let snapshot = read_snapshot(dir)?;
    let selected = select_master(&snapshot).ok_or_else(|| SynthesisError::NoCandidate {
        dir: dir.clone(),
    })?;

    Ok(DiscoveredDelegate::from_file(
        dir.join(&selected.file_name),
        selected.bytes.clone(),
    ))
}

/// Merge a discovered delegate with the options and write the composed config.
pub fn compose(
    options: &SynthesisOptions,
    discovered: &DiscoveredDelegate,
) -> Result<Synthesis, SynthesisError> {
    let source_name = discovered.source_name();
    let conf_err = |e| SynthesisError::from_conf(&source_name, e);

    let mut delegate = DelegateConfig::parse(&discovered.bytes).map_err(conf_err)?;
    delegate
        .apply_version_pin(options.cni_version.as_deref(), options.force_cni_version)
        .map_err(conf_err)?;
    let composed = multus_conf::compose(&delegate, &options.plugin_settings()).map_err(conf_err)?;

    if !options.cni_conf_dir.is_dir() {
        return Err(SynthesisError::not_found(
            "cni conf directory",
            &options.cni_conf_dir,
        ));
    }

    let path = composed_path(options, composed.shape);
    write_atomic(&path, composed.text.as_bytes())
        .map_err(|e| SynthesisError::write_failed(&path, e))?;

    let stale = composed_path(options, composed.shape.sibling());
    remove_if_exists(&stale).map_err(|e| SynthesisError::write_failed(&stale, e))?;

    Ok(Synthesis {
        path,
        fingerprint: discovered.fingerprint.clone(),
        shape: composed.shape,
        source: discovered.source.clone(),
    })
}

/// Where the composed config of a given shape lives.
pub fn composed_path(options: &SynthesisOptions, shape: ConfShape) -> PathBuf {
    options.cni_conf_dir.join(shape.file_name())
}

fn read_source(path: &Path) -> Result<Vec<u8>, SynthesisError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SynthesisError::not_found("master CNI config", path),
        _ => SynthesisError::read_failed(path, e),
    })
}

/// Read every CNI-config-looking regular file of `dir` into memory.
///
/// Entries that vanish or fail to read mid-scan are skipped; the next cycle
/// sees the directory as it settles. Failing to list `dir` itself is an
/// error rather than an empty snapshot.
fn read_snapshot(dir: &Path) -> Result<Vec<Candidate>, SynthesisError> {
    if !dir.is_dir() {
        return Err(SynthesisError::not_found("multus autoconfig directory", dir));
    }

    let mut snapshot = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                return Err(SynthesisError::read_failed(path, io::Error::from(e)));
            }
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !has_candidate_extension(file_name) {
            continue;
        }
        if let Ok(bytes) = fs::read(entry.path()) {
            snapshot.push(Candidate::new(file_name, bytes));
        }
    }

    Ok(snapshot)
}
