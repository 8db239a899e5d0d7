//! Master config selection
//!
//! Selection runs over a snapshot of the source directory that has already
//! been read into memory:
//! 1. Keep files with a CNI config extension
//! 2. Drop the composed multus outputs themselves
//! 3. Keep entries whose bytes parse as a JSON object
//! 4. Choose the lowest file name by plain byte-wise comparison

use serde_json::Value;

use crate::version::ConfShape;

/// File extensions that mark a directory entry as a CNI config.
pub const CANDIDATE_EXTENSIONS: &[&str] = &["conf", "conflist", "json"];

/// One directory entry read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Candidate {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Whether a file name carries one of [`CANDIDATE_EXTENSIONS`].
pub fn has_candidate_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && CANDIDATE_EXTENSIONS.contains(&ext))
}

fn is_composed_output(file_name: &str) -> bool {
    file_name == ConfShape::Conf.file_name() || file_name == ConfShape::Conflist.file_name()
}

/// Whether a snapshot entry may be selected as the master config.
pub fn is_eligible(candidate: &Candidate) -> bool {
    has_candidate_extension(&candidate.file_name)
        && !is_composed_output(&candidate.file_name)
        && serde_json::from_slice::<Value>(&candidate.bytes).is_ok_and(|v| v.is_object())
}

/// Choose the master config from a directory snapshot.
///
/// Returns `None` when no entry is eligible. Ties cannot occur since file
/// names within one directory are unique.
pub fn select_master(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| is_eligible(c))
        .min_by(|a, b| a.file_name.as_bytes().cmp(b.file_name.as_bytes()))
}
