//! CNI version classification
//!
//! Delegates at or above [`CONFLIST_THRESHOLD`] are wrapped in a conflist.
//! Older delegates, and versions that are not a dotted numeric triple, get
//! the flat conf shape.

use std::fmt;
use std::str::FromStr;

use crate::COMPOSED_FILE_STEM;

/// First CNI version whose composed config is written as a `.conflist`.
pub const CONFLIST_THRESHOLD: CniVersion = CniVersion::new(1, 0, 0);

/// A `major.minor.patch` CNI version.
///
/// Ordering is numeric per component, so `0.10.0 > 0.4.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CniVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CniVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for CniVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A version string that is not exactly three dot-separated integers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a major.minor.patch version: {0:?}")]
pub struct VersionParseError(pub String);

impl FromStr for CniVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let &[major, minor, patch] = parts.as_slice() else {
            return Err(VersionParseError(s.to_string()));
        };

        let component = |part: &str| -> Result<u32, VersionParseError> {
            // u32::from_str accepts a leading '+', which is not a version digit
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError(s.to_string()));
            }
            part.parse::<u32>()
                .map_err(|_| VersionParseError(s.to_string()))
        };

        Ok(CniVersion::new(
            component(major)?,
            component(minor)?,
            component(patch)?,
        ))
    }
}

/// Output shape of the composed config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfShape {
    /// Single object with a `delegates` array, written as `.conf`.
    Conf,
    /// Named chain with a `plugins` array, written as `.conflist`.
    Conflist,
}

impl ConfShape {
    /// Pick the shape for a delegate's `cniVersion`.
    ///
    /// Unparseable versions fall back to [`ConfShape::Conf`].
    pub fn for_version(version: &str) -> Self {
        match version.trim().parse::<CniVersion>() {
            Ok(v) if v >= CONFLIST_THRESHOLD => ConfShape::Conflist,
            _ => ConfShape::Conf,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ConfShape::Conf => "conf",
            ConfShape::Conflist => "conflist",
        }
    }

    /// File name of the composed config in this shape, e.g. `00-multus.conf`.
    pub fn file_name(self) -> String {
        format!("{}.{}", COMPOSED_FILE_STEM, self.extension())
    }

    /// The other shape, whose stale file must not survive a rewrite.
    pub fn sibling(self) -> Self {
        match self {
            ConfShape::Conf => ConfShape::Conflist,
            ConfShape::Conflist => ConfShape::Conf,
        }
    }
}

impl fmt::Display for ConfShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple() {
        assert_eq!("0.3.1".parse::<CniVersion>(), Ok(CniVersion::new(0, 3, 1)));
        assert_eq!("1.0.0".parse::<CniVersion>(), Ok(CniVersion::new(1, 0, 0)));
        assert_eq!(CniVersion::new(0, 4, 0).to_string(), "0.4.0");
    }

    #[test]
    fn test_parse_rejects_non_triples() {
        for bad in ["", "1", "1.0", "1.0.0.0", "1.x.0", "v1.0.0", "1..0", "+1.0.0", "1.0.-1"] {
            assert!(bad.parse::<CniVersion>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_numeric_ordering() {
        let a: CniVersion = "0.10.0".parse().unwrap();
        let b: CniVersion = "0.4.0".parse().unwrap();
        assert!(a > b);
        assert!(CniVersion::new(0, 4, 0) < CONFLIST_THRESHOLD);
        assert!(CniVersion::new(1, 1, 0) > CONFLIST_THRESHOLD);
    }

    #[test]
    fn test_shape_boundary() {
        assert_eq!(ConfShape::for_version("0.3.1"), ConfShape::Conf);
        assert_eq!(ConfShape::for_version("0.4.0"), ConfShape::Conf);
        assert_eq!(ConfShape::for_version("1.0.0"), ConfShape::Conflist);
        assert_eq!(ConfShape::for_version("1.1.0"), ConfShape::Conflist);
    }

    #[test]
    fn test_shape_fallback_for_unparseable() {
        assert_eq!(ConfShape::for_version("1.0"), ConfShape::Conf);
        assert_eq!(ConfShape::for_version("latest"), ConfShape::Conf);
        assert_eq!(ConfShape::for_version(""), ConfShape::Conf);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(ConfShape::Conf.file_name(), "00-multus.conf");
        assert_eq!(ConfShape::Conflist.file_name(), "00-multus.conflist");
        assert_eq!(ConfShape::Conf.sibling(), ConfShape::Conflist);
    }
}
