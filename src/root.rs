//! Restricted-root path resolution
//!
//! Credential reads may run inside an isolated filesystem root. Absolute
//! paths are re-anchored under an explicit root instead of changing the
//! process root or working directory.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// Filesystem root that absolute paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct HostRoot(PathBuf);

impl HostRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Re-anchor `path` under this root.
    ///
    /// `/var/run/x` under root `/tmp/r` becomes `/tmp/r/var/run/x`. Relative
    /// paths are joined as is. `..` components never climb above the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut resolved = self.0.clone();
        let mut depth = 0usize;

        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    if depth > 0 {
                        resolved.pop();
                        depth -= 1;
                    }
                }
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
            }
        }

        resolved
    }
}

impl Default for HostRoot {
    fn default() -> Self {
        Self(PathBuf::from("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_root_is_identity() {
        let root = HostRoot::default();
        assert_eq!(
            root.resolve(Path::new("/var/run/secrets/token")),
            PathBuf::from("/var/run/secrets/token")
        );
    }

    #[test]
    fn test_absolute_path_reanchored() {
        let root = HostRoot::new("/tmp/chroot");
        assert_eq!(
            root.resolve(Path::new("/cni_conf/multus.d")),
            PathBuf::from("/tmp/chroot/cni_conf/multus.d")
        );
    }

    #[test]
    fn test_relative_path_joined() {
        let root = HostRoot::new("/tmp/chroot");
        assert_eq!(
            root.resolve(Path::new("etc/cni")),
            PathBuf::from("/tmp/chroot/etc/cni")
        );
    }

    #[test]
    fn test_parent_dir_cannot_escape() {
        let root = HostRoot::new("/tmp/chroot");
        assert_eq!(
            root.resolve(Path::new("/../../etc/passwd")),
            PathBuf::from("/tmp/chroot/etc/passwd")
        );
        assert_eq!(
            root.resolve(Path::new("/a/b/../c")),
            PathBuf::from("/tmp/chroot/a/c")
        );
    }
}
