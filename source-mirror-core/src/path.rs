use std::fmt;
use std::path::{Component, Path};

/// A slash-separated path below the remote source root. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        RemotePath(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Derives the remote path of `local_dir` by stripping `output_root` and joining
    /// the remaining components with `/`, whatever the host separator is.
    ///
    /// Returns `None` when `local_dir` is not below `output_root` or contains
    /// anything other than plain components after the prefix.
    pub fn from_local(output_root: &Path, local_dir: &Path) -> Option<Self> {
        let suffix = local_dir.strip_prefix(output_root).ok()?;
        let mut parts = Vec::new();
        for component in suffix.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(RemotePath(parts.join("/")))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when `name` can be used as exactly one local path component.
pub fn is_safe_entry_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
