//! Path Guard
//!
//! Decides filesystem access against the allow/read-only roots of a
//! [`Policy`]. Every decision is made on the fully resolved target:
//!
//! 1. Make the path absolute (relative to the current directory).
//! 2. Walk it component by component from the root. Existing symlinks are
//!    followed (recursively, relative links against their parent), `..`
//!    pops the already-resolved parent, and components that do not exist
//!    yet are appended lexically.
//! 3. Test membership component-wise, so `/tmp/foobar` is never inside
//!    `/tmp/foo`.
//!
//! Roots are resolved the same way, so a root reached through a symlink
//! (e.g. `/tmp` → `/private/tmp`) still matches.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use toolgate_application::PathGuardError;
use toolgate_domain::Policy;

/// Symlink hops followed before giving up (matches Linux `MAXSYMLINKS`).
const MAX_SYMLINK_DEPTH: usize = 40;

/// Resolve `path` as far as the filesystem allows and rejoin the
/// unresolved tail.
pub fn resolve_path(path: &Path) -> Result<PathBuf, PathGuardError> {
    resolve(path, 0).map_err(|source| PathGuardError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve(path: &Path, depth: usize) -> io::Result<PathBuf> {
    if depth > MAX_SYMLINK_DEPTH {
        return Err(io::Error::other("too many levels of symbolic links"));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    // Invariant: `resolved` never contains a symlink or `..`
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                resolved = match fs::symlink_metadata(&candidate) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        let target = fs::read_link(&candidate)?;
                        resolve(&resolved.join(target), depth + 1)?
                    }
                    Ok(_) => candidate,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => candidate,
                    Err(e) => return Err(e),
                };
            }
        }
    }
    Ok(resolved)
}

/// Whether `path` equals `root` or lies beneath it. Both must be resolved.
fn is_within(path: &Path, root: &Path) -> bool {
    // Component-wise: equivalent to a `root + separator` prefix test
    path.starts_with(root)
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Require `path` to resolve inside one of `roots`. No roots means no
/// restriction. Returns the resolved path.
pub fn check_allowed(path: &Path, roots: &[PathBuf]) -> Result<PathBuf, PathGuardError> {
    if roots.is_empty() {
        return Ok(path.to_path_buf());
    }
    let resolved = resolve_path(path)?;
    for root in roots {
        if is_within(&resolved, &resolve_path(root)?) {
            return Ok(resolved);
        }
    }
    tracing::debug!(path = %resolved.display(), "Path outside allowed roots");
    Err(PathGuardError::OutsideAllowedRoots {
        path: resolved,
        roots: display_roots(roots),
    })
}

/// Require `path` to resolve outside every read-only root. Returns the
/// resolved path.
pub fn check_writable(path: &Path, read_only_roots: &[PathBuf]) -> Result<PathBuf, PathGuardError> {
    if read_only_roots.is_empty() {
        return Ok(path.to_path_buf());
    }
    let resolved = resolve_path(path)?;
    for root in read_only_roots {
        if is_within(&resolved, &resolve_path(root)?) {
            tracing::debug!(path = %resolved.display(), root = %root.display(), "Path is read-only");
            return Err(PathGuardError::ReadOnly {
                path: resolved,
                root: root.clone(),
            });
        }
    }
    Ok(resolved)
}

/// Policy-bound convenience wrapper used by the sandboxes and file tools.
#[derive(Debug, Clone, Copy)]
pub struct PathGuard<'a> {
    policy: &'a Policy,
}

impl<'a> PathGuard<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    /// Check a path that will be read.
    pub fn check_read(&self, path: &Path) -> Result<PathBuf, PathGuardError> {
        check_allowed(path, &self.policy.allowed_paths)
    }

    /// Check a path that will be written: allowed and not read-only.
    pub fn check_write(&self, path: &Path) -> Result<PathBuf, PathGuardError> {
        let path = check_allowed(path, &self.policy.allowed_paths)?;
        check_writable(&path, &self.policy.read_only_paths)
    }
}
