//! Installation discovery.
//!
//! An installation is recognised by its build marker: a small file whose
//! trimmed content names the active build, which must exist as a directory
//! under the application directory.
//!
//! # Discovery order
//! 1. An explicit path, when given. Anything other than a valid installation
//!    there is fatal.
//! 2. The pointer file. A missing or unreadable pointer is ignored, and so is
//!    a pointer whose target fails validation.
//! 3. The candidate list, in order. The first valid candidate wins; a
//!    candidate with a marker but no matching build directory aborts
//!    discovery.

use crate::Result;
use crate::config::DiscoveryConfig;
use crate::error::SettingError;
use crate::models::Installation;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Finds and validates installation roots.
#[derive(Debug, Clone, Default)]
pub struct InstallationLocator {
    layout: DiscoveryConfig,
}

impl InstallationLocator {
    /// Creates a locator for the given layout.
    pub fn new(layout: DiscoveryConfig) -> Self {
        Self { layout }
    }

    /// The layout this locator searches with.
    pub fn layout(&self) -> &DiscoveryConfig {
        &self.layout
    }

    /// Resolves the installation root.
    ///
    /// # Errors
    /// - `BrokenInstallation` when `explicit` is not a valid installation, or
    ///   when a candidate has a marker without a matching build directory
    /// - `InstallationNotFound` when nothing valid was found
    pub fn locate(&self, explicit: Option<&Path>) -> Result<Installation> {
        if let Some(path) = explicit {
            return self.validate_explicit(path);
        }

        let mut searched = Vec::with_capacity(self.layout.candidates.len() + 1);

        if let Some(pointed) = self.read_pointer() {
            searched.push(pointed.clone());
            match self.inspect(&pointed) {
                Ok(Some(installation)) => {
                    debug!(path = %pointed.display(), "Using installation from pointer file");
                    return Ok(installation);
                }
                Ok(None) => warn!(
                    path = %pointed.display(),
                    "Pointer file names a path without an installation; trying candidates"
                ),
                Err(e) => warn!(
                    path = %pointed.display(),
                    error = %e,
                    "Pointer file names a broken installation; trying candidates"
                ),
            }
        }

        for candidate in &self.layout.candidates {
            searched.push(candidate.clone());
            if let Some(installation) = self.inspect(candidate)? {
                debug!(path = %candidate.display(), "Found installation at candidate path");
                return Ok(installation);
            }
        }

        Err(SettingError::InstallationNotFound { searched })
    }

    /// Validates a path the caller asked for by name.
    ///
    /// # Errors
    /// Returns `BrokenInstallation` if the path is not a valid installation.
    pub fn validate_explicit(&self, path: &Path) -> Result<Installation> {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        match self.inspect(&path)? {
            Some(installation) => Ok(installation),
            None => Err(SettingError::broken_installation(
                &path,
                format!(
                    "the path should point to a Deskpro installation, but `{}` could not be read",
                    self.layout.build_marker.display()
                ),
            )),
        }
    }

    /// Checks whether `path` is an installation.
    ///
    /// Returns `Ok(None)` when the build marker cannot be read, which simply
    /// means nothing is installed there.
    ///
    /// # Errors
    /// Returns `BrokenInstallation` when the marker is readable but does not
    /// name an existing build directory.
    pub fn inspect(&self, path: &Path) -> Result<Option<Installation>> {
        let marker = path.join(&self.layout.build_marker);
        let build = match fs::read_to_string(&marker) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) => {
                debug!(marker = %marker.display(), error = %e, "No build marker");
                return Ok(None);
            }
        };

        if !is_plain_component(&build) {
            return Err(SettingError::broken_installation(
                path,
                format!(
                    "`{}` does not name a build directory (content: {:?})",
                    self.layout.build_marker.display(),
                    build
                ),
            ));
        }

        let app_dir = path.join(&self.layout.app_dir).join(&build);
        if !app_dir.is_dir() {
            return Err(SettingError::broken_installation(
                path,
                format!(
                    "`{}` names build `{}` but `{}` is not a directory",
                    self.layout.build_marker.display(),
                    build,
                    app_dir.display()
                ),
            ));
        }

        Ok(Some(Installation::new(path.to_path_buf(), build)))
    }

    fn read_pointer(&self) -> Option<PathBuf> {
        let contents = match fs::read_to_string(&self.layout.pointer_file) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(
                    pointer = %self.layout.pointer_file.display(),
                    error = %e,
                    "Pointer file not readable; skipping"
                );
                return None;
            }
        };

        let pointed = contents.trim();
        if pointed.is_empty() {
            debug!(pointer = %self.layout.pointer_file.display(), "Pointer file is empty");
            return None;
        }
        Some(PathBuf::from(pointed))
    }
}

/// A build token must be a single normal path component.
fn is_plain_component(token: &str) -> bool {
    let mut components = Path::new(token).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
