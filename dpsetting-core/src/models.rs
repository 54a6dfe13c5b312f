//! Data types shared across discovery, the store and the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A validated installation root.
///
/// Only produced by [`crate::install::InstallationLocator`], after the build
/// marker and the versioned application directory were both found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    root: PathBuf,
    build: String,
}

impl Installation {
    pub(crate) fn new(root: PathBuf, build: String) -> Self {
        Self { root, build }
    }

    /// Root directory of the installation
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Build token read from the marker file
    pub fn build(&self) -> &str {
        &self.build
    }

    /// Resolves a path relative to the installation root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// A named text value from the settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Unique setting name
    pub name: String,
    /// Stored value
    pub value: String,
}

/// Result of a settings operation, as reported to the caller.
///
/// For reads `created` and `changed` are always false. For previews they
/// describe what a write would have done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingOutcome {
    /// Setting name
    pub name: String,
    /// Value now stored (or that would be stored, for a preview)
    pub value: String,
    /// Whether the setting did not exist before
    pub created: bool,
    /// Whether the stored value differs from the previous one
    pub changed: bool,
}

impl SettingOutcome {
    /// Outcome of a plain read.
    pub fn unchanged(setting: Setting) -> Self {
        Self {
            name: setting.name,
            value: setting.value,
            created: false,
            changed: false,
        }
    }
}

/// What an upsert has to do, given the current and the requested value.
///
/// All store backends share this decision so insert/update/skip semantics
/// cannot drift between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    /// No row exists yet
    Insert,
    /// A row exists with a different value
    Update,
    /// A row exists with the requested value; nothing is written
    Unchanged,
}

impl WritePlan {
    /// Decides the write for `current` (None = absent) and `requested`.
    pub fn for_values(current: Option<&str>, requested: &str) -> Self {
        match current {
            None => Self::Insert,
            Some(existing) if existing == requested => Self::Unchanged,
            Some(_) => Self::Update,
        }
    }

    /// Whether the setting would be created
    pub fn created(self) -> bool {
        matches!(self, Self::Insert)
    }

    /// Whether the stored value would change
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
