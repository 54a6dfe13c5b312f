//! Where to look for an installation and how one is laid out on disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem layout used by installation discovery.
///
/// All fields default to the stock Deskpro layout; a config file only needs
/// to name the ones it changes. Candidate order is significant: the first
/// valid candidate wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// File whose trimmed content is the path of the active installation
    #[serde(default = "default_pointer_file")]
    pub pointer_file: PathBuf,
    /// Conventional installation roots, tried in order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
    /// Build marker, relative to the installation root
    #[serde(default = "default_build_marker")]
    pub build_marker: PathBuf,
    /// Directory holding one subdirectory per build, relative to the root
    #[serde(default = "default_app_dir")]
    pub app_dir: PathBuf,
    /// Embedded database config, relative to the installation root
    #[serde(default = "default_db_config")]
    pub db_config: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pointer_file: default_pointer_file(),
            candidates: default_candidates(),
            build_marker: default_build_marker(),
            app_dir: default_app_dir(),
            db_config: default_db_config(),
        }
    }
}

impl DiscoveryConfig {
    /// Builder method to replace the pointer file location.
    pub fn with_pointer_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pointer_file = path.into();
        self
    }

    /// Builder method to replace the candidate list.
    pub fn with_candidates<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }
}

// Default value functions for serde
fn default_pointer_file() -> PathBuf {
    PathBuf::from("/etc/deskpro/install-path")
}

fn default_candidates() -> Vec<PathBuf> {
    [
        "/srv/deskpro",
        "/usr/share/deskpro",
        "/usr/share/nginx/deskpro",
        "/usr/share/nginx/html/deskpro",
        "/var/www/deskpro",
        "/var/www/html",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn default_build_marker() -> PathBuf {
    PathBuf::from("app/run/build-num.txt")
}

fn default_app_dir() -> PathBuf {
    PathBuf::from("app")
}

fn default_db_config() -> PathBuf {
    PathBuf::from("config/config.database.php")
}
