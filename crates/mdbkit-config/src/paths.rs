//! Standard locations.

use std::path::PathBuf;

/// Application directory name under the platform roots.
pub const APP_DIR: &str = "mdbkit";

/// Name of the per-project override directory.
pub const PROJECT_DIR: &str = ".mdbkit";

/// Global config directory, e.g. `~/.config/mdbkit`.
///
/// `None` when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|base| base.join(APP_DIR))
}
