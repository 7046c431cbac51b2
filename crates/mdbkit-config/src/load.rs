use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ConfigError;
use crate::merge::merge_configs;
use crate::paths::PROJECT_DIR;
use crate::validate::validate;

/// Written to a fresh global config file.
const DEFAULT_CONFIG_CONTENT: &str = r#"# mdbkit configuration
# Uncomment and edit settings below to override defaults.

# [debugger]
# executable = "mdb"
# args = []
# prompt = "^>"
# halted_pattern = "HALTED\\r?\\n"
# halt_marker = "Stop at"
# quit_exclusion = "quit"
# receive_timeout_ms = 0

# [log]
# level = "info"
# file = "/path/to/mdbkit.log"
"#;

/// Load the layered configuration.
///
/// 1. Read `config_dir/config.toml`, creating it with commented defaults
///    when missing.
/// 2. If `project_dir` is given, walk upward from it to the nearest
///    `.mdbkit/config.toml`.
/// 3. Merge `Config::default() <- global <- project` and validate.
pub fn load_config(config_dir: &Path, project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let global_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)?;
    }
    if !global_path.exists() {
        std::fs::write(&global_path, DEFAULT_CONFIG_CONTENT)
            .map_err(|e| ConfigError::CreateDefault(e.to_string()))?;
        tracing::info!(path = %global_path.display(), "created default config");
    }

    let mut config = Config::default();

    let global_content = std::fs::read_to_string(&global_path)?;
    if has_non_comment_content(&global_content) {
        config = merge_configs(&config, &global_content)?;
    }

    if let Some(project_path) = project_dir.and_then(find_project_config) {
        tracing::debug!(path = %project_path.display(), "project config");
        let project_content = std::fs::read_to_string(&project_path)?;
        config = merge_configs(&config, &project_content)?;
    }

    checked(config)
}

/// Load a single explicit file over the defaults.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    checked(merge_configs(&Config::default(), &content)?)
}

/// Parse a TOML string straight into a validated [`Config`].
pub fn load_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    checked(config)
}

/// Validate, logging every violation and returning the first.
fn checked(config: Config) -> Result<Config, ConfigError> {
    match validate(&config) {
        Ok(()) => Ok(config),
        Err(errors) => {
            for e in &errors {
                tracing::warn!(error = %e, "invalid config");
            }
            Err(errors
                .into_iter()
                .next()
                .unwrap_or_else(|| ConfigError::Validation {
                    field: "unknown".to_string(),
                    message: "validation failed".to_string(),
                }))
        }
    }
}

/// Walk from `start` upward looking for `.mdbkit/config.toml`.
fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR).join("config.toml"))
        .find(|candidate| candidate.is_file())
}

fn has_non_comment_content(content: &str) -> bool {
    content.lines().any(|l| {
        let trimmed = l.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}
