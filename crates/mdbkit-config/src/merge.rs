use toml::{Table, Value};

use crate::config::Config;
use crate::error::ConfigError;

/// Apply a TOML fragment on top of `base`.
///
/// Nested tables are patched key by key. Scalars and arrays in the fragment
/// replace the base value wholesale.
pub fn merge_configs(base: &Config, overlay_toml: &str) -> Result<Config, ConfigError> {
    let mut merged = match Value::try_from(base).map_err(parse_error)? {
        Value::Table(table) => table,
        other => {
            return Err(ConfigError::Parse(format!(
                "config serialized to a {} instead of a table",
                other.type_str()
            )))
        }
    };
    let overlay: Table = toml::from_str(overlay_toml).map_err(parse_error)?;

    patch_table(&mut merged, overlay);

    Value::Table(merged).try_into().map_err(parse_error)
}

fn parse_error(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Parse(e.to_string())
}

fn patch_table(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(patch) => match base.get_mut(&key) {
                Some(Value::Table(existing)) => patch_table(existing, patch),
                _ => {
                    base.insert(key, Value::Table(patch));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
