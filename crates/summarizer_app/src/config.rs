use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use extension_logging::{ext_info, ext_warn, APP};
use summarizer_engine::ExtensionConfig;

/// Reads the runtime config from a RON file. No path, or a path that does not
/// exist, yields the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ExtensionConfig> {
    let Some(path) = path else {
        return Ok(ExtensionConfig::default());
    };

    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            ext_warn!(APP, "config {:?} not found; using defaults", path);
            return Ok(ExtensionConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()));
        }
    };

    let config: ExtensionConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;

    ext_info!(APP, "loaded config from {:?}", path);
    Ok(config)
}
