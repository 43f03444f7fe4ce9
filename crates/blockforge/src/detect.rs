//! One-call detection entry points.

use blockforge_config::DetectionConfig;
use blockforge_core::IndexSpace;
use blockforge_detect::{DetectionLoop, DetectionResult, Result};
use tracing::warn;

/// Configuration file read by [`detect`] from the working directory.
pub const CONFIG_FILE: &str = "blockforge.toml";

/// Detects decompositions of `space` with the configuration in
/// [`CONFIG_FILE`], or the defaults if there is none.
///
/// A configuration file that exists but cannot be read is reported and
/// ignored.
pub fn detect(space: &dyn IndexSpace) -> Result<DetectionResult<'_>> {
    let config = match DetectionConfig::load(CONFIG_FILE) {
        Ok(config) => config,
        Err(err) => {
            if std::path::Path::new(CONFIG_FILE).exists() {
                warn!(file = CONFIG_FILE, error = %err, "ignoring unreadable configuration");
            }
            DetectionConfig::default()
        }
    };
    detect_with(space, config)
}

/// Detects decompositions of `space` with `config`.
pub fn detect_with(space: &dyn IndexSpace, config: DetectionConfig) -> Result<DetectionResult<'_>> {
    #[cfg(feature = "console")]
    crate::console::init();

    DetectionLoop::new(space, config).run()
}
