//! Shared helper functions for command execution.

use crate::cli::RuntimeConfig;
use crate::config::PackagingConfig;
use crate::error::Result;

/// Load the packaging config named on the command line.
pub(super) fn load_config(config: &RuntimeConfig) -> Result<PackagingConfig> {
    let path = config.config_path();
    config
        .output()
        .verbose(&format!("Loading packaging config from {}", path.display()));
    PackagingConfig::load(path)
}

/// Human-readable size.
pub(super) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(17), "17 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
