//! Standard paths used by regen

use std::path::PathBuf;

/// Environment variable overriding the common template root
pub const TEMPLATE_DIR_ENV: &str = "REGEN_TEMPLATE_DIR";

/// Standard regen paths
pub struct Paths {
    /// Common templates root ($REGEN_TEMPLATE_DIR or ~/.local/share/regen/templates)
    pub templates: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("regen");

        let templates = std::env::var_os(TEMPLATE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data.join("templates"));

        Self { templates }
    }

    /// Paths rooted at an explicit data directory (for testing)
    pub fn with_data_dir(data: PathBuf) -> Self {
        Self {
            templates: data.join("templates"),
        }
    }
}
