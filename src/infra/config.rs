//! Configuration for the external extending and publications services.
//!
//! The converter core never opens a socket; these settings exist so a host
//! SDK client (see `services::extend`) can be wired up with the same five
//! parameters the legacy conversion frontends require.

use crate::infra::error::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Converter configuration with extender and publications endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Extending service (KSI extender) URL
    pub extender_url: String,

    /// Username for the extending service
    pub extender_login_id: String,

    /// HMAC key for the extending service
    pub extender_login_key: String,

    /// Publications file URL
    pub publications_file_url: String,

    /// Publications file certificate qualification constraint
    pub publications_file_constraint: String,
}

impl ConverterConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| {
            ConvertError::Argument(format!(
                "invalid configuration file {}: {e}",
                path.as_ref().display()
            ))
        })
    }

    /// Save configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConvertResult<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConvertError::Argument(format!("failed to serialize config: {e}")))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// True when all endpoints needed for extending are present.
    #[must_use]
    pub fn can_extend(&self) -> bool {
        !self.extender_url.is_empty() && !self.publications_file_url.is_empty()
    }
}
