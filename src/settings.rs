use std::path::PathBuf;

use config::{Config, Environment};
use serde::Deserialize;
use tracing::warn;

pub const ENV_PREFIX: &str = "VOZ";

/// Input locations and cleaning constants. Every field can be overridden
/// with a `VOZ_`-prefixed environment variable, e.g. `VOZ_USERS_PATH`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub users_path: PathBuf,
    pub posts_path: PathBuf,
    pub join_key: String,
    /// Placeholder written into empty biographies.
    pub missing_bio: String,
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            users_path: PathBuf::from("data/usuarios.csv"),
            posts_path: PathBuf::from("data/publicaciones.json"),
            join_key: "id_usuario".to_string(),
            missing_bio: "Desconocido".to_string(),
            preview_rows: 5,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let config = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .unwrap_or_default();
        Self::from_config(config)
    }

    /// Falls back to defaults when the overrides do not deserialize.
    pub fn from_config(config: Config) -> Self {
        config.try_deserialize().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring invalid settings overrides");
            Settings::default()
        })
    }
}
