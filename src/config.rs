use std::path::PathBuf;

use crate::countries;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory the file store keeps its JSON documents in.
    pub data_dir: PathBuf,
    /// Base URL of the REST Countries API.
    pub countries_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("STILLMIND_DATA_DIR")
            .unwrap_or_else(|_| ".stillmind".into())
            .into();
        let countries_url = std::env::var("COUNTRIES_URL")
            .unwrap_or_else(|_| countries::DEFAULT_BASE_URL.into());
        Self {
            data_dir,
            countries_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        std::env::remove_var("STILLMIND_DATA_DIR");
        std::env::remove_var("COUNTRIES_URL");
        let config = AppConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from(".stillmind"));
        assert_eq!(config.countries_url, countries::DEFAULT_BASE_URL);
    }
}
