use std::collections::BTreeMap;

use super::{Config, ConfigSource};

impl Config {
    fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as key -> (value, source label), sorted by key
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: String| {
            let source = self.source_of(key).to_string();
            config.insert(key.to_string(), (value, source));
        };

        add_config("format", self.format().to_string());
        add_config("max_tokens", self.max_tokens().to_string());
        add_config("include_tests", self.include_tests().to_string());
        add_config("policy", self.policy().to_string());
        add_config(
            "cache_dir",
            self.cache
                .dir
                .clone()
                .unwrap_or_else(|| "~/.breach-cache".to_string()),
        );
        add_config("repos", self.repos.len().to_string());

        config
    }
}
