use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");

        let mut original_config = Config::default();
        original_config.top_k = 7;
        original_config.embedding.backend = EmbeddingBackend::Hash;
        original_config.completion.provider = Provider::OpenAi;
        original_config.completion.api_key_env = Some("MY_KEY".to_string());

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), toml_content)
            .expect("should write config successfully");

        let loaded_config = Config::load(temp_dir.path()).expect("config should load");

        assert_eq!(loaded_config.top_k, 7);
        assert_eq!(loaded_config.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(loaded_config.completion.provider, Provider::OpenAi);
        assert_eq!(loaded_config.completion.api_key_env(), "MY_KEY");
        assert_eq!(loaded_config.get_base_dir(), temp_dir.path());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "")
            .expect("should write config successfully");

        let config = Config::load(temp_dir.path()).expect("empty config should load");
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.corpus, CorpusConfig::default());
    }

    #[test]
    fn config_validation_edge_cases() {
        let mut config = Config::default();
        config.embedding.ollama.host = String::new();

        let result = config.validate();
        assert!(result.is_err()); // Empty host should be invalid
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            ("http", "example.com", 3000, "http://example.com:3000/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let ollama = OllamaConfig {
                protocol: protocol.to_string(),
                host: host.to_string(),
                port,
                ..OllamaConfig::default()
            };

            let url = ollama.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn completion_endpoint_must_be_http() {
        let completion = CompletionConfig {
            base_url: Some("ftp://example.com/v1".to_string()),
            ..CompletionConfig::default()
        };
        assert!(matches!(
            completion.validate(),
            Err(ConfigError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidTopK(0),
            ConfigError::NoTextExtensions,
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(!message.is_empty());
            assert!(message.len() > 10);
        }
    }
}
