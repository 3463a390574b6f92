// Configuration management module
// Loads `config.toml` from the project directory and prints the effective settings

pub mod settings;

#[cfg(test)]
mod tests;

use console::style;

pub use settings::{
    CONFIG_FILE_NAME, CompletionConfig, Config, ConfigError, CorpusConfig, EmbeddingBackend,
    EmbeddingConfig, OllamaConfig, Provider, StoreConfig,
};

/// Print the effective configuration, including values filled in from defaults
#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Corpus:").bold().yellow());
    eprintln!("  Data directory: {}", style(config.data_dir().display()).cyan());
    eprintln!(
        "  Text files: {}/**/*.{{{}}}",
        style(config.corpus.text_dir.display()).cyan(),
        style(config.corpus.text_extensions.join(",")).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Vector Store:").bold().yellow());
    eprintln!("  Path: {}", style(config.store_path().display()).cyan());
    eprintln!("  Collection: {}", style(&config.store.collection).cyan());
    eprintln!("  Top K: {}", style(config.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Embeddings:").bold().yellow());
    match config.embedding.backend {
        EmbeddingBackend::Ollama => {
            let ollama = &config.embedding.ollama;
            eprintln!("  Backend: {}", style("ollama").cyan());
            match ollama.ollama_url() {
                Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
                Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
            }
            eprintln!("  Model: {}", style(&ollama.model).cyan());
            eprintln!("  Batch Size: {}", style(ollama.batch_size).cyan());
        }
        EmbeddingBackend::Hash => {
            eprintln!("  Backend: {}", style("hash").cyan());
            eprintln!(
                "  Dimension: {}",
                style(config.embedding.hash_dimension).cyan()
            );
        }
    }

    eprintln!();
    eprintln!("{}", style("Chat Completion:").bold().yellow());
    eprintln!("  Endpoint: {}", style(config.completion.base_url()).cyan());
    eprintln!("  Model: {}", style(&config.completion.model).cyan());
    let key_var = config.completion.api_key_env();
    let key_state = if std::env::var(key_var).is_ok_and(|v| !v.trim().is_empty()) {
        style("set").green()
    } else {
        style("missing").red()
    };
    eprintln!("  API key: ${} ({})", key_var, key_state);

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
}
