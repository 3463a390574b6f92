use super::*;

#[test]
fn hash_backend_from_config() {
    let config = EmbeddingConfig {
        backend: EmbeddingBackend::Hash,
        hash_dimension: 48,
        ..EmbeddingConfig::default()
    };

    let embedder = embedder_from_config(&config).expect("hash embedder should build");
    assert_eq!(embedder.name(), "hash");
    assert_eq!(embedder.embed("orders").expect("embedding").len(), 48);
}

#[test]
fn ollama_backend_from_config() {
    let embedder =
        embedder_from_config(&EmbeddingConfig::default()).expect("ollama client should build");
    assert_eq!(embedder.name(), "all-minilm");
}

#[test]
fn boxed_embedder_delegates() {
    let boxed: Box<dyn Embedder> = Box::new(HashEmbedder::new(16));
    let direct = HashEmbedder::new(16);

    let texts = vec!["customers".to_string()];
    assert_eq!(
        boxed.embed_batch(&texts).expect("embedding"),
        direct.embed_batch(&texts).expect("embedding")
    );
}
