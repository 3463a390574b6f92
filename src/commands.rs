
use anyhow::{Context, Result};
use console::style;
use std::io;
use tracing::{info, warn};

use crate::agent::{ChatCompletion, ChatMessage, OpenAiCompatibleClient, RagAgent};
use crate::config::{Config, EmbeddingBackend};
use crate::corpus::{ChunkKind, Corpus, CorpusOptions, build_corpus};
use crate::database::{ChunkCollection, StoredChunk};
use crate::embeddings::{OllamaClient, embedder_from_config};
use crate::session;
use crate::store::{EmbeddingStore, IngestReport};

/// Characters of each record shown by `view`
pub const PREVIEW_CHARS: usize = 100;

/// Message sent by `hello` to check the completion provider
pub const HELLO_MESSAGE: &str = "Hello! Briefly, what can you help me with?";

/// Build the corpus, ingest it and answer questions from stdin until the user quits
#[inline]
pub async fn ask(config: &Config) -> Result<()> {
    let client = OpenAiCompatibleClient::from_config(&config.completion)?;
    let agent = build_agent(client, config);

    let mut store = open_store(config).await?;
    let report = ingest_corpus(config, &mut store).await?;
    print_ingest_report(&report);

    if report.records == 0 {
        warn!("Collection is empty, answers will have no context");
    }

    println!(
        "Ask about the warehouse metadata. Type {} or {} to leave.",
        style("exit").bold(),
        style("quit").bold()
    );
    println!();

    let summary = session::run(
        io::BufReader::new(io::stdin()),
        io::stdout(),
        &store,
        &agent,
        config.top_k,
    )
    .await?;

    info!(
        "Answered {} questions ({} failed)",
        summary.answered, summary.failed
    );
    Ok(())
}

/// Build the corpus and write it to the vector store without starting a session
#[inline]
pub async fn ingest(config: &Config) -> Result<IngestReport> {
    let mut store = open_store(config).await?;
    let report = ingest_corpus(config, &mut store).await?;
    print_ingest_report(&report);
    Ok(report)
}

/// List every stored record with a short preview of its text
#[inline]
pub async fn view(config: &Config) -> Result<Vec<StoredChunk>> {
    let collection = ChunkCollection::open(&config.store_path(), &config.store.collection)
        .await
        .context("Failed to open vector store")?;
    let chunks = collection.list().await?;

    if chunks.is_empty() {
        println!("No records stored in {}.", style(collection.name()).cyan());
        println!("Run {} to build the collection.", style("metadata-rag ingest").bold());
        return Ok(chunks);
    }

    for chunk in &chunks {
        println!(
            "{} {} {}",
            style(format!("[{}]", chunk.id)).bold(),
            style(format!("({})", chunk.kind)).dim(),
            preview(&chunk.text, PREVIEW_CHARS)
        );
    }
    println!();
    println!("Total records: {}", style(chunks.len()).bold());

    Ok(chunks)
}

/// Send a single greeting to the completion provider and print the reply
#[inline]
pub fn hello(config: &Config) -> Result<String> {
    let client = OpenAiCompatibleClient::from_config(&config.completion)?;

    println!(
        "Sending greeting to {} ({})",
        style(config.completion.base_url()).cyan(),
        style(client.model()).cyan()
    );

    let reply = client
        .complete(&[ChatMessage::user(HELLO_MESSAGE)])
        .context("Completion provider did not answer")?;

    println!();
    println!("{}", reply);
    Ok(reply)
}

/// Show configuration, embedder health and the number of stored records
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 Metadata RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📁 Corpus:");
    let data_dir = config.data_dir();
    if data_dir.is_dir() {
        match build_corpus(&data_dir, &CorpusOptions::from(&config.corpus)) {
            Ok(corpus) => print_corpus_summary(&corpus),
            Err(e) => println!("   ❌ Failed to build corpus - {}", e),
        }
    } else {
        println!("   ❌ Data directory {} not found", data_dir.display());
    }

    println!("🤖 Embeddings:");
    match config.embedding.backend {
        EmbeddingBackend::Ollama => match OllamaClient::new(&config.embedding.ollama) {
            Ok(client) => match client.health_check() {
                Ok(()) => {
                    println!("   ✅ Ollama: Connected ({})", client.base_url());
                    println!("   📋 Model: {}", client.model());
                }
                Err(e) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
            },
            Err(e) => println!("   ❌ Ollama: Invalid configuration - {:#}", e),
        },
        EmbeddingBackend::Hash => {
            println!(
                "   ✅ Hash embedder ({} dimensions)",
                config.embedding.hash_dimension
            );
        }
    }

    println!("🔍 Vector Store:");
    match ChunkCollection::open(&config.store_path(), &config.store.collection).await {
        Ok(collection) => match collection.count().await {
            Ok(count) => {
                println!(
                    "   ✅ LanceDB: {} ({} records)",
                    collection.path().display(),
                    count
                );
                if let Some(dimension) = collection.vector_dimension() {
                    println!("   🔢 Dimension: {}", dimension);
                }
            }
            Err(e) => println!("   ⚠️  LanceDB: Connected but unreadable - {}", e),
        },
        Err(e) => println!("   ❌ LanceDB: Failed to open - {}", e),
    }

    println!("💬 Chat Completion:");
    println!(
        "   Endpoint: {} ({})",
        config.completion.base_url(),
        config.completion.model
    );
    let key_var = config.completion.api_key_env();
    if std::env::var(key_var).is_ok_and(|v| !v.trim().is_empty()) {
        println!("   ✅ API key: ${} is set", key_var);
    } else {
        println!("   ❌ API key: ${} is not set", key_var);
    }

    Ok(())
}

fn build_agent<C: ChatCompletion>(client: C, config: &Config) -> RagAgent<C> {
    match &config.completion.instruction {
        Some(instruction) => RagAgent::with_instruction(client, instruction.as_str()),
        None => RagAgent::new(client),
    }
}

async fn open_store(config: &Config) -> Result<EmbeddingStore> {
    let embedder = embedder_from_config(&config.embedding)?;
    let store = EmbeddingStore::open(&config.store_path(), &config.store.collection, embedder)
        .await
        .context("Failed to open vector store")?;
    Ok(store)
}

async fn ingest_corpus(config: &Config, store: &mut EmbeddingStore) -> Result<IngestReport> {
    let data_dir = config.data_dir();
    let corpus = build_corpus(&data_dir, &CorpusOptions::from(&config.corpus))
        .with_context(|| format!("Failed to build corpus from {}", data_dir.display()))?;
    print_corpus_summary(&corpus);

    let report = store.ingest(&corpus).await.context("Failed to ingest corpus")?;
    Ok(report)
}

fn print_corpus_summary(corpus: &Corpus) {
    println!(
        "   {} chunks: {} tables, {} relations, {} domain, {} terms, {} files",
        style(corpus.len()).bold(),
        corpus.count_kind(ChunkKind::Table),
        corpus.count_kind(ChunkKind::Relation),
        corpus.count_kind(ChunkKind::Domain),
        corpus.count_kind(ChunkKind::Term),
        corpus.count_kind(ChunkKind::File)
    );
}

fn print_ingest_report(report: &IngestReport) {
    println!(
        "{} Stored {} records for {} chunks",
        style("✓").green(),
        report.records,
        report.chunks
    );
}

/// First `max_chars` characters of `text` on a single line
#[inline]
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() > max_chars {
        let mut short: String = flat.chars().take(max_chars).collect();
        short.push_str("...");
        short
    } else {
        flat
    }
}
