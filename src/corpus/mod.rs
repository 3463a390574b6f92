// Corpus builder
// Turns the metadata tree into an ordered sequence of self-contained text chunks

pub mod metadata;


use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::{RagError, Result};
use metadata::{DomainDocument, GlossaryDocument, RelationsDocument, TablesDocument, load_document};

pub const TABLES_FILE: &str = "metadata/tables.yaml";
pub const RELATIONS_FILE: &str = "metadata/relations.yaml";
pub const DOMAIN_FILE: &str = "metadata/domains.yaml";
pub const GLOSSARY_FILE: &str = "glossary.yaml";

/// Source record a chunk was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Table,
    Relation,
    Domain,
    Term,
    File,
}

impl ChunkKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Relation => "relation",
            Self::Domain => "domain",
            Self::Term => "term",
            Self::File => "file",
        }
    }

    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "table" => Some(Self::Table),
            "relation" => Some(Self::Relation),
            "domain" => Some(Self::Domain),
            "term" => Some(Self::Term),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-contained unit of text; its identity is its position in the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub text: String,
}

/// Ordered chunks produced by one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from plain texts, each tagged as a file chunk
    #[inline]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut corpus = Self::new();
        for text in texts {
            corpus.push(ChunkKind::File, text.into());
        }
        corpus
    }

    #[inline]
    pub fn push(&mut self, kind: ChunkKind, text: String) {
        self.chunks.push(Chunk { kind, text });
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    /// Number of chunks of the given kind
    #[inline]
    pub fn count_kind(&self, kind: ChunkKind) -> usize {
        self.chunks.iter().filter(|c| c.kind == kind).count()
    }
}

/// Where flat text files are looked up and which extensions qualify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    pub text_dir: PathBuf,
    pub text_extensions: Vec<String>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self::from(&CorpusConfig::default())
    }
}

impl From<&CorpusConfig> for CorpusOptions {
    #[inline]
    fn from(config: &CorpusConfig) -> Self {
        Self {
            text_dir: config.text_dir.clone(),
            text_extensions: config.text_extensions.clone(),
        }
    }
}

/// Build the corpus rooted at `base_dir`
///
/// Order is fixed: tables, relations, domain, glossary terms, then text files
/// sorted by path. Any missing metadata document or schema mismatch aborts the build.
#[inline]
pub fn build_corpus(base_dir: &Path, options: &CorpusOptions) -> Result<Corpus> {
    info!("Building corpus from {}", base_dir.display());
    let mut corpus = Corpus::new();

    let tables: TablesDocument = load_document(&base_dir.join(TABLES_FILE))?;
    for table in &tables.tables {
        corpus.push(ChunkKind::Table, table.to_chunk_text());
    }

    let relations: RelationsDocument = load_document(&base_dir.join(RELATIONS_FILE))?;
    for relation in &relations.relations {
        corpus.push(ChunkKind::Relation, relation.to_chunk_text());
    }

    let domain: DomainDocument = load_document(&base_dir.join(DOMAIN_FILE))?;
    corpus.push(ChunkKind::Domain, domain.domain.to_chunk_text());

    let glossary: GlossaryDocument = load_document(&base_dir.join(GLOSSARY_FILE))?;
    for term in &glossary.terms {
        corpus.push(ChunkKind::Term, term.to_chunk_text());
    }

    for text in load_text_files(&base_dir.join(&options.text_dir), &options.text_extensions)? {
        corpus.push(ChunkKind::File, text);
    }

    info!(
        "Built corpus of {} chunks ({} tables, {} relations, {} terms, {} files)",
        corpus.len(),
        corpus.count_kind(ChunkKind::Table),
        corpus.count_kind(ChunkKind::Relation),
        corpus.count_kind(ChunkKind::Term),
        corpus.count_kind(ChunkKind::File)
    );
    Ok(corpus)
}

/// Read every matching file under `dir`, each prefixed with its base name
///
/// A missing directory contributes nothing.
#[inline]
pub fn load_text_files(dir: &Path, extensions: &[String]) -> Result<Vec<String>> {
    if !dir.is_dir() {
        warn!("Text directory {} not found, skipping", dir.display());
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            RagError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other(format!("Failed to walk {}", dir.display()))
            }))
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut texts = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!("Reading text file {}", path.display());
        let content = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        texts.push(format!("-- File {}\n{}", name, content));
    }

    Ok(texts)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}
