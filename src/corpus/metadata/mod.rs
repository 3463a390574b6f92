// Typed metadata documents
// Each YAML document is parsed into explicit records so that a missing key fails at the parse boundary


use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::{RagError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TablesDocument {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationsDocument {
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationDefinition {
    pub from_table: String,
    pub to_table: String,
    pub join_condition: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainDocument {
    pub domain: DomainDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainDefinition {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlossaryDocument {
    #[serde(default)]
    pub terms: Vec<GlossaryTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

impl TableDefinition {
    /// Header line plus one bullet per field
    #[inline]
    pub fn to_chunk_text(&self) -> String {
        let mut text = format!("Table {}: {}\n", self.name, self.description);
        for field in &self.fields {
            let _ = writeln!(
                text,
                "- {} ({}): {}",
                field.name, field.field_type, field.description
            );
        }
        text
    }
}

impl RelationDefinition {
    #[inline]
    pub fn to_chunk_text(&self) -> String {
        format!(
            "Relation: {} -> {} on {} ({})",
            self.from_table, self.to_table, self.join_condition, self.relation_type
        )
    }
}

impl DomainDefinition {
    #[inline]
    pub fn to_chunk_text(&self) -> String {
        format!("Domain: {} - {}", self.name, self.description)
    }
}

impl GlossaryTerm {
    #[inline]
    pub fn to_chunk_text(&self) -> String {
        format!("Term {}: {}", self.term, self.definition)
    }
}

/// Read and parse a YAML document into `T`
///
/// A missing file maps to [`RagError::FileNotFound`] and a document that does not
/// match `T` maps to [`RagError::Schema`].
#[inline]
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading metadata document {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            RagError::FileNotFound(path.to_path_buf())
        } else {
            RagError::Io(e)
        }
    })?;

    parse_document(path, &content)
}

/// Parse YAML text, attributing schema errors to `path`
#[inline]
pub fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    // Treat an empty file as an empty mapping
    let content = if content.trim().is_empty() { "{}" } else { content };

    serde_yaml::from_str(content).map_err(|e| RagError::Schema {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
