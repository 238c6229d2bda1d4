//! RDF serialization formats
//!
//! Supports:
//! - Turtle (TTL)
//! - TriG
//! - N-Triples (NT)
//! - N-Quads (NQ)

mod turtle;

use super::{QuadStore, Quad, RdfError};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// N-Triples format (.nt)
    NTriples,
    /// N-Quads format (.nq)
    NQuads,
    /// TriG format (.trig)
    TriG,
}

impl RdfFormat {
    /// Guess the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ttl" => Some(RdfFormat::Turtle),
            "nt" => Some(RdfFormat::NTriples),
            "nq" => Some(RdfFormat::NQuads),
            "trig" => Some(RdfFormat::TriG),
            _ => None,
        }
    }

    /// Guess the format from a file path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the format can carry named graphs
    pub fn supports_graphs(self) -> bool {
        matches!(self, RdfFormat::NQuads | RdfFormat::TriG)
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error reported by the parser
    #[error("Parse error: {0}")]
    Syntax(#[from] rio_turtle::TurtleError),

    /// Base IRI is not absolute
    #[error("Invalid base IRI: {0}")]
    InvalidBaseIri(String),

    /// A parsed term was rejected
    #[error("Invalid term: {0}")]
    Term(#[from] RdfError),

    /// No format is known for the file extension
    #[error("Unknown RDF format for {0}")]
    UnknownFormat(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Term cannot be written in this position
    #[error("Cannot serialize {0}")]
    Unsupported(String),

    /// Triple formats have no named graphs
    #[error("Quad in named graph {0} cannot be written as a triple")]
    NamedGraphInTripleFormat(String),

    /// No format is known for the file extension
    #[error("Unknown RDF format for {0}")]
    UnknownFormat(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// RDF parser
pub struct RdfParser;

impl RdfParser {
    /// Parse RDF data from a string. Relative IRIs resolve against
    /// `base_iri` in Turtle and TriG.
    pub fn parse(input: &str, format: RdfFormat, base_iri: Option<&str>) -> ParseResult<Vec<Quad>> {
        let quads = turtle::parse(input, format, base_iri)?;
        debug!("Parsed {} quads as {:?}", quads.len(), format);
        Ok(quads)
    }

    /// Parse RDF data from a file
    pub fn parse_file(path: &Path, format: RdfFormat, base_iri: Option<&str>) -> ParseResult<Vec<Quad>> {
        let input = std::fs::read_to_string(path)?;
        Self::parse(&input, format, base_iri)
    }

    /// Parse a file into a store, picking the format from its extension
    pub fn load_file(store: &mut QuadStore, path: &Path, base_iri: Option<&str>) -> ParseResult<usize> {
        let format = RdfFormat::from_path(path)
            .ok_or_else(|| ParseError::UnknownFormat(path.display().to_string()))?;
        let quads = Self::parse_file(path, format, base_iri)?;
        Ok(store.add_quads(quads))
    }

    /// Parse RDF data into a store, returning how many quads were new
    pub fn load(
        store: &mut QuadStore,
        input: &str,
        format: RdfFormat,
        base_iri: Option<&str>,
    ) -> ParseResult<usize> {
        let quads = Self::parse(input, format, base_iri)?;
        Ok(store.add_quads(quads))
    }
}

/// RDF serializer
pub struct RdfSerializer;

impl RdfSerializer {
    /// Serialize quads to a string
    pub fn serialize(quads: &[Quad], format: RdfFormat) -> SerializeResult<String> {
        if !format.supports_graphs() {
            if let Some(quad) = quads.iter().find(|quad| !quad.graph.is_default_graph()) {
                return Err(SerializeError::NamedGraphInTripleFormat(quad.graph.to_string()));
            }
        }
        turtle::serialize(quads, format)
    }

    /// Serialize every quad of a store to a string
    pub fn serialize_store(store: &QuadStore, format: RdfFormat) -> SerializeResult<String> {
        let quads: Vec<Quad> = store.iter().collect();
        Self::serialize(&quads, format)
    }

    /// Serialize quads to a file
    pub fn serialize_file(quads: &[Quad], path: &Path, format: RdfFormat) -> SerializeResult<()> {
        let output = Self::serialize(quads, format)?;
        std::fs::write(path, output)?;
        Ok(())
    }

    /// Write every quad of a store to a file, picking the format from its
    /// extension
    pub fn save_file(store: &QuadStore, path: &Path) -> SerializeResult<()> {
        let format = RdfFormat::from_path(path)
            .ok_or_else(|| SerializeError::UnknownFormat(path.display().to_string()))?;
        let quads: Vec<Quad> = store.iter().collect();
        Self::serialize_file(&quads, path, format)
    }
}
