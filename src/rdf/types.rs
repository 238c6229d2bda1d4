//! RDF type definitions
//!
//! Terms wrap the oxrdf primitives so that IRIs, blank node labels, language
//! tags and variable names are validated once, on construction. Every term
//! has a canonical string id (see [`Term::to_id`]) which is what the store
//! interns.

use oxrdf::{
    BlankNode as OxBlankNode, Literal as OxLiteral, NamedNode as OxNamedNode,
    Variable as OxVariable,
};
use std::fmt;
use thiserror::Error;

use super::namespace::xsd;

/// RDF errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdfError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    /// Invalid variable name
    #[error("Invalid variable: {0}")]
    InvalidVariable(String),

    /// Canonical id that does not decode to a term
    #[error("Invalid term id: {0}")]
    InvalidId(String),
}

pub type RdfResult<T> = Result<T, RdfError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: &str) -> RdfResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| RdfError::InvalidIri(format!("{iri}: {e}")))
    }

    /// Create a named node without validating the IRI
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self(OxNamedNode::new_unchecked(iri))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a blank node from its label (without the `_:` prefix)
    pub fn new(label: &str) -> RdfResult<Self> {
        OxBlankNode::new(label)
            .map(Self)
            .map_err(|e| RdfError::InvalidBlankNode(format!("{label}: {e}")))
    }

    /// Create a blank node without validating the label
    pub fn new_unchecked(label: impl Into<String>) -> Self {
        Self(OxBlankNode::new_unchecked(label))
    }

    /// Get the blank node label
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

/// RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (plain string)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a literal with language tag
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> RdfResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| RdfError::InvalidLiteral(e.to_string()))
    }

    /// Create a typed literal
    pub fn new_typed_literal(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.0))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }

    fn write_id(&self, out: &mut String, nested: bool) {
        out.push('"');
        if nested {
            out.push_str(&self.value().replace('"', "\"\""));
        } else {
            out.push_str(self.value());
        }
        out.push('"');
        if let Some(lang) = self.language() {
            out.push('@');
            out.push_str(&lang.to_ascii_lowercase());
        } else {
            let datatype = self.0.datatype();
            if datatype.as_str() != xsd::STRING {
                out.push_str("^^");
                out.push_str(datatype.as_str());
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.value().chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                c => write!(f, "{c}")?,
            }
        }
        f.write_str("\"")?;
        if let Some(lang) = self.language() {
            write!(f, "@{lang}")
        } else if self.0.datatype().as_str() == xsd::STRING {
            Ok(())
        } else {
            write!(f, "^^{}", self.datatype())
        }
    }
}

/// Query or rule variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(OxVariable);

impl Variable {
    /// Create a variable from its name (without the `?` prefix)
    pub fn new(name: &str) -> RdfResult<Self> {
        OxVariable::new(name)
            .map(Self)
            .map_err(|e| RdfError::InvalidVariable(format!("{name}: {e}")))
    }

    /// Create a variable without validating the name
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(OxVariable::new_unchecked(name))
    }

    /// Get the variable name
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.as_str())
    }
}

/// RDF term (any value that can sit in a quad position)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
    /// Variable (rule and formula patterns)
    Variable(Variable),
    /// The default graph marker
    DefaultGraph,
    /// A quoted quad
    Quad(Box<Quad>),
}

impl Term {
    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, Term::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Check if this is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this is the default graph
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Term::DefaultGraph)
    }

    /// The canonical string id of this term.
    ///
    /// IRIs are kept as-is, blank nodes become `_:label`, variables `?name`,
    /// literals `"value"` followed by `@lang` or `^^datatype` (the
    /// `xsd:string` datatype is omitted), and the default graph is the empty
    /// string. Quoted quads encode as `<<s p o>>` or `<<s p o g>>`.
    pub fn to_id(&self) -> String {
        let mut out = String::new();
        self.write_id(&mut out, false);
        out
    }

    fn write_id(&self, out: &mut String, nested: bool) {
        match self {
            Term::NamedNode(n) => out.push_str(n.as_str()),
            Term::BlankNode(b) => {
                out.push_str("_:");
                out.push_str(b.as_str());
            }
            Term::Literal(l) => l.write_id(out, nested),
            Term::Variable(v) => {
                out.push('?');
                out.push_str(v.as_str());
            }
            Term::DefaultGraph => {}
            Term::Quad(q) => {
                out.push_str("<<");
                q.subject.write_id(out, true);
                out.push(' ');
                q.predicate.write_id(out, true);
                out.push(' ');
                q.object.write_id(out, true);
                if !q.graph.is_default_graph() {
                    out.push(' ');
                    q.graph.write_id(out, true);
                }
                out.push_str(">>");
            }
        }
    }

    /// Decode a canonical id produced by [`Term::to_id`].
    pub fn from_id(id: &str) -> RdfResult<Term> {
        Self::decode(id, false)
    }

    fn decode(id: &str, nested: bool) -> RdfResult<Term> {
        if id.is_empty() {
            return Ok(Term::DefaultGraph);
        }
        if let Some(label) = id.strip_prefix("_:") {
            return BlankNode::new(label).map(Term::BlankNode);
        }
        if let Some(name) = id.strip_prefix('?') {
            return Variable::new(name).map(Term::Variable);
        }
        if id.starts_with('"') {
            return decode_literal(id, nested).map(Term::Literal);
        }
        if let Some(inner) = id.strip_prefix("<<").and_then(|s| s.strip_suffix(">>")) {
            let parts = split_quad_id(inner).ok_or_else(|| RdfError::InvalidId(id.to_string()))?;
            let mut terms = parts
                .into_iter()
                .map(|part| Self::decode(part, true))
                .collect::<RdfResult<Vec<_>>>()?;
            let graph = match terms.len() {
                3 => Term::DefaultGraph,
                4 => terms.pop().unwrap_or(Term::DefaultGraph),
                _ => return Err(RdfError::InvalidId(id.to_string())),
            };
            let object = terms.pop();
            let predicate = terms.pop();
            let subject = terms.pop();
            return match (subject, predicate, object) {
                (Some(s), Some(p), Some(o)) => Ok(Term::Quad(Box::new(Quad::new(s, p, o, graph)))),
                _ => Err(RdfError::InvalidId(id.to_string())),
            };
        }
        NamedNode::new(id).map(Term::NamedNode)
    }
}

fn decode_literal(id: &str, nested: bool) -> RdfResult<Literal> {
    let end = id
        .rfind('"')
        .filter(|&end| end > 0)
        .ok_or_else(|| RdfError::InvalidId(id.to_string()))?;
    let raw = &id[1..end];
    let value = if nested { raw.replace("\"\"", "\"") } else { raw.to_string() };
    let suffix = &id[end + 1..];
    if suffix.is_empty() {
        Ok(Literal::new_simple_literal(value))
    } else if let Some(lang) = suffix.strip_prefix('@') {
        Literal::new_language_tagged_literal(value, lang)
    } else if let Some(datatype) = suffix.strip_prefix("^^") {
        Ok(Literal::new_typed_literal(value, NamedNode::new(datatype)?))
    } else {
        Err(RdfError::InvalidId(id.to_string()))
    }
}

/// Split the inside of a quoted quad id into its top-level components.
fn split_quad_id(inner: &str) -> Option<Vec<&str>> {
    let bytes = inner.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut depth = 0usize;
    let mut in_literal = false;
    let mut token_start = true;

    while i < bytes.len() {
        let b = bytes[i];
        let at_start = std::mem::replace(&mut token_start, false);
        if in_literal {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_literal = false;
                }
            }
        } else if b == b'"' && at_start {
            in_literal = true;
        } else if bytes[i..].starts_with(b"<<") {
            depth += 1;
            token_start = true;
            i += 1;
        } else if bytes[i..].starts_with(b">>") {
            depth = depth.checked_sub(1)?;
            i += 1;
        } else if b == b' ' {
            token_start = true;
            if depth == 0 {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
        }
        i += 1;
    }
    if in_literal || depth != 0 {
        return None;
    }
    parts.push(&inner[start..]);
    Some(parts)
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => write!(f, "{n}"),
            Term::BlankNode(b) => write!(f, "{b}"),
            Term::Literal(l) => write!(f, "{l}"),
            Term::Variable(v) => write!(f, "{v}"),
            Term::DefaultGraph => f.write_str("DEFAULT"),
            Term::Quad(q) => {
                write!(f, "<< {} {} {}", q.subject, q.predicate, q.object)?;
                if !q.graph.is_default_graph() {
                    write!(f, " {}", q.graph)?;
                }
                f.write_str(" >>")
            }
        }
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Variable(var)
    }
}

impl From<Quad> for Term {
    fn from(quad: Quad) -> Self {
        Term::Quad(Box::new(quad))
    }
}

/// RDF quad (subject, predicate, object, graph)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    /// Subject
    pub subject: Term,
    /// Predicate
    pub predicate: Term,
    /// Object
    pub object: Term,
    /// Graph ([`Term::DefaultGraph`] for plain triples)
    pub graph: Term,
}

impl Quad {
    /// Create a new quad
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Create a quad in the default graph
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self::new(subject, predicate, object, Term::DefaultGraph)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graph.is_default_graph() {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        } else {
            write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, self.graph
            )
        }
    }
}
