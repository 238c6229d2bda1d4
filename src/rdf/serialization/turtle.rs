//! Turtle-family formats (Turtle, TriG, N-Triples, N-Quads) through rio

use crate::rdf::namespace::xsd;
use crate::rdf::{BlankNode, Literal, NamedNode, Quad, Term};
use super::{ParseError, ParseResult, RdfFormat, SerializeError, SerializeResult};
use oxiri::Iri;
use rio_api::formatter::{QuadsFormatter, TriplesFormatter};
use rio_api::model::{
    BlankNode as RioBlankNode, GraphName, Literal as RioLiteral, NamedNode as RioNamedNode,
    Quad as RioQuad, Subject, Term as RioTerm, Triple as RioTriple,
};
use rio_api::parser::{QuadsParser, TriplesParser};
use rio_turtle::{
    NQuadsParser, NTriplesParser, TriGFormatter, TriGParser, TurtleFormatter, TurtleParser,
};
use std::fmt::Write;

/// Parse a document into quads
pub(super) fn parse(input: &str, format: RdfFormat, base_iri: Option<&str>) -> ParseResult<Vec<Quad>> {
    let base = base_iri
        .map(|iri| Iri::parse(iri.to_string()).map_err(|e| ParseError::InvalidBaseIri(e.to_string())))
        .transpose()?;

    let mut quads = Vec::new();
    let reader = input.as_bytes();
    match format {
        RdfFormat::Turtle => TurtleParser::new(reader, base).parse_all(&mut |t| -> ParseResult<()> {
            quads.push(convert_triple(&t)?);
            Ok(())
        })?,
        RdfFormat::NTriples => NTriplesParser::new(reader).parse_all(&mut |t| -> ParseResult<()> {
            quads.push(convert_triple(&t)?);
            Ok(())
        })?,
        RdfFormat::TriG => TriGParser::new(reader, base).parse_all(&mut |q| -> ParseResult<()> {
            quads.push(convert_quad(&q)?);
            Ok(())
        })?,
        RdfFormat::NQuads => NQuadsParser::new(reader).parse_all(&mut |q| -> ParseResult<()> {
            quads.push(convert_quad(&q)?);
            Ok(())
        })?,
    }
    Ok(quads)
}

/// Serialize quads into a document
pub(super) fn serialize(quads: &[Quad], format: RdfFormat) -> SerializeResult<String> {
    match format {
        RdfFormat::NTriples => {
            let mut output = String::new();
            for quad in quads {
                with_rio_triple(quad, true, &mut |triple| {
                    writeln!(output, "{triple} .").map_err(|e| SerializeError::Serialize(e.to_string()))
                })?;
            }
            Ok(output)
        }
        RdfFormat::NQuads => {
            let mut output = String::new();
            for quad in quads {
                with_rio_quad(quad, &mut |quad| {
                    writeln!(output, "{quad} .").map_err(|e| SerializeError::Serialize(e.to_string()))
                })?;
            }
            Ok(output)
        }
        RdfFormat::Turtle => {
            let mut formatter = TurtleFormatter::new(Vec::new());
            for quad in quads {
                with_rio_triple(quad, true, &mut |triple| Ok(formatter.format(&triple)?))?;
            }
            into_string(formatter.finish()?)
        }
        RdfFormat::TriG => {
            let mut formatter = TriGFormatter::new(Vec::new());
            for quad in quads {
                with_rio_quad(quad, &mut |quad| Ok(formatter.format(&quad)?))?;
            }
            into_string(formatter.finish()?)
        }
    }
}

fn into_string(bytes: Vec<u8>) -> SerializeResult<String> {
    String::from_utf8(bytes).map_err(|e| SerializeError::Serialize(e.to_string()))
}

fn convert_triple(t: &RioTriple<'_>) -> ParseResult<Quad> {
    Ok(Quad::triple(
        convert_subject(t.subject)?,
        NamedNode::new(t.predicate.iri)?.into(),
        convert_object(t.object)?,
    ))
}

fn convert_quad(q: &RioQuad<'_>) -> ParseResult<Quad> {
    let graph = match q.graph_name {
        None => Term::DefaultGraph,
        Some(GraphName::NamedNode(n)) => NamedNode::new(n.iri)?.into(),
        Some(GraphName::BlankNode(b)) => BlankNode::new(b.id)?.into(),
    };
    Ok(Quad::new(
        convert_subject(q.subject)?,
        NamedNode::new(q.predicate.iri)?.into(),
        convert_object(q.object)?,
        graph,
    ))
}

fn convert_subject(s: Subject<'_>) -> ParseResult<Term> {
    Ok(match s {
        Subject::NamedNode(n) => NamedNode::new(n.iri)?.into(),
        Subject::BlankNode(b) => BlankNode::new(b.id)?.into(),
        Subject::Triple(t) => convert_triple(t)?.into(),
    })
}

fn convert_object(o: RioTerm<'_>) -> ParseResult<Term> {
    Ok(match o {
        RioTerm::NamedNode(n) => NamedNode::new(n.iri)?.into(),
        RioTerm::BlankNode(b) => BlankNode::new(b.id)?.into(),
        RioTerm::Literal(RioLiteral::Simple { value }) => Literal::new_simple_literal(value).into(),
        RioTerm::Literal(RioLiteral::LanguageTaggedString { value, language }) => {
            Literal::new_language_tagged_literal(value, language)?.into()
        }
        RioTerm::Literal(RioLiteral::Typed { value, datatype }) => {
            Literal::new_typed_literal(value, NamedNode::new(datatype.iri)?).into()
        }
        RioTerm::Triple(t) => convert_triple(t)?.into(),
    })
}

fn unsupported(term: &Term, position: &str) -> SerializeError {
    SerializeError::Unsupported(format!("{term} as {position}"))
}

fn rio_named_node<'a>(term: &'a Term, position: &str) -> SerializeResult<RioNamedNode<'a>> {
    match term {
        Term::NamedNode(n) => Ok(RioNamedNode { iri: n.as_str() }),
        other => Err(unsupported(other, position)),
    }
}

fn with_rio_subject(
    term: &Term,
    f: &mut dyn FnMut(Subject<'_>) -> SerializeResult<()>,
) -> SerializeResult<()> {
    match term {
        Term::NamedNode(n) => f(Subject::NamedNode(RioNamedNode { iri: n.as_str() })),
        Term::BlankNode(b) => f(Subject::BlankNode(RioBlankNode { id: b.as_str() })),
        Term::Quad(quad) => with_rio_triple(quad, false, &mut |triple| f(Subject::Triple(&triple))),
        other => Err(unsupported(other, "subject")),
    }
}

fn with_rio_object(
    term: &Term,
    f: &mut dyn FnMut(RioTerm<'_>) -> SerializeResult<()>,
) -> SerializeResult<()> {
    match term {
        Term::NamedNode(n) => f(RioTerm::NamedNode(RioNamedNode { iri: n.as_str() })),
        Term::BlankNode(b) => f(RioTerm::BlankNode(RioBlankNode { id: b.as_str() })),
        Term::Literal(l) => {
            let datatype = l.datatype();
            let literal = match l.language() {
                Some(language) => RioLiteral::LanguageTaggedString {
                    value: l.value(),
                    language,
                },
                None if datatype.as_str() == xsd::STRING => RioLiteral::Simple { value: l.value() },
                None => RioLiteral::Typed {
                    value: l.value(),
                    datatype: RioNamedNode {
                        iri: datatype.as_str(),
                    },
                },
            };
            f(RioTerm::Literal(literal))
        }
        Term::Quad(quad) => with_rio_triple(quad, false, &mut |triple| f(RioTerm::Triple(&triple))),
        other => Err(unsupported(other, "object")),
    }
}

/// Hand the triple part of a quad to `f`. Top-level quads in a named graph
/// are rejected for triple formats; quoted quads must be in the default
/// graph because rio triples carry no graph.
fn with_rio_triple(
    quad: &Quad,
    top_level: bool,
    f: &mut dyn FnMut(RioTriple<'_>) -> SerializeResult<()>,
) -> SerializeResult<()> {
    if !quad.graph.is_default_graph() {
        return Err(if top_level {
            SerializeError::NamedGraphInTripleFormat(quad.graph.to_string())
        } else {
            unsupported(&quad.graph, "graph of a quoted triple")
        });
    }
    let predicate = rio_named_node(&quad.predicate, "predicate")?;
    with_rio_subject(&quad.subject, &mut |subject| {
        with_rio_object(&quad.object, &mut |object| {
            f(RioTriple {
                subject,
                predicate,
                object,
            })
        })
    })
}

fn with_rio_quad(
    quad: &Quad,
    f: &mut dyn FnMut(RioQuad<'_>) -> SerializeResult<()>,
) -> SerializeResult<()> {
    let graph_name = match &quad.graph {
        Term::DefaultGraph => None,
        Term::NamedNode(n) => Some(GraphName::NamedNode(RioNamedNode { iri: n.as_str() })),
        Term::BlankNode(b) => Some(GraphName::BlankNode(RioBlankNode { id: b.as_str() })),
        other => return Err(unsupported(other, "graph")),
    };
    let predicate = rio_named_node(&quad.predicate, "predicate")?;
    with_rio_subject(&quad.subject, &mut |subject| {
        with_rio_object(&quad.object, &mut |object| {
            f(RioQuad {
                subject,
                predicate,
                object,
                graph_name,
            })
        })
    })
}
