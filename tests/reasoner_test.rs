use anyhow::Result;
use quadstore::rdf::{
    log, rdf, rdfs, rules_from_store, NamedNode, Quad, QuadPattern, QuadStore, RdfFormat,
    RdfParser, RdfsReasoner, ReasonError, Reasoner, Rule, RuleError, Term, Variable,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn iri(iri: &str) -> Term {
    NamedNode::new(iri).unwrap().into()
}

fn ex(local: &str) -> Term {
    iri(&format!("http://example.org/{local}"))
}

fn var(name: &str) -> Term {
    Variable::new(name).unwrap().into()
}

fn type_inheritance() -> Rule {
    Rule::new(
        vec![
            QuadPattern::new(var("s"), iri(rdf::TYPE), var("o")),
            QuadPattern::new(var("o"), iri(rdfs::SUB_CLASS_OF), var("o2")),
        ],
        vec![QuadPattern::new(var("s"), iri(rdf::TYPE), var("o2"))],
    )
}

#[test]
fn test_transitive_type_inference() -> Result<()> {
    init_tracing();
    let mut store = QuadStore::new();
    store.add(&Quad::triple(ex("s"), iri(rdf::TYPE), ex("o")));
    store.add(&Quad::triple(ex("o"), iri(rdfs::SUB_CLASS_OF), ex("o2")));

    Reasoner::new(&mut store).reason(&[type_inheritance()])?;

    assert_eq!(store.size(), 3);
    assert!(store.has(&Quad::triple(ex("s"), iri(rdf::TYPE), ex("o2"))));
    Ok(())
}

#[test]
fn test_reasoning_is_idempotent() -> Result<()> {
    init_tracing();
    let mut store = QuadStore::new();
    for i in 0..20 {
        store.add(&Quad::triple(
            ex(&format!("c{i}")),
            iri(rdfs::SUB_CLASS_OF),
            ex(&format!("c{}", i + 1)),
        ));
        store.add(&Quad::triple(ex(&format!("x{i}")), iri(rdf::TYPE), ex(&format!("c{i}"))));
    }
    let reasoner = RdfsReasoner::new();

    let first = reasoner.reason(&mut store)?;
    let size = store.size();
    let second = reasoner.reason(&mut store)?;

    assert!(first.derived > 0);
    assert_eq!(second.derived, 0);
    assert_eq!(store.size(), size);
    // x0 is typed with all 21 classes
    assert_eq!(store.count_quads(Some(&ex("x0")), Some(&iri(rdf::TYPE)), None, None), 21);
    Ok(())
}

#[test]
fn test_rules_read_from_trig() -> Result<()> {
    init_tracing();
    let input = r#"
        @prefix ex: <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .

        ex:alice ex:parent ex:bob .
        ex:bob ex:parent ex:carol .
        ex:premise log:implies ex:conclusion .
    "#;
    let mut store = QuadStore::new();
    RdfParser::load(&mut store, input, RdfFormat::TriG, None)?;

    // variables cannot be written in TriG, so the formulas are added directly
    let premise = ex("premise");
    let conclusion = ex("conclusion");
    store.add(&Quad::new(var("x"), ex("parent"), var("y"), premise.clone()));
    store.add(&Quad::new(var("y"), ex("parent"), var("z"), premise));
    store.add(&Quad::new(var("x"), ex("grandparent"), var("z"), conclusion));

    let rules = rules_from_store(&store);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].premise.len(), 2);

    let stats = Reasoner::new(&mut store).reason_in_graph(&rules, &Term::DefaultGraph)?;

    assert_eq!(stats.derived, 1);
    assert!(store.has(&Quad::triple(ex("alice"), ex("grandparent"), ex("carol"))));
    assert!(store.has(&Quad::triple(ex("premise"), iri(log::IMPLIES), ex("conclusion"))));
    Ok(())
}

#[test]
fn test_cyclic_rules_terminate() -> Result<()> {
    init_tracing();
    let symmetric = Rule::new(
        vec![QuadPattern::new(var("a"), ex("knows"), var("b"))],
        vec![QuadPattern::new(var("b"), ex("knows"), var("a"))],
    );
    let transitive = Rule::new(
        vec![
            QuadPattern::new(var("a"), ex("knows"), var("b")),
            QuadPattern::new(var("b"), ex("knows"), var("c")),
        ],
        vec![QuadPattern::new(var("a"), ex("knows"), var("c"))],
    );

    let mut store = QuadStore::new();
    for (a, b) in [("p1", "p2"), ("p2", "p3"), ("p3", "p4")] {
        store.add(&Quad::triple(ex(a), ex("knows"), ex(b)));
    }
    Reasoner::new(&mut store).reason(&[symmetric, transitive])?;

    // everyone knows everyone, themselves included
    assert_eq!(store.size(), 16);
    Ok(())
}

#[test]
fn test_invalid_rules_fail_fast() {
    let mut store = QuadStore::new();
    store.add(&Quad::triple(ex("a"), ex("p"), ex("b")));

    let empty = Rule::new(vec![], vec![QuadPattern::new(ex("a"), ex("p"), ex("c"))]);
    let err = Reasoner::new(&mut store).reason(&[empty]).unwrap_err();
    assert_eq!(err, ReasonError::InvalidRule(RuleError::EmptyPremise { rule: 0 }));

    let unbound = Rule::new(
        vec![QuadPattern::new(var("x"), ex("p"), var("y"))],
        vec![QuadPattern::new(var("x"), ex("q"), var("z"))],
    );
    let err = Reasoner::new(&mut store).reason(&[unbound]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid rule: Rule 0 concludes with ?z, which its premise never binds"
    );
    assert_eq!(store.size(), 1);
}
