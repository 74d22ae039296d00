use strata_diagrams::requirement::{self, Db, RelationshipKind, Risk};
use strata_diagrams::{RenderOptions, render_svg};

const SYSTEM: &str = "requirementDiagram
requirement test_req {
  id: 1
  text: the test text.
  risk: high
  verifymethod: test
}
functionalRequirement test_req2 {
  id: 1.1
  text: the second test text.
  risk: low
  verifymethod: inspection
}
element test_entity {
  type: simulation
}
test_entity - satisfies -> test_req2
test_req - contains -> test_req2
";

fn class_count(doc: &roxmltree::Document<'_>, class: &str) -> usize {
    doc.descendants()
        .filter(|n| {
            n.attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|t| t == class))
        })
        .count()
}

#[test]
fn chain_populates_the_database() {
    let mut db = Db::new();
    requirement::parse_into(SYSTEM, &mut db).expect("parse ok");

    assert_eq!(db.requirements().count(), 2);
    let second = db.requirement("test_req2").expect("declared");
    assert_eq!(second.requirement_id, "1.1");
    assert_eq!(second.risk, Some(Risk::Low));
    assert_eq!(db.element("test_entity").map(|e| e.element_type.as_str()), Some("simulation"));

    let kinds: Vec<RelationshipKind> = db.relationships().iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RelationshipKind::Satisfies, RelationshipKind::Contains]);
}

#[test]
fn chain_renders_boxes_and_relationships() {
    let svg = render_svg(SYSTEM, &RenderOptions::default()).expect("render ok");
    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    assert_eq!(doc.root_element().attribute("class"), Some("requirement"));
    assert_eq!(class_count(&doc, "requirementBox"), 3);
    assert_eq!(class_count(&doc, "relationshipLine"), 2);
    assert!(doc.descendants().any(|n| n.text() == Some("<<contains>>")));
    assert!(
        doc.descendants()
            .any(|n| n.attribute("id") == Some("requirement-contains"))
    );
}

#[test]
fn unknown_relationship_is_a_parse_error() {
    let err = render_svg(
        "requirementDiagram\na - owns -> b\n",
        &RenderOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.message(), Some("unknown relationship type: owns"));
}
