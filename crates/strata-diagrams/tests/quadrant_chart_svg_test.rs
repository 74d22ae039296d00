use strata_diagrams::quadrant_chart::{self, Db};
use strata_diagrams::{Config, RenderOptions, Theme, render_svg};

const CAMPAIGNS: &str = "quadrantChart
title Reach and engagement of campaigns
x-axis Low Reach --> High Reach
y-axis Low Engagement --> High Engagement
quadrant-1 We should expand
quadrant-2 Need to promote
quadrant-3 Re-evaluate
quadrant-4 May be improved
Campaign A: [0.3, 0.6]
Campaign B: [0.45, 0.23]
Campaign C: [0.57, 0.69] radius: 10, color: #ff3300
";

#[test]
fn points_keep_source_order_and_scale_into_the_plot() {
    let mut db = Db::new();
    quadrant_chart::parse_into(CAMPAIGNS, &mut db).expect("parse ok");
    let names: Vec<&str> = db.points().iter().map(|p| p.text.as_str()).collect();
    assert_eq!(names, vec!["Campaign A", "Campaign B", "Campaign C"]);
    assert_eq!(db.quadrant_text(2), "Need to promote");

    let layout = quadrant_chart::layout(&db, &Config::default(), &Theme::default());
    let a = &layout.points[0];
    let b = &layout.points[1];
    assert!(a.x < b.x);
    assert!(a.y < b.y, "higher engagement is drawn higher up");
    assert_eq!(layout.points[2].radius, 10.0);
    assert_eq!(layout.points[2].fill, "#ff3300");
}

#[test]
fn renders_a_well_formed_document() {
    let svg = render_svg(CAMPAIGNS, &RenderOptions::default()).expect("render ok");
    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    assert_eq!(doc.root_element().attribute("class"), Some("quadrantChart"));
    assert_eq!(doc.descendants().filter(|n| n.has_tag_name("circle")).count(), 3);
    assert!(
        doc.descendants()
            .any(|n| n.text() == Some("Reach and engagement of campaigns"))
    );
}

#[test]
fn out_of_range_point_reports_its_line() {
    let err = render_svg(
        "quadrantChart\ntitle T\nToo far: [1.2, 0.5]\n",
        &RenderOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.message(),
        Some("invalid point coordinate [1.2, 0.5]: values must be between 0 and 1")
    );
    assert_eq!(err.hash().map(|h| h.line), Some(3));
}
