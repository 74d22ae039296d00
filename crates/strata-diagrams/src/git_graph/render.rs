use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use strata::Point;
use tracing::{debug, warn};

use super::{Commit, CommitType, DIAGRAM_TYPE, Db, Direction};
use crate::svg::{self, Bounds, Element, fmt};
use crate::text::{TextMeasurer, TextMetrics, TextStyle};
use crate::{Config, Result, Theme};

const LAYOUT_OFFSET: f64 = 10.0;
const COMMIT_STEP: f64 = 40.0;
const DEFAULT_POS: f64 = 30.0;
const COMMIT_RADIUS: f64 = 10.0;
const MERGE_RADIUS: f64 = 9.0;

#[derive(Debug, Clone, Copy)]
struct Options {
    rotate_commit_label: bool,
    show_commit_label: bool,
    show_branches: bool,
    parallel_commits: bool,
    diagram_padding: f64,
}

impl Options {
    fn from_config(config: &Config) -> Self {
        Self {
            rotate_commit_label: config.bool_or("gitGraph.rotateCommitLabel", true),
            show_commit_label: config.bool_or("gitGraph.showCommitLabel", true),
            show_branches: config.bool_or("gitGraph.showBranches", true),
            parallel_commits: config.bool_or("gitGraph.parallelCommits", false),
            diagram_padding: config.f64_or("gitGraph.diagramPadding", 8.0).max(0.0),
        }
    }
}

#[derive(Debug, Clone)]
struct Lane {
    name: String,
    index: usize,
    pos: f64,
    label: TextMetrics,
}

#[derive(Debug, Clone)]
struct Layout {
    direction: Direction,
    lanes: Vec<Lane>,
    positions: FxHashMap<String, Point>,
    /// Extent of the commit axis: x for LR, y for TB/BT.
    max_pos: f64,
}

impl Layout {
    fn lane_index(&self, branch: &str) -> usize {
        self.lanes
            .iter()
            .find(|l| l.name == branch)
            .map(|l| l.index)
            .unwrap_or(0)
    }
}

fn branch_label_style(theme: &Theme) -> TextStyle {
    TextStyle {
        font_family: Some(theme.font_family.clone()),
        font_size: theme.font_size,
        font_weight: None,
    }
}

/// Places branch lanes across the diagram and commits along them.
fn layout(db: &Db, opts: Options, theme: &Theme, measurer: &dyn TextMeasurer) -> Layout {
    let direction = db.direction();
    let vertical = direction.is_vertical();
    let label_style = branch_label_style(theme);

    let mut lanes = Vec::new();
    let mut pos = 0.0;
    for (index, branch) in db.branches().into_iter().enumerate() {
        let label = measurer.measure(&branch.name, &label_style);
        lanes.push(Lane {
            name: branch.name.clone(),
            index,
            pos,
            label,
        });
        pos += 50.0
            + if opts.rotate_commit_label { 40.0 } else { 0.0 }
            + if vertical { label.width / 2.0 } else { 0.0 };
    }
    let lane_pos: FxHashMap<&str, f64> = lanes.iter().map(|l| (l.name.as_str(), l.pos)).collect();

    // BT is laid out as TB and mirrored afterwards.
    let start = if vertical { DEFAULT_POS } else { 0.0 };
    let mut positions: FxHashMap<String, Point> = FxHashMap::default();
    let mut cur = start;
    let mut max_pos: f64 = 0.0;
    for commit in db.commits() {
        if opts.parallel_commits {
            if commit.parents.is_empty() {
                cur = start;
            } else if let Some(parent) = closest_parent(commit, &positions, vertical) {
                cur = parent + COMMIT_STEP;
            }
        }
        let Some(&lane) = lane_pos.get(commit.branch.as_str()) else {
            warn!(commit = %commit.id, branch = %commit.branch, "commit on unknown branch");
            continue;
        };
        let along = cur + LAYOUT_OFFSET;
        let point = if vertical {
            Point::new(lane, along)
        } else {
            Point::new(along, lane)
        };
        positions.insert(commit.id.clone(), point);
        cur += COMMIT_STEP + LAYOUT_OFFSET;
        max_pos = max_pos.max(cur);
    }

    if direction == Direction::BT {
        let (lo, hi) = positions
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        for p in positions.values_mut() {
            p.y = lo + hi - p.y;
        }
    }

    debug!(
        branches = lanes.len(),
        commits = positions.len(),
        max_pos,
        "laid out git graph"
    );
    Layout {
        direction,
        lanes,
        positions,
        max_pos,
    }
}

/// Commit-axis coordinate of the parent furthest along the graph.
fn closest_parent(commit: &Commit, positions: &FxHashMap<String, Point>, vertical: bool) -> Option<f64> {
    commit
        .parents
        .iter()
        .filter_map(|p| positions.get(p))
        .map(|p| if vertical { p.y } else { p.x })
        .reduce(f64::max)
}

/// Whether another commit on the lane the arrow would travel along sits between `a` and `b`.
fn should_reroute(a: &Commit, b: &Commit, p1: Point, p2: Point, commits: &[&Commit], vertical: bool) -> bool {
    let b_is_furthest = if vertical { p1.x < p2.x } else { p1.y < p2.y };
    let branch = if b_is_furthest { &b.branch } else { &a.branch };
    commits
        .iter()
        .any(|c| c.branch == *branch && c.seq > a.seq && c.seq < b.seq)
}

/// A coordinate between `lo` and `hi` at least 10px away from every lane already in use.
fn find_lane(lo: f64, hi: f64, lanes: &mut Vec<f64>, depth: usize) -> f64 {
    let candidate = lo + (lo - hi).abs() / 2.0;
    if depth > 5 {
        return candidate;
    }
    if lanes.iter().all(|lane| (lane - candidate).abs() >= 10.0) {
        lanes.push(candidate);
        return candidate;
    }
    let diff = (lo - hi).abs();
    find_lane(lo, hi - diff / 5.0, lanes, depth + 1)
}

struct Arrow {
    color: usize,
    d: String,
}

fn arrow(
    a: &Commit,
    b: &Commit,
    layout: &Layout,
    commits: &[&Commit],
    lanes: &mut Vec<f64>,
) -> Option<Arrow> {
    let p1 = *layout.positions.get(&a.id)?;
    let p2 = *layout.positions.get(&b.id)?;
    let vertical = layout.direction.is_vertical();
    let merge_from_side =
        b.commit_type == CommitType::Merge && b.parents.first().map(String::as_str) != Some(a.id.as_str());

    let mut color = layout.lane_index(&b.branch);
    if merge_from_side {
        color = layout.lane_index(&a.branch);
    }

    let d = if should_reroute(a, b, p1, p2, commits, vertical) {
        let corners = if vertical {
            let x = find_lane(p1.x.min(p2.x), p1.x.max(p2.x), lanes, 0);
            if p1.x >= p2.x {
                color = layout.lane_index(&a.branch);
            }
            [Point::new(x, p1.y), Point::new(x, p2.y)]
        } else {
            let y = find_lane(p1.y.min(p2.y), p1.y.max(p2.y), lanes, 0);
            if p1.y >= p2.y {
                color = layout.lane_index(&a.branch);
            }
            [Point::new(p1.x, y), Point::new(p2.x, y)]
        };
        rounded_path(&[p1, corners[0], corners[1], p2], 10.0)
    } else {
        let aligned = if vertical { p1.x == p2.x } else { p1.y == p2.y };
        if aligned {
            rounded_path(&[p1, p2], 0.0)
        } else {
            // Merges coming in from another lane travel along their own lane first.
            let along_first = vertical != merge_from_side;
            let corner = if along_first {
                Point::new(p2.x, p1.y)
            } else {
                Point::new(p1.x, p2.y)
            };
            rounded_path(&[p1, corner, p2], 20.0)
        }
    };
    Some(Arrow { color, d })
}

/// Path through `points` with every interior corner rounded by an arc of `radius`.
fn rounded_path(points: &[Point], radius: f64) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {} {}", fmt(first.x), fmt(first.y));
    for w in points.windows(3) {
        let (prev, corner, next) = (w[0], w[1], w[2]);
        let (d1, l1) = direction(prev, corner);
        let (d2, l2) = direction(corner, next);
        let r = radius.min(l1).min(l2);
        if r <= 0.0 {
            let _ = write!(d, " L {} {}", fmt(corner.x), fmt(corner.y));
            continue;
        }
        let sweep = u8::from(d1.x * d2.y - d1.y * d2.x > 0.0);
        let _ = write!(
            d,
            " L {} {} A {r} {r}, 0, 0, {sweep}, {} {}",
            fmt(corner.x - d1.x * r),
            fmt(corner.y - d1.y * r),
            fmt(corner.x + d2.x * r),
            fmt(corner.y + d2.y * r),
        );
    }
    if let Some(last) = points.get(1..).and_then(<[Point]>::last) {
        let _ = write!(d, " L {} {}", fmt(last.x), fmt(last.y));
    }
    d
}

fn direction(from: Point, to: Point) -> (Point, f64) {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return (Point::new(0.0, 0.0), 0.0);
    }
    (Point::new(dx / len, dy / len), len)
}

/// Renders the git graph as an SVG tree.
pub fn render(db: &Db, config: &Config, theme: &Theme, measurer: &dyn TextMeasurer) -> Result<Element> {
    let opts = Options::from_config(config);
    let layout = layout(db, opts, theme, measurer);
    let commits = db.commits();
    let vertical = layout.direction.is_vertical();
    let mut bounds = Bounds::default();

    let mut branches = svg::group().class("branches");
    let mut used_lanes: Vec<f64> = Vec::new();
    if opts.show_branches {
        used_lanes = layout.lanes.iter().map(|l| l.pos).collect();
        for lane in &layout.lanes {
            branches.push(draw_branch(lane, &layout, opts, theme, &mut bounds));
        }
    }

    let mut arrows = svg::group().class("commit-arrows");
    for b in &commits {
        for parent in &b.parents {
            let Some(a) = db.commit_by_id(parent) else {
                continue;
            };
            let Some(arrow) = arrow(a, b, &layout, &commits, &mut used_lanes) else {
                continue;
            };
            let ix = arrow.color % crate::theme::GIT_COLOR_COUNT;
            arrows.push(
                svg::path(arrow.d)
                    .class(&format!("arrow arrow{ix}"))
                    .attr("fill", "none")
                    .attr("stroke", theme.git_color(ix))
                    .attr("stroke-width", 8)
                    .attr("stroke-linecap", "round"),
            );
        }
    }

    let mut bullets = svg::group().class("commit-bullets");
    let mut labels = svg::group().class("commit-labels");
    for commit in &commits {
        let Some(&p) = layout.positions.get(&commit.id) else {
            continue;
        };
        let ix = layout.lane_index(&commit.branch) % crate::theme::GIT_COLOR_COUNT;
        let r = if commit.symbol_type() == CommitType::Merge {
            MERGE_RADIUS
        } else {
            COMMIT_RADIUS
        };
        bounds.include_rect(p.x - r, p.y - r, 2.0 * r, 2.0 * r);
        bullets.push(draw_commit(commit, p, ix, theme));

        let shows_label = commit.commit_type != CommitType::CherryPick
            && (commit.commit_type != CommitType::Merge || commit.custom_id);
        if opts.show_commit_label && shows_label {
            labels.push(draw_commit_label(commit, p, vertical, opts, theme, measurer, &mut bounds));
        }
        if !commit.tags.is_empty() {
            labels.push(draw_tags(commit, p, vertical, theme, measurer, &mut bounds));
        }
    }

    let doc = svg::document(DIAGRAM_TYPE, bounds, opts.diagram_padding);
    let doc = svg::accessibility(doc, db.acc_title(), db.acc_descr());
    Ok(doc
        .child(branches)
        .child(arrows)
        .child(bullets)
        .child(labels))
}

fn draw_branch(lane: &Lane, layout: &Layout, opts: Options, theme: &Theme, bounds: &mut Bounds) -> Element {
    let ix = lane.index % crate::theme::GIT_COLOR_COUNT;
    let (w, h) = (lane.label.width + 18.0, lane.label.height + 4.0);
    let (line, label_x, label_y) = match layout.direction {
        Direction::LR => {
            let rotated = if opts.rotate_commit_label { 30.0 } else { 0.0 };
            let x = -w - 5.0 - rotated;
            let line = svg::line(0.0, lane.pos, layout.max_pos, lane.pos);
            bounds.include_point(layout.max_pos, lane.pos);
            (line, x, lane.pos - h / 2.0)
        }
        Direction::TB => {
            let line = svg::line(lane.pos, DEFAULT_POS, lane.pos, layout.max_pos);
            bounds.include_point(lane.pos, layout.max_pos);
            (line, lane.pos - w / 2.0, DEFAULT_POS - h - 5.0)
        }
        Direction::BT => {
            let line = svg::line(lane.pos, DEFAULT_POS, lane.pos, layout.max_pos);
            bounds.include_point(lane.pos, DEFAULT_POS);
            (line, lane.pos - w / 2.0, layout.max_pos + 5.0)
        }
    };
    bounds.include_rect(label_x, label_y, w, h);
    svg::group()
        .class("branch")
        .attr("data-branch", &lane.name)
        .child(
            line.class(&format!("branch branch{ix}"))
                .attr("stroke", &theme.line_color)
                .attr("stroke-width", 1)
                .attr("stroke-dasharray", "2"),
        )
        .child(
            svg::rect(label_x, label_y, w, h)
                .class(&format!("branchLabelBkg label{ix}"))
                .attr("rx", 4)
                .attr("ry", 4)
                .attr("fill", theme.git_color(ix)),
        )
        .child(
            svg::text(label_x + w / 2.0, label_y + h / 2.0, &lane.name)
                .class(&format!("branch-label{ix}"))
                .attr("text-anchor", "middle")
                .attr("dominant-baseline", "central")
                .attr("fill", theme.git_branch_label_color(ix)),
        )
}

fn draw_commit(commit: &Commit, p: Point, ix: usize, theme: &Theme) -> Element {
    let color = theme.git_color(ix);
    let inv = theme.git_inv_color(ix);
    let g = svg::group().class("commit").attr("data-id", &commit.id);
    match commit.symbol_type() {
        CommitType::Highlight => g
            .child(
                svg::centered_rect(p.x, p.y, 20.0, 20.0)
                    .class(&format!("commit-highlight{ix}"))
                    .attr("fill", inv),
            )
            .child(
                svg::centered_rect(p.x, p.y, 12.0, 12.0)
                    .class(&format!("commit{ix}"))
                    .attr("fill", color),
            ),
        CommitType::Reverse => g
            .child(
                svg::circle(p.x, p.y, COMMIT_RADIUS)
                    .class(&format!("commit{ix}"))
                    .attr("fill", color),
            )
            .child(
                svg::path(format!(
                    "M {} {} L {} {} M {} {} L {} {}",
                    fmt(p.x - 5.0),
                    fmt(p.y - 5.0),
                    fmt(p.x + 5.0),
                    fmt(p.y + 5.0),
                    fmt(p.x - 5.0),
                    fmt(p.y + 5.0),
                    fmt(p.x + 5.0),
                    fmt(p.y - 5.0)
                ))
                .class(&format!("commit-reverse{ix}"))
                .attr("stroke", inv)
                .attr("stroke-width", 3),
            ),
        CommitType::Merge => g
            .child(
                svg::circle(p.x, p.y, MERGE_RADIUS)
                    .class(&format!("commit commit-merge{ix}"))
                    .attr("fill", color),
            )
            .child(
                svg::circle(p.x, p.y, 6.0)
                    .class(&format!("commit-merge-inner{ix}"))
                    .attr("fill", inv),
            ),
        CommitType::CherryPick => {
            let mut g = g.child(
                svg::circle(p.x, p.y, COMMIT_RADIUS)
                    .class(&format!("commit commit-cherry-pick{ix}"))
                    .attr("fill", color),
            );
            for dx in [-3.0, 3.0] {
                g.push(svg::circle(p.x + dx, p.y + 2.0, 2.75).attr("fill", &theme.background));
                g.push(
                    svg::line(p.x + dx, p.y + 1.0, p.x, p.y - 5.0)
                        .attr("stroke", &theme.background),
                );
            }
            g
        }
        CommitType::Normal => g.child(
            svg::circle(p.x, p.y, COMMIT_RADIUS)
                .class(&format!("commit commit{ix}"))
                .attr("fill", color),
        ),
    }
}

fn draw_commit_label(
    commit: &Commit,
    p: Point,
    vertical: bool,
    opts: Options,
    theme: &Theme,
    measurer: &dyn TextMeasurer,
    bounds: &mut Bounds,
) -> Element {
    let style = TextStyle::sized(theme.commit_label_font_size);
    let m = measurer.measure(&commit.id, &style);
    let (w, h) = (m.width + 4.0, m.height + 4.0);
    let (x, y) = if vertical {
        (p.x - COMMIT_RADIUS - 10.0 - w, p.y - h / 2.0)
    } else {
        (p.x - w / 2.0, p.y + 13.5)
    };

    let mut g = svg::group().class("commit-label-group");
    let rotated = opts.rotate_commit_label && !vertical;
    if rotated {
        g.set_attr("transform", format!("rotate(-45, {}, {})", fmt(p.x), fmt(p.y)));
        for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
            let (rx, ry) = rotate_about(cx, cy, p, -45.0);
            bounds.include_point(rx, ry);
        }
    } else {
        bounds.include_rect(x, y, w, h);
    }
    g.child(
        svg::rect(x, y, w, h)
            .class("commit-label-bkg")
            .attr("fill", &theme.commit_label_background)
            .attr("opacity", 0.5),
    )
    .child(
        svg::text(x + w / 2.0, y + h / 2.0, &commit.id)
            .class("commit-label")
            .attr("text-anchor", "middle")
            .attr("dominant-baseline", "central")
            .num("font-size", theme.commit_label_font_size)
            .attr("fill", &theme.commit_label_color),
    )
}

fn rotate_about(x: f64, y: f64, pivot: Point, degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (dx, dy) = (x - pivot.x, y - pivot.y);
    (pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
}

/// Tag flags stacked above the commit (LR) or beside it (TB/BT).
fn draw_tags(
    commit: &Commit,
    p: Point,
    vertical: bool,
    theme: &Theme,
    measurer: &dyn TextMeasurer,
    bounds: &mut Bounds,
) -> Element {
    let style = TextStyle::sized(theme.tag_label_font_size);
    let mut g = svg::group().class("tags").attr("data-id", &commit.id);
    let mut offset = 0.0;
    for tag in &commit.tags {
        let m = measurer.measure(tag, &style);
        let (w, h) = (m.width + 8.0, m.height + 4.0);
        let (points, text_x, text_y) = if vertical {
            let left = p.x + COMMIT_RADIUS + 6.0 + offset;
            let (top, bottom) = (p.y - h / 2.0, p.y + h / 2.0);
            offset += w + 16.0;
            (
                vec![
                    (left, p.y),
                    (left + 6.0, top),
                    (left + 6.0 + w, top),
                    (left + 6.0 + w, bottom),
                    (left + 6.0, bottom),
                ],
                left + 6.0 + w / 2.0,
                p.y,
            )
        } else {
            let bottom = p.y - COMMIT_RADIUS - 6.0 - offset;
            let top = bottom - h;
            let (left, right) = (p.x - w / 2.0, p.x + w / 2.0);
            offset += h + 10.0;
            (
                vec![
                    (left, top),
                    (right, top),
                    (right, bottom),
                    (p.x + 4.0, bottom),
                    (p.x, bottom + 4.0),
                    (p.x - 4.0, bottom),
                    (left, bottom),
                ],
                p.x,
                top + h / 2.0,
            )
        };
        for &(x, y) in &points {
            bounds.include_point(x, y);
        }
        g.push(
            svg::polygon(&points)
                .class("tag-label-bkg")
                .attr("fill", &theme.tag_label_background)
                .attr("stroke", &theme.tag_label_border),
        );
        g.push(
            svg::text(text_x, text_y, tag)
                .class("tag-label")
                .attr("text-anchor", "middle")
                .attr("dominant-baseline", "central")
                .num("font-size", theme.tag_label_font_size)
                .attr("fill", &theme.tag_label_color),
        );
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_graph::parse_into;
    use crate::text::DeterministicTextMeasurer;

    fn db(text: &str) -> Db {
        let mut db = Db::default();
        parse_into(text, &mut db).unwrap();
        db
    }

    fn layout_of(db: &Db, config: &Config) -> Layout {
        layout(
            db,
            Options::from_config(config),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
    }

    fn pos(layout: &Layout, id: &str) -> Point {
        layout.positions[id]
    }

    #[test]
    fn lr_commits_step_along_x_and_branches_stack_down() {
        let db = db("gitGraph\ncommit id:\"A\"\nbranch dev\ncommit id:\"B\"\ncheckout main\ncommit id:\"C\"\n");
        let l = layout_of(&db, &Config::default());
        assert_eq!(pos(&l, "A"), Point::new(10.0, 0.0));
        assert_eq!(pos(&l, "B"), Point::new(60.0, 90.0));
        assert_eq!(pos(&l, "C"), Point::new(110.0, 0.0));
        assert_eq!(l.max_pos, 150.0);
    }

    #[test]
    fn bt_mirrors_tb() {
        let tb = db("gitGraph TB:\ncommit id:\"A\"\ncommit id:\"B\"\n");
        let bt = db("gitGraph BT:\ncommit id:\"A\"\ncommit id:\"B\"\n");
        let (tb, bt) = (
            layout_of(&tb, &Config::default()),
            layout_of(&bt, &Config::default()),
        );
        assert!(pos(&tb, "A").y < pos(&tb, "B").y);
        assert!(pos(&bt, "A").y > pos(&bt, "B").y);
        assert_eq!(pos(&tb, "A").y, pos(&bt, "B").y);
    }

    #[test]
    fn parallel_commits_follow_their_parent() {
        let text = "gitGraph\ncommit id:\"A\"\nbranch x\ncommit id:\"X\"\ncheckout main\nbranch y\ncommit id:\"Y\"\n";
        let mut config = Config::default();
        config.set_value("gitGraph.parallelCommits", true.into());
        let l = layout_of(&db(text), &config);
        assert_eq!(pos(&l, "X").x, pos(&l, "Y").x);

        let l = layout_of(&db(text), &Config::default());
        assert!(pos(&l, "X").x < pos(&l, "Y").x);
    }

    #[test]
    fn find_lane_avoids_used_lanes() {
        let mut lanes = vec![50.0];
        let lane = find_lane(0.0, 100.0, &mut lanes, 0);
        assert!((lane - 50.0).abs() >= 10.0);
        assert_eq!(lanes.len(), 2);
    }

    #[test]
    fn elbows_turn_with_an_arc() {
        let d = rounded_path(
            &[Point::new(0.0, 0.0), Point::new(0.0, 90.0), Point::new(60.0, 90.0)],
            20.0,
        );
        assert_eq!(d, "M 0 0 L 0 70 A 20 20, 0, 0, 0, 20 90 L 60 90");
    }

    #[test]
    fn merge_arrows_take_the_source_branch_color() {
        let db = db(
            "gitGraph\ncommit id:\"Z\"\nbranch dev\ncommit id:\"D\"\ncheckout main\ncommit id:\"C\"\nmerge dev id:\"M\"\n",
        );
        let svg = render(
            &db,
            &Config::default(),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert_eq!(svg.find_by_class("arrow").len(), 4);
        assert_eq!(svg.find_by_class("arrow1").len(), 2);
        assert_eq!(svg.find_by_class("commit-merge0").len(), 1);
    }

    #[test]
    fn commit_labels_skip_generated_merge_ids() {
        let db = db("gitGraph\ncommit id:\"Z\"\nbranch dev\ncommit id:\"D\"\ncheckout main\nmerge dev\n");
        let svg = render(
            &db,
            &Config::default(),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        let labels: Vec<String> = svg
            .find_by_class("commit-label")
            .iter()
            .map(|e| e.text_content())
            .collect();
        assert_eq!(labels, vec!["Z", "D"]);
    }

    #[test]
    fn tags_and_branch_labels_are_drawn() {
        let db = db("gitGraph\ncommit id:\"A\" tag:\"v1\" tag:\"v2\"\n");
        let svg = render(
            &db,
            &Config::default(),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert_eq!(svg.find_by_class("tag-label").len(), 2);
        assert_eq!(svg.find_by_class("branch-label0").len(), 1);
        let view_box = svg.get_attr("viewBox").unwrap();
        assert_eq!(view_box.split_whitespace().count(), 4);
    }

    #[test]
    fn hidden_branches_are_not_drawn() {
        let db = db("gitGraph\ncommit\n");
        let mut config = Config::default();
        config.set_value("gitGraph.showBranches", false.into());
        let svg = render(
            &db,
            &config,
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert!(svg.find_by_class("branchLabelBkg").is_empty());
    }
}
