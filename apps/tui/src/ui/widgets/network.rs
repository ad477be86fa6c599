//! Attendee-overlap graph and two-set Venn view.
//!
//! Geometry is computed in a unit-free `[0, 100]` square. Node radius and
//! edge weight are ratios against the largest value in the data passed
//! in, so every render rescales to its own dataset.

use std::f64::consts::TAU;

use craft_pulse::api::models::OverlapPair;
use craft_pulse::format;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::Frame;

use super::charts::{render_empty, titled_block};

const CANVAS: f64 = 100.0;
const MIN_NODE_RADIUS: f64 = 2.0;
const MAX_NODE_RADIUS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: String,
    pub count: i64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub overlap: i64,
    /// Overlap relative to the largest overlap in the graph, `[0, 1]`.
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkLayout {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

fn node_index(nodes: &mut Vec<(String, i64)>, name: &str, count: i64) -> usize {
    if let Some(index) = nodes.iter().position(|(existing, _)| existing == name) {
        nodes[index].1 = nodes[index].1.max(count);
        return index;
    }
    nodes.push((name.to_string(), count));
    nodes.len() - 1
}

/// Place one node per distinct event on a circle and connect every pair.
pub fn layout_network(pairs: &[OverlapPair]) -> NetworkLayout {
    let mut named: Vec<(String, i64)> = Vec::new();
    let mut raw_edges = Vec::new();

    for pair in pairs {
        let (Some(a), Some(b)) = (pair.event_a.as_deref(), pair.event_b.as_deref()) else {
            continue;
        };
        let from = node_index(&mut named, a, pair.event_a_count.unwrap_or(0));
        let to = node_index(&mut named, b, pair.event_b_count.unwrap_or(0));
        raw_edges.push((from, to, pair.overlap_count.unwrap_or(0).max(0)));
    }

    let max_count = named.iter().map(|(_, count)| *count).max().unwrap_or(0) as f64;
    let max_overlap = raw_edges.iter().map(|(_, _, o)| *o).max().unwrap_or(0) as f64;

    let center = CANVAS / 2.0;
    let orbit = CANVAS * 0.36;
    let total = named.len().max(1) as f64;

    let nodes = named
        .into_iter()
        .enumerate()
        .map(|(index, (label, count))| {
            let angle = TAU * index as f64 / total;
            Node {
                label,
                count,
                x: angle.cos().mul_add(orbit, center),
                y: angle.sin().mul_add(orbit, center),
                radius: format::scale(count as f64, max_count, MIN_NODE_RADIUS, MAX_NODE_RADIUS),
            }
        })
        .collect();

    let edges = raw_edges
        .into_iter()
        .map(|(from, to, overlap)| Edge {
            from,
            to,
            overlap,
            weight: format::ratio(overlap as f64, max_overlap),
        })
        .collect();

    NetworkLayout { nodes, edges }
}

/// Edge colour bucket by weight; heavier edges are brighter.
pub fn edge_color(weight: f64) -> Color {
    if weight >= 0.66 {
        Color::LightMagenta
    } else if weight >= 0.33 {
        Color::Magenta
    } else {
        Color::DarkGray
    }
}

/// Radii of two sets and the distance between their centres, scaled so the
/// larger set has radius `max_radius`. Identical sets overlap fully and
/// disjoint sets just touch.
pub fn venn_geometry(count_a: i64, count_b: i64, overlap: i64, max_radius: f64) -> (f64, f64, f64) {
    let largest = count_a.max(count_b).max(1) as f64;
    let ra = format::scale(count_a.max(0) as f64, largest, max_radius * 0.3, max_radius);
    let rb = format::scale(count_b.max(0) as f64, largest, max_radius * 0.3, max_radius);

    let smaller = count_a.min(count_b).max(1) as f64;
    let shared = format::ratio(overlap.max(0) as f64, smaller);
    let touching = ra + rb;
    let nested = (ra - rb).abs();
    let distance = (touching - nested).mul_add(-shared, touching);
    (ra, rb, distance)
}

pub fn render_network(f: &mut Frame<'_>, area: Rect, title: &str, pairs: &[OverlapPair], selected: Option<usize>) {
    let layout = layout_network(pairs);
    if layout.nodes.is_empty() {
        render_empty(f, area, title, "No overlapping events");
        return;
    }

    let canvas = Canvas::default()
        .block(titled_block(title))
        .marker(Marker::Braille)
        .x_bounds([0.0, CANVAS])
        .y_bounds([0.0, CANVAS])
        .paint(|ctx| {
            for (index, edge) in layout.edges.iter().enumerate() {
                let (a, b) = (&layout.nodes[edge.from], &layout.nodes[edge.to]);
                let color = if selected == Some(index) {
                    Color::Yellow
                } else {
                    edge_color(edge.weight)
                };
                ctx.draw(&CanvasLine {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    color,
                });
            }
            ctx.layer();
            for node in &layout.nodes {
                ctx.draw(&Circle {
                    x: node.x,
                    y: node.y,
                    radius: node.radius,
                    color: Color::Cyan,
                });
                let label = format!("{} ({})", short_label(&node.label, 18), format::abbreviate(node.count as f64));
                ctx.print(
                    node.x - node.radius,
                    node.y - node.radius - 3.0,
                    TextLine::from(Span::styled(label, Style::default().fg(Color::White))),
                );
            }
        });
    f.render_widget(canvas, area);
}

pub fn render_venn(f: &mut Frame<'_>, area: Rect, pair: Option<&OverlapPair>) {
    let Some(pair) = pair else {
        render_empty(f, area, "Overlap", "Select a pair");
        return;
    };
    let count_a = pair.event_a_count.unwrap_or(0);
    let count_b = pair.event_b_count.unwrap_or(0);
    let overlap = pair.overlap_count.unwrap_or(0);
    let (ra, rb, distance) = venn_geometry(count_a, count_b, overlap, 30.0);

    let center = CANVAS / 2.0;
    let ax = center - distance / 2.0;
    let bx = center + distance / 2.0;
    let name_a = short_label(pair.event_a.as_deref().unwrap_or(format::PLACEHOLDER), 20);
    let name_b = short_label(pair.event_b.as_deref().unwrap_or(format::PLACEHOLDER), 20);

    let canvas = Canvas::default()
        .block(titled_block("Overlap"))
        .marker(Marker::Braille)
        .x_bounds([0.0, CANVAS])
        .y_bounds([0.0, CANVAS])
        .paint(move |ctx| {
            ctx.draw(&Circle { x: ax, y: center, radius: ra, color: Color::Cyan });
            ctx.draw(&Circle { x: bx, y: center, radius: rb, color: Color::Magenta });
            ctx.layer();
            ctx.print(
                (ax - ra).max(0.0),
                (center + ra + 4.0).min(CANVAS - 2.0),
                TextLine::from(Span::styled(name_a.clone(), Style::default().fg(Color::Cyan))),
            );
            ctx.print(
                (bx - rb / 2.0).max(0.0),
                (center - rb - 6.0).max(1.0),
                TextLine::from(Span::styled(name_b.clone(), Style::default().fg(Color::Magenta))),
            );
            ctx.print(
                center - 4.0,
                center,
                TextLine::from(Span::styled(format::abbreviate(overlap as f64), Style::default().fg(Color::Yellow))),
            );
        });
    f.render_widget(canvas, area);
}

fn short_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, a_count: i64, b_count: i64, overlap: i64) -> OverlapPair {
        OverlapPair {
            event_a: Some(a.to_string()),
            event_b: Some(b.to_string()),
            event_a_count: Some(a_count),
            event_b_count: Some(b_count),
            overlap_count: Some(overlap),
            ..OverlapPair::default()
        }
    }

    #[test]
    fn layout_scales_against_current_dataset() {
        let small = layout_network(&[pair("A", "B", 10, 5, 2), pair("A", "C", 10, 20, 4)]);
        assert_eq!(small.nodes.len(), 3);
        assert_eq!(small.edges.len(), 2);

        let biggest = small.nodes.iter().find(|n| n.label == "C").unwrap();
        assert!((biggest.radius - MAX_NODE_RADIUS).abs() < 1e-9);
        assert!((small.edges[1].weight - 1.0).abs() < 1e-9);
        assert!((small.edges[0].weight - 0.5).abs() < 1e-9);

        // Same shape at a hundred times the volume renders the same.
        let large = layout_network(&[pair("A", "B", 1000, 500, 200), pair("A", "C", 1000, 2000, 400)]);
        for (s, l) in small.nodes.iter().zip(&large.nodes) {
            assert!((s.radius - l.radius).abs() < 1e-9);
        }
    }

    #[test]
    fn pairs_without_names_or_counts_do_not_break_layout() {
        let mut unnamed = pair("A", "B", 0, 0, 0);
        unnamed.event_b = None;
        let layout = layout_network(&[unnamed, OverlapPair::default()]);
        assert_eq!(layout, NetworkLayout::default());

        let zeros = layout_network(&[pair("A", "B", 0, 0, 0)]);
        assert!(zeros.nodes.iter().all(|n| (n.radius - MIN_NODE_RADIUS).abs() < 1e-9));
        assert!(zeros.edges[0].weight.abs() < 1e-9);
    }

    #[test]
    fn venn_distance_tracks_overlap_share() {
        let (ra, rb, disjoint) = venn_geometry(100, 100, 0, 30.0);
        assert!((disjoint - (ra + rb)).abs() < 1e-9);

        let (ra, rb, nested) = venn_geometry(100, 50, 50, 30.0);
        assert!((nested - (ra - rb).abs()).abs() < 1e-9);
        assert!(ra > rb);

        let (_, _, partial) = venn_geometry(100, 100, 50, 30.0);
        assert!(partial < disjoint && partial > 0.0);
    }

    #[test]
    fn edge_colors_bucket_by_weight() {
        assert_eq!(edge_color(1.0), Color::LightMagenta);
        assert_eq!(edge_color(0.4), Color::Magenta);
        assert_eq!(edge_color(0.0), Color::DarkGray);
        assert_eq!(short_label("Philadelphia Cocktail Festival", 10).chars().count(), 10);
    }
}
