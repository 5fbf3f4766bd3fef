//! Draws the node-link diagram, tooltip overlay, status bar and help panel.
//!
//! Everything here is a pure function of [`DiagramRenderData`]; all state
//! lives in the canvas module. The diagram is painted on a ratatui `Canvas`
//! widget in world coordinates: the depth axis runs left to right, the
//! sibling axis top to bottom, matching the horizontal orientation of the
//! source diagram.

use ratatui::layout::{Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;

use crate::taxonomy::hierarchy::Hierarchy;
use crate::taxonomy::model::TaxonAttr;
use crate::tui::scene::{NodeSprite, SceneFrame};

/// World-space margins around the visible extent. The right margin leaves
/// room for labels, which print rightward from each marker.
const MARGIN_LEFT: f64 = 4.0;
const MARGIN_RIGHT: f64 = 36.0;
const MARGIN_SIDE: f64 = 2.0;

/// Names at or below this depth are truncated when long.
const TRUNCATE_MAX_DEPTH: usize = 3;
/// Names shorter than this are never truncated.
const TRUNCATE_MIN_LEN: usize = 25;
/// Prefix kept when truncating.
const TRUNCATE_PREFIX: usize = 21;

/// Segments used to approximate the smooth horizontal link curve.
const LINK_SEGMENTS: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct Tooltip {
    pub node: usize,
    /// Terminal cell of the pointer.
    pub column: u16,
    pub row: u16,
}

#[derive(Debug)]
pub struct DiagramRenderData<'a> {
    pub frame: &'a SceneFrame,
    pub hierarchy: &'a Hierarchy,
    pub focused: usize,
    pub hovered: Option<usize>,
    pub tooltip: Option<Tooltip>,
    pub truncate_labels: bool,
    pub mode_label: &'a str,
    pub hints: &'a str,
    pub message: Option<&'a str>,
    pub show_help: bool,
}

/// World-coordinate bounds of the diagram viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// Viewport bounds for a frame: depth axis from the margins, sibling axis
/// from the visible extent. Recomputed every frame so collapsing a subtree
/// shrinks the viewport with it.
pub fn world_bounds(frame: &SceneFrame) -> Bounds {
    let max_depth_y = frame.nodes.iter().map(|n| n.y).fold(0.0f64, f64::max);
    Bounds {
        x: [-MARGIN_LEFT, max_depth_y + MARGIN_RIGHT],
        // canvas y grows upward; sibling coordinates are negated when drawn
        y: [
            -(frame.extent.max_x + MARGIN_SIDE),
            -(frame.extent.min_x - MARGIN_SIDE),
        ],
    }
}

/// The cell a sprite's marker lands on, given the diagram area.
pub fn node_cell(sprite: &NodeSprite, bounds: Bounds, area: Rect) -> Option<(u16, u16)> {
    let (width, height) = (f64::from(area.width), f64::from(area.height));
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let x_span = bounds.x[1] - bounds.x[0];
    let y_span = bounds.y[1] - bounds.y[0];
    if x_span <= 0.0 || y_span <= 0.0 {
        return None;
    }
    let col = (sprite.y - bounds.x[0]) / x_span * width;
    let row = (bounds.y[1] - (-sprite.x)) / y_span * height;
    if !(0.0..width).contains(&col) || !(0.0..height).contains(&row) {
        return None;
    }
    Some((area.x + col as u16, area.y + row as u16))
}

/// The diagram pane inside the full terminal area; must stay in lockstep
/// with the layout in [`draw`] so mouse hit-testing agrees with drawing.
pub fn diagram_rect(full: Rect) -> Rect {
    let area = full.inner(Margin {
        horizontal: 2,
        vertical: 1,
    });
    let inner = outer_block().inner(area);
    let [diagram, _gap, _status] = panes(inner);
    diagram
}

/// Find the node under a terminal cell: the marker or its label span.
pub fn hit_test(
    frame: &SceneFrame,
    hierarchy: &Hierarchy,
    full: Rect,
    column: u16,
    row: u16,
    truncate: bool,
) -> Option<usize> {
    let area = diagram_rect(full);
    let bounds = world_bounds(frame);
    for sprite in &frame.nodes {
        if sprite.exiting {
            continue;
        }
        let Some((col, cell_row)) = node_cell(sprite, bounds, area) else {
            continue;
        };
        if row != cell_row {
            continue;
        }
        let node = &hierarchy.nodes[sprite.idx];
        let label_len = display_label(&node.name, node.depth, truncate)
            .chars()
            .count() as u16;
        if column >= col && column <= col.saturating_add(1 + label_len) {
            return Some(sprite.idx);
        }
    }
    None
}

/// Truncation policy: below the depth threshold, long names keep a fixed
/// prefix plus an ellipsis; deep nodes and short names show in full. The
/// tooltip carries the full name either way.
pub fn display_label(name: &str, depth: usize, truncate: bool) -> String {
    if !truncate || depth > TRUNCATE_MAX_DEPTH || name.chars().count() < TRUNCATE_MIN_LEN {
        return name.to_string();
    }
    let prefix: String = name.chars().take(TRUNCATE_PREFIX).collect();
    format!("{prefix}…")
}

/// Single source of truth for the affiliation color; the resting render and
/// the hover restore both go through here.
pub fn label_color(attr: &TaxonAttr) -> Color {
    if attr.nsclc {
        Color::Blue
    } else {
        Color::White
    }
}

/// Taxa without a morphology code render italic (grouping headers).
pub fn label_italic(attr: &TaxonAttr) -> bool {
    attr.morphology_code.is_empty()
}

fn outer_block() -> Block<'static> {
    let title = Line::from(vec![
        Span::styled(
            "taxtree view",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[?] help", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("[q] quit", Style::default().fg(Color::DarkGray)),
    ]);
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::DarkGray))
        .padding(Padding::new(1, 1, 0, 0))
        .title(title)
}

fn panes(inner: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(inner)
}

pub fn draw(frame: &mut Frame, data: &DiagramRenderData<'_>) {
    let area = frame.area().inner(Margin {
        horizontal: 2,
        vertical: 1,
    });
    let block = outer_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [diagram_area, _gap, status_area] = panes(inner);
    draw_diagram(frame, diagram_area, data);
    draw_status(frame, status_area, data);

    if let Some(tooltip) = data.tooltip {
        draw_tooltip(frame, tooltip, data);
    }
    if data.show_help {
        render_help_overlay(frame);
    }
}

fn draw_diagram(frame: &mut Frame, area: Rect, data: &DiagramRenderData<'_>) {
    let bounds = world_bounds(data.frame);
    let canvas = Canvas::default()
        .marker(symbols::Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(|ctx| {
            for link in &data.frame.links {
                let Some(color) = faded(Color::DarkGray, link.opacity) else {
                    continue;
                };
                // horizontal cubic curve with control points at the
                // depth-axis midpoint, the source diagram's link shape
                let (sx, sy) = (link.source.1, link.source.0);
                let (tx, ty) = (link.target.1, link.target.0);
                let mx = (sx + tx) / 2.0;
                let mut prev = (sx, -sy);
                for step in 1..=LINK_SEGMENTS {
                    let t = step as f64 / LINK_SEGMENTS as f64;
                    let point = cubic_bezier((sx, sy), (mx, sy), (mx, ty), (tx, ty), t);
                    let next = (point.0, -point.1);
                    ctx.draw(&CanvasLine {
                        x1: prev.0,
                        y1: prev.1,
                        x2: next.0,
                        y2: next.1,
                        color,
                    });
                    prev = next;
                }
            }
            ctx.layer();
            for sprite in &data.frame.nodes {
                let node = &data.hierarchy.nodes[sprite.idx];
                let hovered = data.hovered == Some(sprite.idx) && !sprite.exiting;
                let focused = data.focused == sprite.idx && !sprite.exiting;

                let marker = if node.has_children() { "●" } else { "○" };
                let marker_color = match faded(
                    if node.has_children() {
                        Color::Gray
                    } else {
                        Color::DarkGray
                    },
                    sprite.opacity,
                ) {
                    Some(color) => color,
                    None => continue,
                };

                let (text, style) = if hovered {
                    // emphasis: full name in the enlarged register
                    (
                        node.name.clone(),
                        Style::default()
                            .fg(Color::LightRed)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    let color = match faded(label_color(&node.attr), sprite.opacity) {
                        Some(color) => color,
                        None => continue,
                    };
                    let mut style = Style::default().fg(color);
                    if label_italic(&node.attr) {
                        style = style.add_modifier(Modifier::ITALIC);
                    }
                    if focused {
                        style = style.add_modifier(Modifier::UNDERLINED);
                    }
                    (
                        display_label(&node.name, node.depth, data.truncate_labels),
                        style,
                    )
                };

                let line = Line::from(vec![
                    Span::styled(marker.to_string(), Style::default().fg(marker_color)),
                    Span::raw(" "),
                    Span::styled(text, style),
                ]);
                ctx.print(sprite.y, -sprite.x, line);
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_status(frame: &mut Frame, area: Rect, data: &DiagramRenderData<'_>) {
    let focused = &data.hierarchy.nodes[data.focused];
    let visible = data
        .frame
        .nodes
        .iter()
        .filter(|sprite| !sprite.exiting)
        .count();
    let fold_marker = if !focused.has_children() {
        "  "
    } else if focused.is_expanded() {
        "▾ "
    } else {
        "▸ "
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("[{}] ", data.mode_label),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(fold_marker),
            Span::styled(
                focused.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({} visible)", visible),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            data.hints.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(message) = data.message {
        lines.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_tooltip(frame: &mut Frame, tooltip: Tooltip, data: &DiagramRenderData<'_>) {
    let node = &data.hierarchy.nodes[tooltip.node];
    let mut lines = vec![
        Line::from(vec![
            Span::styled("id", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(": {} (", node.id)),
            Span::styled(
                node.attr.class.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
            Span::raw(")"),
        ]),
        Line::from(vec![
            Span::styled("name", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(": {}", node.name)),
        ]),
        Line::from(format!("Morphology code: {}", node.attr.morphology_code)),
        Line::from(format!("Topography code: {}", node.attr.topography_code)),
    ];
    if node.attr.nsclc {
        lines.push(Line::from(Span::styled(
            "NSCLC",
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let width = lines
        .iter()
        .map(Line::width)
        .max()
        .unwrap_or(0)
        .min(usize::from(frame.area().width.saturating_sub(4))) as u16
        + 4;
    let height = lines.len() as u16 + 2;
    let area = tooltip_rect(frame.area(), tooltip.column, tooltip.row, width, height);

    frame.render_widget(Clear, area);
    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::White))
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

/// Place the tooltip just past the cursor, clamped inside the terminal.
fn tooltip_rect(full: Rect, column: u16, row: u16, width: u16, height: u16) -> Rect {
    let width = width.min(full.width);
    let height = height.min(full.height);
    let x = (column + 2).min(full.right().saturating_sub(width));
    let y = (row + 1).min(full.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 54, 48);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  ↑↓/jk        move focus along the sibling axis"),
        Line::from("  ←→/hl        move focus to parent / first child"),
        Line::from("  Tab          next visible node"),
        Line::from("  Enter/Space  expand or collapse the focused node"),
        Line::from("  Alt+Enter    same, in slow motion"),
        Line::from("  mouse        hover for details, click to toggle"),
        Line::from("  s            settings"),
        Line::from("  ?            toggle this help"),
        Line::from("  q/Esc        quit"),
    ];
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" help ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 1)),
    );
    frame.render_widget(panel, area);
}

pub fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}

/// Terminal stand-in for opacity: drop nearly-invisible elements, dim the
/// half-faded ones.
fn faded(color: Color, opacity: f64) -> Option<Color> {
    if opacity < 0.15 {
        None
    } else if opacity < 0.6 {
        Some(Color::DarkGray)
    } else {
        Some(color)
    }
}

fn cubic_bezier(
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    t: f64,
) -> (f64, f64) {
    let u = 1.0 - t;
    let x = u * u * u * p0.0 + 3.0 * u * u * t * p1.0 + 3.0 * u * t * t * p2.0 + t * t * t * p3.0;
    let y = u * u * u * p0.1 + 3.0 * u * u * t * p1.1 + 3.0 * u * t * t * p2.1 + t * t * t * p3.1;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Extent;

    fn sprite(x: f64, y: f64) -> NodeSprite {
        NodeSprite {
            idx: 0,
            x,
            y,
            opacity: 1.0,
            exiting: false,
        }
    }

    #[test]
    fn short_names_are_never_truncated() {
        let name = "Adenocarcinoma"; // 14 chars
        assert_eq!(display_label(name, 0, true), name);
        assert_eq!(display_label(name, 5, true), name);
    }

    #[test]
    fn long_shallow_names_keep_a_21_char_prefix() {
        let name = "Non-small cell carcinoma, NOS"; // 29 chars
        let label = display_label(name, 3, true);
        assert_eq!(label.chars().count(), 22);
        assert!(label.ends_with('…'));
        assert_eq!(&label[..label.len() - '…'.len_utf8()], &name[..21]);
    }

    #[test]
    fn deep_names_show_in_full_regardless_of_length() {
        let name = "Adenocarcinoma with mixed subtypes and more";
        assert_eq!(display_label(name, 4, true), name);
    }

    #[test]
    fn boundary_length_24_is_kept_25_is_cut() {
        let short = "a".repeat(24);
        let long = "a".repeat(25);
        assert_eq!(display_label(&short, 0, true), short);
        assert_eq!(display_label(&long, 0, true).chars().count(), 22);
    }

    #[test]
    fn truncation_can_be_disabled() {
        let long = "a".repeat(40);
        assert_eq!(display_label(&long, 0, false), long);
    }

    #[test]
    fn affiliation_flag_drives_label_color() {
        let flagged = TaxonAttr {
            nsclc: true,
            ..TaxonAttr::default()
        };
        assert_eq!(label_color(&flagged), Color::Blue);
        assert_eq!(label_color(&TaxonAttr::default()), Color::White);
    }

    #[test]
    fn missing_morphology_code_renders_italic() {
        assert!(label_italic(&TaxonAttr::default()));
        let coded = TaxonAttr {
            morphology_code: "8140/3".to_string(),
            ..TaxonAttr::default()
        };
        assert!(!label_italic(&coded));
    }

    #[test]
    fn bounds_track_the_visible_extent_plus_margins() {
        let frame = SceneFrame {
            nodes: vec![sprite(0.0, 0.0), sprite(9.0, 24.0)],
            links: vec![],
            extent: Extent {
                min_x: 0.0,
                max_x: 9.0,
            },
        };
        let bounds = world_bounds(&frame);
        assert_eq!(bounds.x, [-MARGIN_LEFT, 24.0 + MARGIN_RIGHT]);
        assert_eq!(bounds.y, [-(9.0 + MARGIN_SIDE), MARGIN_SIDE]);
    }

    #[test]
    fn node_cell_maps_into_the_area() {
        let frame = SceneFrame {
            nodes: vec![sprite(0.0, 0.0)],
            links: vec![],
            extent: Extent {
                min_x: 0.0,
                max_x: 0.0,
            },
        };
        let bounds = world_bounds(&frame);
        let area = Rect::new(0, 0, 80, 24);
        let (col, row) = node_cell(&frame.nodes[0], bounds, area).unwrap();
        assert!(col < 80);
        assert!(row < 24);
    }

    #[test]
    fn tooltip_clamps_to_the_terminal() {
        let full = Rect::new(0, 0, 80, 24);
        let rect = tooltip_rect(full, 78, 22, 30, 8);
        assert!(rect.right() <= 80);
        assert!(rect.bottom() <= 24);
    }

    #[test]
    fn fade_thresholds() {
        assert_eq!(faded(Color::White, 0.05), None);
        assert_eq!(faded(Color::White, 0.4), Some(Color::DarkGray));
        assert_eq!(faded(Color::White, 0.9), Some(Color::White));
    }

    #[test]
    fn bezier_hits_its_endpoints() {
        let p = cubic_bezier((0.0, 0.0), (5.0, 0.0), (5.0, 10.0), (10.0, 10.0), 0.0);
        assert_eq!(p, (0.0, 0.0));
        let p = cubic_bezier((0.0, 0.0), (5.0, 0.0), (5.0, 10.0), (10.0, 10.0), 1.0);
        assert_eq!(p, (10.0, 10.0));
    }
}
