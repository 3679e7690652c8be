//! Element classification.
//!
//! Noise cleanup runs first and is shared; then one of two strategies
//! partitions the surviving elements into bounding box, grid, curves and
//! text roles. Only elements carrying an `id` take part, since later stages
//! address them by id.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::document::{Document, Element};
use crate::error::{Error, Result};
use crate::geometry::{AXIS_EPSILON, GeometryReport, Orientation, Rect, Segment, first_segment};
use crate::style::{Paint, Style, normalize_color};

/// Elements that can carry plotted data.
const SHAPE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "use",
];

const WHITE: &str = "#ffffff";

/// Ids removed from the document, together with every descendant id.
pub type Removed = HashSet<String>;

/// Removes white paths, clip path definitions and empty groups, in that
/// order. References to the removed clip paths are dropped as well.
pub fn remove_noise(doc: &mut Document) -> Removed {
    let mut removed: Removed = HashSet::new();

    removed.extend(doc.remove_where(|el| el.is("path") && is_white_noise(&el.style())));
    let clip_paths = doc.remove_where(|el| el.is("clipPath"));
    removed.extend(doc.remove_empty_groups());

    if !clip_paths.is_empty() {
        let clip_ids: HashSet<&str> = clip_paths.iter().map(String::as_str).collect();
        doc.for_each_mut(|el| strip_clip_reference(el, &clip_ids));
    }
    removed.extend(clip_paths);

    debug!(count = removed.len(), "removed noise elements");
    removed
}

fn is_white_noise(style: &Style) -> bool {
    let white = |paint: &Paint| paint.color() == Some(WHITE);
    let none = |paint: &Paint| matches!(paint, Paint::None);
    (white(style.fill()) && none(style.stroke())) || (none(style.fill()) && white(style.stroke()))
}

fn strip_clip_reference(el: &mut Element, clip_ids: &HashSet<&str>) {
    let points_at_removed = |value: &str| {
        value
            .trim()
            .strip_prefix("url(#")
            .and_then(|rest| rest.strip_suffix(')'))
            .is_some_and(|id| clip_ids.contains(id))
    };

    if el.attr("clip-path").is_some_and(points_at_removed) {
        el.remove_attr("clip-path");
    }
    if el.attr("style").is_some() {
        let mut style = el.style();
        if style.get("clip-path").is_some_and(points_at_removed) {
            style.extra.retain(|(k, _)| k != "clip-path");
            el.set_style(&style);
        }
    }
}

/// Plot frame edges in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// An axis-aligned path taking part in the frame or the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLine {
    pub id: String,
    pub orientation: Orientation,
    pub segment: Segment,
}

impl AxisLine {
    /// Position across the line's direction: x for vertical lines, y for
    /// horizontal ones.
    pub fn position(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.segment.start.x,
            _ => self.segment.start.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveGroup {
    /// Original color shared by every element of the group.
    pub color: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub frame: Frame,
    pub bounding_box: Vec<AxisLine>,
    pub grid: Vec<AxisLine>,
    /// Groups in first-encountered document order.
    pub curves: Vec<CurveGroup>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Tick texts found in the drawing, one slot per tick position in
    /// synthesis order. `None` marks a grid line no text was drawn at.
    pub x_tick_labels: Option<Vec<Option<String>>>,
    pub y_tick_labels: Option<Vec<Option<String>>>,
}

impl Classification {
    /// x coordinates of the vertical grid lines, ascending.
    pub fn x_tick_positions(&self) -> Vec<f64> {
        let mut xs = self.grid_positions(Orientation::Vertical);
        xs.sort_by(f64::total_cmp);
        xs
    }

    /// y coordinates of the horizontal grid lines, descending (bottom first).
    pub fn y_tick_positions(&self) -> Vec<f64> {
        let mut ys = self.grid_positions(Orientation::Horizontal);
        ys.sort_by(|a, b| b.total_cmp(a));
        ys
    }

    fn grid_positions(&self, orientation: Orientation) -> Vec<f64> {
        self.grid
            .iter()
            .filter(|line| line.orientation == orientation)
            .map(AxisLine::position)
            .collect()
    }
}

pub trait Classifier {
    fn name(&self) -> &'static str;

    fn classify(
        &self,
        doc: &Document,
        report: &GeometryReport,
        removed: &Removed,
    ) -> Result<Classification>;

    /// Whether the legend/arrow block belongs to this strategy's output.
    fn supports_decorations(&self) -> bool {
        false
    }
}

/// Strategy A: roles keyed on the exact stroke colors of the frame and the
/// grid.
#[derive(Debug, Clone)]
pub struct StyleKeyed {
    bbox_find: String,
    grid_find: String,
}

impl StyleKeyed {
    pub fn new(bbox_find: &str, grid_find: &str) -> Self {
        Self {
            bbox_find: normalize_color(bbox_find),
            grid_find: normalize_color(grid_find),
        }
    }

    fn is_find_color(&self, color: &str) -> bool {
        color == self.bbox_find || color == self.grid_find
    }

    /// Stroke color, or fill color when the stroke is none or one of the
    /// find colors.
    fn curve_key<'a>(&self, style: &'a Style) -> Option<&'a str> {
        match style.stroke().color() {
            Some(stroke) if !self.is_find_color(stroke) => Some(stroke),
            _ => style.fill().color().filter(|fill| !self.is_find_color(fill)),
        }
    }
}

impl Classifier for StyleKeyed {
    fn name(&self) -> &'static str {
        "style"
    }

    fn supports_decorations(&self) -> bool {
        true
    }

    fn classify(
        &self,
        doc: &Document,
        report: &GeometryReport,
        removed: &Removed,
    ) -> Result<Classification> {
        let mut bounding_box = Vec::new();
        let mut grid = Vec::new();
        let mut bbox_ids = Vec::new();

        for (id, el) in live_elements(doc, removed) {
            if !el.is("path") {
                continue;
            }
            let stroke = el.style().stroke().clone();
            let target = match stroke.color() {
                Some(c) if c == self.bbox_find => {
                    bbox_ids.push(id.to_string());
                    &mut bounding_box
                }
                Some(c) if c == self.grid_find => &mut grid,
                _ => continue,
            };
            if let Some(line) = axis_line(id, el)? {
                target.push(line);
            }
        }

        let frame = frame_from_lines(&bounding_box)
            .or_else(|| frame_from_report(&bbox_ids, report))
            .ok_or_else(|| Error::MissingFrame {
                message: format!("no path stroked with {}", self.bbox_find),
            })?;

        let claimed: HashSet<&str> = bbox_ids
            .iter()
            .map(String::as_str)
            .chain(grid.iter().map(|l| l.id.as_str()))
            .collect();
        let curves = group_curves(doc, removed, &claimed, |style| self.curve_key(style));

        // Lowest text is the x label, leftmost the y label.
        let texts = text_boxes(doc, report, removed);
        let x_label = texts
            .iter()
            .max_by(|a, b| a.rect.y.total_cmp(&b.rect.y))
            .and_then(TextBox::content);
        let y_label = texts
            .iter()
            .rev()
            .min_by(|a, b| a.rect.x.total_cmp(&b.rect.x))
            .and_then(TextBox::content);

        Ok(Classification {
            frame,
            bounding_box,
            grid,
            curves,
            title: None,
            x_label,
            y_label,
            x_tick_labels: None,
            y_tick_labels: None,
        })
    }
}

/// Strategy B: roles inferred from layout. Dashed axis-aligned paths span
/// the frame; text roles follow from where each text sits relative to it.
#[derive(Debug, Clone, Default)]
pub struct Positional;

impl Classifier for Positional {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn classify(
        &self,
        doc: &Document,
        report: &GeometryReport,
        removed: &Removed,
    ) -> Result<Classification> {
        let mut dashed = Vec::new();
        for (id, el) in live_elements(doc, removed) {
            if el.is("path") && el.style().is_dashed() {
                if let Some(line) = axis_line(id, el)? {
                    dashed.push(line);
                }
            }
        }

        let frame = frame_from_lines(&dashed).ok_or_else(|| Error::MissingFrame {
            message: "need dashed vertical and horizontal lines".to_string(),
        })?;

        let near = |a: f64, b: f64| (a - b).abs() <= AXIS_EPSILON;
        let on_border = |line: &AxisLine| {
            let pos = line.position();
            match line.orientation {
                Orientation::Vertical => near(pos, frame.left) || near(pos, frame.right),
                _ => near(pos, frame.top) || near(pos, frame.bottom),
            }
        };
        let (bounding_box, grid): (Vec<AxisLine>, Vec<AxisLine>) =
            dashed.into_iter().partition(on_border);

        let claimed: HashSet<&str> = bounding_box
            .iter()
            .chain(grid.iter())
            .map(|l| l.id.as_str())
            .collect();
        let curves = group_curves(doc, removed, &claimed, |style| style.curve_key());

        let roles = assign_text_roles(text_boxes(doc, report, removed), &frame)?;

        let mut classification = Classification {
            frame,
            bounding_box,
            grid,
            curves,
            title: roles.title,
            x_label: roles.x_label,
            y_label: roles.y_label,
            x_tick_labels: None,
            y_tick_labels: None,
        };
        classification.x_tick_labels = Some(align_ticks(
            &roles.x_ticks,
            &classification.x_tick_positions(),
            [frame.left, frame.right],
            Rect::center_x,
        ));
        classification.y_tick_labels = Some(align_ticks(
            &roles.y_ticks,
            &classification.y_tick_positions(),
            [frame.top, frame.bottom],
            Rect::center_y,
        ));
        Ok(classification)
    }
}

#[derive(Debug, Default)]
struct TextRoles {
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    x_ticks: Vec<TextBox>,
    y_ticks: Vec<TextBox>,
}

fn assign_text_roles(mut texts: Vec<TextBox>, frame: &Frame) -> Result<TextRoles> {
    let mut roles = TextRoles::default();

    let take = |texts: &mut Vec<TextBox>, index: Option<usize>| index.map(|i| texts.remove(i));

    let titles: Vec<TextBox> = {
        let (above, rest): (Vec<_>, Vec<_>) =
            texts.into_iter().partition(|t| t.rect.center_y() < frame.top);
        texts = rest;
        above
    };
    roles.title = titles.iter().find_map(TextBox::content);

    let lowest = texts
        .iter()
        .enumerate()
        .filter(|(_, t)| t.rect.center_y() > frame.bottom)
        .max_by(|(_, a), (_, b)| a.rect.center_y().total_cmp(&b.rect.center_y()))
        .map(|(i, _)| i);
    roles.x_label = take(&mut texts, lowest).and_then(|t| t.content());

    let leftmost = texts
        .iter()
        .enumerate()
        .filter(|(_, t)| t.rect.center_x() < frame.left)
        .min_by(|(_, a), (_, b)| a.rect.center_x().total_cmp(&b.rect.center_x()))
        .map(|(i, _)| i);
    roles.y_label = take(&mut texts, leftmost).and_then(|t| t.content());

    let mut x_ticks = Vec::new();
    let mut y_ticks = Vec::new();
    let mut corners = Vec::new();
    for text in texts {
        let right = text.rect.center_x() >= frame.left;
        let below = text.rect.center_y() > frame.bottom;
        match (right, below) {
            (true, true) => x_ticks.push(text),
            (false, false) => y_ticks.push(text),
            _ => corners.push(text),
        }
    }

    match corners.len() {
        0 => {}
        2 => {
            corners.sort_by(|a, b| a.rect.center_y().total_cmp(&b.rect.center_y()));
            if let (Some(x_tick), Some(y_tick)) = (corners.pop(), corners.pop()) {
                x_ticks.push(x_tick);
                y_ticks.push(y_tick);
            }
        }
        count => return Err(Error::CornerTicks { count }),
    }

    roles.x_ticks = x_ticks;
    roles.y_ticks = y_ticks;
    Ok(roles)
}

/// Pairs every grid position with the tick text centered closest to it.
/// A text only counts when it sits nearer to that line than halfway to
/// any other line, border lines included, so texts drawn at the borders
/// pair with nothing.
fn align_ticks(
    ticks: &[TextBox],
    positions: &[f64],
    borders: [f64; 2],
    center: fn(&Rect) -> f64,
) -> Vec<Option<String>> {
    positions
        .iter()
        .map(|&pos| {
            let reach = positions
                .iter()
                .chain(&borders)
                .map(|other| (other - pos).abs())
                .filter(|gap| *gap > AXIS_EPSILON)
                .fold(f64::INFINITY, f64::min)
                / 2.0;
            ticks
                .iter()
                .map(|t| ((center(&t.rect) - pos).abs(), t))
                .filter(|(dist, _)| *dist < reach)
                .min_by(|(a, _), (b, _)| a.total_cmp(b))
                .and_then(|(_, t)| t.content())
        })
        .collect()
}

/// Surviving elements with an id, in document order.
fn live_elements<'a>(
    doc: &'a Document,
    removed: &'a Removed,
) -> impl Iterator<Item = (&'a str, &'a Element)> {
    doc.elements().into_iter().filter_map(move |el| {
        let id = el.id()?;
        (!removed.contains(id)).then_some((id, el))
    })
}

/// Defining stroke of a grid/frame candidate. Degenerate and unparsable
/// paths are skipped; oblique ones are fatal.
fn axis_line(id: &str, el: &Element) -> Result<Option<AxisLine>> {
    let Some(segment) = el.attr("d").and_then(first_segment) else {
        debug!(id, "skipping path without a defining stroke");
        return Ok(None);
    };
    match segment.orientation() {
        Orientation::Oblique => Err(Error::ObliquePath { id: id.to_string() }),
        Orientation::Degenerate => Ok(None),
        orientation => Ok(Some(AxisLine {
            id: id.to_string(),
            orientation,
            segment,
        })),
    }
}

fn frame_from_lines(lines: &[AxisLine]) -> Option<Frame> {
    let fold = |orientation: Orientation, lo: fn(&Segment) -> f64, hi: fn(&Segment) -> f64| {
        lines
            .iter()
            .filter(|l| l.orientation == orientation)
            .fold(None, |acc: Option<(f64, f64)>, l| {
                let (a, b) = (lo(&l.segment), hi(&l.segment));
                Some(acc.map_or((a, b), |(min, max)| (min.min(a), max.max(b))))
            })
    };
    let (left, right) = fold(Orientation::Vertical, Segment::min_x, Segment::max_x)?;
    let (top, bottom) = fold(Orientation::Horizontal, Segment::min_y, Segment::max_y)?;
    Some(Frame {
        left,
        right,
        top,
        bottom,
    })
}

/// Frame from the reported extents of the bounding box elements, for frames
/// drawn as a single closed path.
fn frame_from_report(ids: &[String], report: &GeometryReport) -> Option<Frame> {
    let rect = ids
        .iter()
        .filter_map(|id| report.get(id))
        .reduce(|acc, r| acc.union(&r))?;
    Some(Frame {
        left: rect.x,
        right: rect.right(),
        top: rect.y,
        bottom: rect.bottom(),
    })
}

fn group_curves<F>(
    doc: &Document,
    removed: &Removed,
    claimed: &HashSet<&str>,
    key: F,
) -> Vec<CurveGroup>
where
    F: Fn(&Style) -> Option<&str>,
{
    let mut groups: Vec<CurveGroup> = Vec::new();
    for (id, el) in live_elements(doc, removed) {
        if claimed.contains(id) || !SHAPE_TAGS.contains(&el.local_name()) {
            continue;
        }
        let style = el.style();
        let Some(color) = key(&style) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.color == color) {
            Some(group) => group.ids.push(id.to_string()),
            None => groups.push(CurveGroup {
                color: color.to_string(),
                ids: vec![id.to_string()],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone)]
struct TextBox {
    rect: Rect,
    text: String,
}

impl TextBox {
    fn content(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Text elements placed by the report, through their own id or the first
/// descendant (tspan) that was reported.
fn text_boxes(doc: &Document, report: &GeometryReport, removed: &Removed) -> Vec<TextBox> {
    doc.elements()
        .into_iter()
        .filter(|el| el.is("text"))
        .filter(|el| el.id().is_none_or(|id| !removed.contains(id)))
        .filter_map(|el| {
            let rect = el
                .descendants()
                .into_iter()
                .find_map(|d| d.id().and_then(|id| report.get(id)));
            if rect.is_none() {
                debug!(id = el.id(), "text element missing from geometry report");
            }
            Some(TextBox {
                rect: rect?,
                text: el.text_content(),
            })
        })
        .collect()
}

/// Removes every text element; labels and ticks are regenerated later.
pub fn remove_texts(doc: &mut Document) -> Vec<String> {
    doc.remove_where(|el| el.is("text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="svg1"><g id="layer1">{}</g></svg>"#,
            body
        ))
        .unwrap()
    }

    fn report(lines: &str) -> GeometryReport {
        GeometryReport::parse(&format!("svg1,0,0,500,300\n{}", lines)).unwrap()
    }

    const FRAME: &str = r##"
        <path id="b1" style="fill:none;stroke:#262626" d="M 40,20 V 250"/>
        <path id="b2" style="fill:none;stroke:#262626" d="M 460,20 V 250"/>
        <path id="b3" style="fill:none;stroke:#262626" d="M 40,250 H 460"/>
        <path id="b4" style="fill:none;stroke:#262626" d="M 40,20 H 460"/>
    "##;

    #[test]
    fn noise_cleanup_removes_white_clip_and_empty_groups() {
        let mut d = Document::parse(
            r##"<svg id="svg1"><defs id="defs2"><clipPath id="clip3"><path id="path4" d="M0,0H1"/></clipPath></defs>
            <g id="g5"><path id="path6" style="fill:#ffffff;stroke:none" d="M0,0H1"/></g>
            <path id="path7" stroke="white" fill="none" d="M0,0H1"/>
            <path id="path8" style="fill:none;stroke:#ff0000" clip-path="url(#clip3)" d="M0,0H1"/></svg>"##,
        )
        .unwrap();
        let removed = remove_noise(&mut d);
        for id in ["clip3", "path4", "g5", "path6", "path7"] {
            assert!(removed.contains(id), "{} should be removed", id);
        }
        let kept = d.find("path8").unwrap();
        assert_eq!(kept.attr("clip-path"), None);
    }

    #[test]
    fn style_keyed_partitions_roles() {
        let d = doc(&format!(
            r##"{}
            <path id="g1" style="stroke:#dfdfdf" d="M 120,20 V 250"/>
            <path id="g2" style="stroke:#dfdfdf" d="M 50,20 V 250"/>
            <path id="g3" style="stroke:#dfdfdf" d="M 40,100 H 460"/>
            <path id="c1" style="fill:none;stroke:#FF0000" d="M 0,0 L 5,5"/>
            <path id="c2" style="fill:#0000ff;stroke:none" d="M 0,0 L 5,5"/>
            <path id="c3" style="fill:none;stroke:#ff0000" d="M 0,0 L 5,5"/>
            <text id="text10"><tspan id="tspan11">Time (s)</tspan></text>
            <text id="text12"><tspan id="tspan13">Voltage</tspan></text>"##,
            FRAME
        ));
        let r = report("tspan11,200,280,40,10\ntspan13,5,120,10,40");
        let c = StyleKeyed::new("#262626", "#DFDFDF")
            .classify(&d, &r, &Removed::new())
            .unwrap();

        assert_eq!(c.bounding_box.len(), 4);
        assert_eq!(
            c.frame,
            Frame {
                left: 40.0,
                right: 460.0,
                top: 20.0,
                bottom: 250.0
            }
        );
        assert_eq!(c.x_tick_positions(), vec![50.0, 120.0]);
        assert_eq!(c.y_tick_positions(), vec![100.0]);
        assert_eq!(c.curves.len(), 2);
        assert_eq!(c.curves[0].color, "#ff0000");
        assert_eq!(c.curves[0].ids, vec!["c1", "c3"]);
        assert_eq!(c.curves[1].color, "#0000ff");
        assert_eq!(c.x_label.as_deref(), Some("Time (s)"));
        assert_eq!(c.y_label.as_deref(), Some("Voltage"));
    }

    #[test]
    fn oblique_grid_path_is_fatal() {
        let d = doc(&format!(
            r##"{}<path id="g9" style="stroke:#dfdfdf" d="M 10,10 L 20,30"/>"##,
            FRAME
        ));
        let err = StyleKeyed::new("#262626", "#dfdfdf")
            .classify(&d, &report(""), &Removed::new())
            .unwrap_err();
        assert!(matches!(err, Error::ObliquePath { ref id } if id == "g9"));
    }

    #[test]
    fn removed_ids_never_classify() {
        let d = doc(&format!(
            r##"{}<path id="g9" style="stroke:#dfdfdf" d="M 10,10 L 20,30"/>"##,
            FRAME
        ));
        let removed: Removed = ["g9".to_string()].into_iter().collect();
        let c = StyleKeyed::new("#262626", "#dfdfdf")
            .classify(&d, &report(""), &removed)
            .unwrap();
        assert!(c.grid.is_empty());
    }

    #[test]
    fn closed_frame_path_falls_back_to_report_extent() {
        let d = doc(r##"<path id="b1" style="fill:none;stroke:#262626" d="M 40,20 H 460 V 250 H 40 Z"/>"##);
        let c = StyleKeyed::new("#262626", "#dfdfdf")
            .classify(&d, &report("b1,40,20,420,230"), &Removed::new())
            .unwrap();
        assert_eq!(c.frame.bottom, 250.0);
        assert_eq!(c.frame.left, 40.0);
    }

    const DASHED: &str = r##"
        <path id="d1" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 V 250"/>
        <path id="d2" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 150,20 V 250"/>
        <path id="d3" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 460,20 V 250"/>
        <path id="d4" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 H 460"/>
        <path id="d5" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,130 H 460"/>
        <path id="d6" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,250 H 460"/>
        <path id="c1" style="fill:none;stroke:#1f77b4" d="M 40,200 L 460,40"/>
    "##;

    fn texts(entries: &[(&str, &str)]) -> String {
        entries
            .iter()
            .map(|(id, t)| format!(r#"<text id="{}">{}</text>"#, id, t))
            .collect()
    }

    #[test]
    fn positional_assigns_frame_grid_and_text_roles() {
        let d = doc(&format!(
            "{}{}",
            DASHED,
            texts(&[
                ("text1", "Title"),
                ("text2", "x label"),
                ("text3", "y label"),
                ("text4", "0.5"),
                ("text5", "1.0"),
                ("text6", "5"),
                ("text7", "10"),
            ])
        ));
        let r = report(
            "text1,200,0,60,10\ntext2,220,280,40,10\ntext3,0,100,10,60\n\
             text4,150,255,10,8\ntext5,455,255,10,8\ntext6,25,126,10,8\ntext7,25,16,10,8",
        );
        let c = Positional.classify(&d, &r, &Removed::new()).unwrap();

        assert_eq!(c.frame.left, 40.0);
        assert_eq!(c.frame.bottom, 250.0);
        let mut border: Vec<&str> = c.bounding_box.iter().map(|l| l.id.as_str()).collect();
        border.sort();
        assert_eq!(border, vec!["d1", "d3", "d4", "d6"]);
        assert_eq!(c.x_tick_positions(), vec![150.0]);
        assert_eq!(c.y_tick_positions(), vec![130.0]);
        assert_eq!(c.curves.len(), 1);
        assert_eq!(c.title.as_deref(), Some("Title"));
        assert_eq!(c.x_label.as_deref(), Some("x label"));
        assert_eq!(c.y_label.as_deref(), Some("y label"));
        // "1.0" and "10" sit on border lines and pair with no grid line.
        assert_eq!(c.x_tick_labels, Some(vec![Some("0.5".to_string())]));
        assert_eq!(c.y_tick_labels, Some(vec![Some("5".to_string())]));
    }

    #[test]
    fn tick_texts_pair_with_the_nearest_grid_line() {
        let d = doc(&format!(
            r##"
            <path id="d1" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 V 250"/>
            <path id="d2" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 460,20 V 250"/>
            <path id="d3" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 250,20 V 250"/>
            <path id="d4" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 145,20 V 250"/>
            <path id="d5" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 H 460"/>
            <path id="d6" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,250 H 460"/>
            <path id="d7" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,135 H 460"/>
            {}"##,
            texts(&[
                ("text1", "x label"),
                ("text2", "y label"),
                ("text3", "0"),
                ("text4", "5"),
                ("text5", "10"),
                ("text6", "0.0"),
                ("text7", "0.5"),
                ("text8", "1.0"),
            ])
        ));
        let r = report(
            "text1,230,280,40,10\ntext2,0,100,10,60\n\
             text3,35,255,10,8\ntext4,245,255,10,8\ntext5,452,255,16,8\n\
             text6,18,246,14,8\ntext7,18,131,14,8\ntext8,18,16,14,8",
        );
        let c = Positional.classify(&d, &r, &Removed::new()).unwrap();

        assert_eq!(c.x_tick_positions(), vec![145.0, 250.0]);
        assert_eq!(c.x_tick_labels, Some(vec![None, Some("5".to_string())]));
        assert_eq!(c.y_tick_positions(), vec![135.0]);
        assert_eq!(c.y_tick_labels, Some(vec![Some("0.5".to_string())]));
    }

    #[test]
    fn border_lines_tolerate_endpoint_jitter() {
        let d = doc(
            r##"
            <path id="d1" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40.0000005,250 L 40,20"/>
            <path id="d2" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 460,20 V 250"/>
            <path id="d3" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 H 460"/>
            <path id="d4" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,250 L 460,250.0000004"/>
            <path id="d5" style="stroke:#b0b0b0;stroke-dasharray:2,2" d="M 200,20 V 250"/>"##,
        );
        let c = Positional.classify(&d, &report(""), &Removed::new()).unwrap();

        let mut border: Vec<&str> = c.bounding_box.iter().map(|l| l.id.as_str()).collect();
        border.sort();
        assert_eq!(border, vec!["d1", "d2", "d3", "d4"]);
        assert_eq!(c.x_tick_positions(), vec![200.0]);
        assert!(c.y_tick_positions().is_empty());
    }

    #[test]
    fn two_corner_ticks_split_by_height() {
        let d = doc(&format!(
            "{}{}",
            DASHED,
            texts(&[("text1", "xl"), ("text2", "yl"), ("text3", "0"), ("text4", "0.0")])
        ));
        // text3 sits below-left of the frame, text4 inside it. Both mark
        // the origin corner, so neither lands on an interior line.
        let r = report(
            "text1,220,280,40,10\ntext2,0,100,10,60\ntext3,30,255,8,8\ntext4,42,240,8,8",
        );
        let c = Positional.classify(&d, &r, &Removed::new()).unwrap();
        assert_eq!(c.x_tick_labels, Some(vec![None]));
        assert_eq!(c.y_tick_labels, Some(vec![None]));
    }

    #[test]
    fn single_corner_tick_is_fatal() {
        let d = doc(&format!(
            "{}{}",
            DASHED,
            texts(&[("text1", "xl"), ("text2", "yl"), ("text3", "0")])
        ));
        let r = report("text1,220,280,40,10\ntext2,0,100,10,60\ntext3,30,255,8,8");
        let err = Positional.classify(&d, &r, &Removed::new()).unwrap_err();
        assert!(matches!(err, Error::CornerTicks { count: 1 }));
    }

    #[test]
    fn positional_needs_dashed_lines() {
        let d = doc(r##"<path id="c1" style="stroke:#000" d="M 0,0 L 5,0"/>"##);
        let err = Positional
            .classify(&d, &report(""), &Removed::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingFrame { .. }));
    }
}
