//! Geometry extraction: the per-element position report and the defining
//! stroke of path elements.

use std::collections::HashMap;

use serde::Serialize;
use svgtypes::{PathParser, PathSegment};

use crate::document::trailing_number;
use crate::error::{Error, Result};

/// Coordinates closer than this are considered equal when deciding whether
/// a segment is axis-aligned.
pub(crate) const AXIS_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
    /// Both points coincide.
    Degenerate,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn orientation(&self) -> Orientation {
        let same_x = (self.start.x - self.end.x).abs() <= AXIS_EPSILON;
        let same_y = (self.start.y - self.end.y).abs() <= AXIS_EPSILON;
        match (same_x, same_y) {
            (true, true) => Orientation::Degenerate,
            (true, false) => Orientation::Vertical,
            (false, true) => Orientation::Horizontal,
            (false, false) => Orientation::Oblique,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    pub fn max_x(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    pub fn min_y(&self) -> f64 {
        self.start.y.min(self.end.y)
    }

    pub fn max_y(&self) -> f64 {
        self.start.y.max(self.end.y)
    }
}

/// The first two drawn points of a path, in absolute coordinates. Anything
/// after the second point is ignored. Returns `None` for paths that do not
/// parse or that stop after a single point.
pub fn first_segment(d: &str) -> Option<Segment> {
    let mut parser = PathParser::from(d);

    let start = match parser.next()?.ok()? {
        PathSegment::MoveTo { x, y, .. } => Point { x, y },
        _ => return None,
    };

    let resolve = |abs: bool, x: f64, y: f64| {
        if abs {
            Point { x, y }
        } else {
            Point {
                x: start.x + x,
                y: start.y + y,
            }
        }
    };

    let end = match parser.next()?.ok()? {
        PathSegment::MoveTo { abs, x, y } | PathSegment::LineTo { abs, x, y } => resolve(abs, x, y),
        PathSegment::HorizontalLineTo { abs, x } => Point {
            x: if abs { x } else { start.x + x },
            y: start.y,
        },
        PathSegment::VerticalLineTo { abs, y } => Point {
            x: start.x,
            y: if abs { y } else { start.y + y },
        },
        PathSegment::CurveTo { abs, x, y, .. }
        | PathSegment::SmoothCurveTo { abs, x, y, .. }
        | PathSegment::Quadratic { abs, x, y, .. }
        | PathSegment::SmoothQuadratic { abs, x, y }
        | PathSegment::EllipticalArc { abs, x, y, .. } => resolve(abs, x, y),
        PathSegment::ClosePath { .. } => start,
    };

    Some(Segment { start, end })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub id: String,
    pub rect: Rect,
}

/// Parsed `id,x,y,width,height` report, one line per element.
#[derive(Debug, Clone)]
pub struct GeometryReport {
    entries: Vec<ReportEntry>,
    index: HashMap<String, usize>,
    max_id: u64,
}

impl GeometryReport {
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry = parse_line(line).map_err(|reason| Error::MalformedReport {
                line: line_no + 1,
                reason,
            })?;
            index.insert(entry.id.clone(), entries.len());
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(Error::MalformedReport {
                line: 0,
                reason: "report is empty".to_string(),
            });
        }

        let max_id = entries
            .iter()
            .filter_map(|entry| trailing_number(&entry.id))
            .max()
            .ok_or(Error::MissingIdSeed)?;

        Ok(Self {
            entries,
            index,
            max_id,
        })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<Rect> {
        self.index.get(id).map(|&i| self.entries[i].rect)
    }

    /// Largest trailing integer across every reported id.
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Union of the rectangles of all entries accepted by `keep`.
    pub fn union_where<F>(&self, mut keep: F) -> Option<Rect>
    where
        F: FnMut(&ReportEntry) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| keep(entry))
            .map(|entry| entry.rect)
            .reduce(|acc, rect| acc.union(&rect))
    }
}

fn parse_line(line: &str) -> std::result::Result<ReportEntry, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [id, x, y, width, height] = fields.as_slice() else {
        return Err(format!("expected 5 fields, found {}", fields.len()));
    };
    if id.is_empty() {
        return Err("empty element id".to_string());
    }

    let number = |name: &str, raw: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("{} '{}' is not a number", name, raw))
    };
    let rect = Rect::new(
        number("x", x)?,
        number("y", y)?,
        number("width", width)?,
        number("height", height)?,
    );
    if rect.width < 0.0 || rect.height < 0.0 {
        return Err(format!("negative size for '{}'", id));
    }

    Ok(ReportEntry {
        id: id.to_string(),
        rect,
    })
}
