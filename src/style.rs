//! Typed view over an element's styling.
//!
//! Resolution order for the tracked properties (fill, stroke, stroke-width,
//! stroke-dasharray): a `style` attribute declaration wins over the
//! presentation attribute of the same name, which wins over "absent".
//! Classification treats an absent paint exactly like `none`.

use crate::document::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paint {
    None,
    /// A normalized color: lower-case `#rrggbb` where possible.
    Color(String),
    /// `url(#...)`, `currentColor` and the like.
    Other(String),
}

impl Paint {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("none") {
            return Paint::None;
        }
        if value.starts_with("url(") || value.eq_ignore_ascii_case("currentcolor") {
            return Paint::Other(value.to_string());
        }
        Paint::Color(normalize_color(value))
    }

    pub fn color(&self) -> Option<&str> {
        match self {
            Paint::Color(c) => Some(c),
            _ => None,
        }
    }

    fn to_css(&self) -> &str {
        match self {
            Paint::None => "none",
            Paint::Color(c) | Paint::Other(c) => c,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<String>,
    pub stroke_dasharray: Option<String>,
    /// Every other declaration, in source order.
    pub extra: Vec<(String, String)>,
}

impl Style {
    /// Parses a CSS declaration list (`fill:none;stroke:#000`).
    pub fn parse(css: &str) -> Self {
        let mut style = Style::default();
        for decl in css.split(';') {
            let Some((key, value)) = decl.split_once(':') else {
                continue;
            };
            style.set(key.trim(), value.trim());
        }
        style
    }

    pub(crate) fn resolve(el: &Element) -> Self {
        let mut style = Style::default();
        for key in ["fill", "stroke", "stroke-width", "stroke-dasharray"] {
            if let Some(value) = el.attr(key) {
                style.set(key, value.trim());
            }
        }
        if let Some(css) = el.attr("style") {
            let inline = Style::parse(css);
            style.fill = inline.fill.or(style.fill);
            style.stroke = inline.stroke.or(style.stroke);
            style.stroke_width = inline.stroke_width.or(style.stroke_width);
            style.stroke_dasharray = inline.stroke_dasharray.or(style.stroke_dasharray);
            style.extra = inline.extra;
        }
        style
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "fill" => self.fill = Some(Paint::parse(value)),
            "stroke" => self.stroke = Some(Paint::parse(value)),
            "stroke-width" => self.stroke_width = Some(value.to_string()),
            "stroke-dasharray" => self.stroke_dasharray = Some(value.to_string()),
            _ => match self.extra.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.to_string(),
                None => self.extra.push((key.to_string(), value.to_string())),
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fill(&self) -> &Paint {
        self.fill.as_ref().unwrap_or(&Paint::None)
    }

    pub fn stroke(&self) -> &Paint {
        self.stroke.as_ref().unwrap_or(&Paint::None)
    }

    pub fn is_dashed(&self) -> bool {
        self.stroke_dasharray
            .as_deref()
            .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
    }

    pub fn is_filled(&self) -> bool {
        !matches!(self.fill(), Paint::None)
    }

    /// Color used to group curves: the stroke, or the fill when the element
    /// is not stroked.
    pub fn curve_key(&self) -> Option<&str> {
        match self.stroke() {
            Paint::None => self.fill().color(),
            stroke => stroke.color(),
        }
    }

    pub fn to_css(&self) -> String {
        let mut decls: Vec<String> = Vec::new();
        if let Some(fill) = &self.fill {
            decls.push(format!("fill:{}", fill.to_css()));
        }
        if let Some(stroke) = &self.stroke {
            decls.push(format!("stroke:{}", stroke.to_css()));
        }
        if let Some(width) = &self.stroke_width {
            decls.push(format!("stroke-width:{}", width));
        }
        if let Some(dash) = &self.stroke_dasharray {
            decls.push(format!("stroke-dasharray:{}", dash));
        }
        for (key, value) in &self.extra {
            decls.push(format!("{}:{}", key, value));
        }
        decls.join(";")
    }
}

/// Lower-case hex for everything that can be expressed as such.
pub fn normalize_color(value: &str) -> String {
    let lower = value.trim().to_ascii_lowercase();
    match lower.as_str() {
        "white" => return "#ffffff".to_string(),
        "black" => return "#000000".to_string(),
        _ => {}
    }

    if let Some(hex) = lower.strip_prefix('#') {
        if hex.len() == 3 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return hex.chars().fold(String::from("#"), |mut acc, c| {
                acc.push(c);
                acc.push(c);
                acc
            });
        }
        return lower;
    }

    if let Some(args) = lower
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Option<Vec<u8>> = args.split(',').map(parse_channel).collect();
        if let Some([r, g, b]) = channels.as_deref() {
            return format!("#{:02x}{:02x}{:02x}", r, g, b);
        }
    }

    lower
}

fn parse_channel(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? * 2.55,
        None => raw.parse::<f64>().ok()?,
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}
