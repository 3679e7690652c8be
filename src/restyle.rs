use tracing::debug;

use crate::classify::{AxisLine, Classification, CurveGroup};
use crate::document::Document;
use crate::style::Paint;

/// Stroke presets for the frame, the grid and the curves.
#[derive(Debug, Clone)]
pub struct Restyle<'a> {
    pub bbox_color: &'a str,
    pub bbox_width: f64,
    pub grid_color: &'a str,
    pub grid_width: f64,
    pub plot_width: f64,
    /// `None` keeps the original curve colors.
    pub palette: Option<&'a [String]>,
}

/// Final color of each curve group: `palette[i mod len]` for the i-th group
/// in first-encountered order, or the group's own color without a palette.
pub fn assign_colors(curves: &[CurveGroup], palette: Option<&[String]>) -> Vec<String> {
    curves
        .iter()
        .enumerate()
        .map(|(i, group)| match palette {
            Some(colors) if !colors.is_empty() => colors[i % colors.len()].clone(),
            _ => group.color.clone(),
        })
        .collect()
}

impl Restyle<'_> {
    /// Returns the color assigned to each curve group.
    pub fn apply(&self, doc: &mut Document, classification: &Classification) -> Vec<String> {
        self.restyle_lines(doc, &classification.bounding_box, self.bbox_color, self.bbox_width);
        self.restyle_lines(doc, &classification.grid, self.grid_color, self.grid_width);

        let colors = assign_colors(&classification.curves, self.palette);
        for (group, color) in classification.curves.iter().zip(&colors) {
            for id in &group.ids {
                let Some(el) = doc.find_mut(id) else {
                    continue;
                };
                let mut style = el.style();
                if !style.is_filled() {
                    style.stroke_width = Some(px(self.plot_width));
                }
                if self.palette.is_some() {
                    if style.is_filled() {
                        style.fill = Some(Paint::Color(color.clone()));
                    }
                    style.stroke = Some(Paint::Color(color.clone()));
                }
                el.set_style(&style);
            }
            debug!(from = %group.color, to = %color, elements = group.ids.len(), "restyled curve group");
        }
        colors
    }

    fn restyle_lines(&self, doc: &mut Document, lines: &[AxisLine], color: &str, width: f64) {
        for line in lines {
            if let Some(el) = doc.find_mut(&line.id) {
                let mut style = el.style();
                style.stroke_width = Some(px(width));
                style.stroke = Some(Paint::Color(color.to_string()));
                el.set_style(&style);
            }
        }
    }
}

fn px(value: f64) -> String {
    format!("{}px", value)
}
