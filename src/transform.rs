//! Canvas resizing and the compensating scale applied to new text.
//!
//! The drawing is stretched independently along x and y to reach the target
//! size. Text added afterwards must not be stretched, so it carries a
//! `scale(scale_x, scale_y)` transform that splits the aspect distortion
//! symmetrically between the two axes (`scale_x * scale_y == 1`).

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::classify::Removed;
use crate::document::{Document, Element};
use crate::error::{Error, Result};
use crate::geometry::{GeometryReport, Rect};

/// Report ids with these prefixes bound the whole image or belong to text,
/// and are left out of the plot area when the document no longer has them.
const NON_PLOT_PREFIXES: &[&str] = &["svg", "layer", "tspan", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactors {
    pub scale_x: f64,
    pub scale_y: f64,
    /// Converts absolute sizes and offsets into post-resize units.
    pub scale_size: f64,
}

impl ScaleFactors {
    pub fn compute(target_width: f64, target_height: f64, source: &Rect) -> Result<Self> {
        if !(source.width > 0.0 && source.height > 0.0) {
            return Err(Error::InvalidPlotArea {
                width: source.width,
                height: source.height,
            });
        }
        if !(target_width > 0.0 && target_height > 0.0) {
            return Err(Error::InvalidPreset {
                message: format!("target size must be positive, got {} x {}", target_width, target_height),
            });
        }

        let scale_y = (target_width / target_height * source.height / source.width).sqrt();
        let scale_x = 1.0 / scale_y;
        let scale_size = target_width / source.width * scale_x;
        Ok(Self {
            scale_x,
            scale_y,
            scale_size,
        })
    }

    /// `transform` attribute for upright synthesized text.
    pub fn text_transform(&self) -> String {
        format!("scale({:.8},{:.8})", self.scale_x, self.scale_y)
    }

    /// `transform` attribute for text rotated by 90 degrees counter-clockwise.
    /// The element's x/y must be given as `(-y, x)` of the intended anchor.
    pub fn rotated_text_transform(&self) -> String {
        format!("matrix(0,-{:.8},{:.8},0,0,0)", self.scale_y, self.scale_x)
    }
}

/// Union of the reported boxes of every surviving element, leaving out the
/// root, layers and text.
pub fn plot_area(doc: &Document, report: &GeometryReport, removed: &Removed) -> Result<Rect> {
    let excluded_by_tag: HashMap<&str, bool> = doc
        .elements()
        .into_iter()
        .filter_map(|el| el.id().map(|id| (id, is_non_plot(el))))
        .collect();

    let area = report
        .union_where(|entry| {
            if removed.contains(&entry.id) {
                return false;
            }
            match excluded_by_tag.get(entry.id.as_str()) {
                Some(excluded) => !excluded,
                None => !NON_PLOT_PREFIXES.iter().any(|p| entry.id.starts_with(p)),
            }
        })
        .ok_or(Error::InvalidPlotArea {
            width: 0.0,
            height: 0.0,
        })?;

    if !(area.width > 0.0 && area.height > 0.0) {
        return Err(Error::InvalidPlotArea {
            width: area.width,
            height: area.height,
        });
    }
    Ok(area)
}

fn is_non_plot(el: &Element) -> bool {
    el.is("svg")
        || el.is("text")
        || el.is("tspan")
        || (el.is("g") && el.attr("inkscape:groupmode") == Some("layer"))
}

/// Fits the viewBox to `canvas` and sets the declared size so that `source`
/// ends up `target_width` x `target_height` user units large. Aspect ratio
/// preservation is disabled: the declared box defines the final size.
pub fn resize_canvas(
    doc: &mut Document,
    canvas: &Rect,
    source: &Rect,
    target_width: f64,
    target_height: f64,
) {
    let width = target_width / source.width * canvas.width;
    let height = target_height / source.height * canvas.height;

    let root = &mut doc.root;
    root.set_attr(
        "viewBox",
        format!(
            "{} {} {:.8} {:.8}",
            canvas.x, canvas.y, canvas.width, canvas.height
        ),
    );
    root.set_attr("width", format!("{:.8}", width));
    root.set_attr("height", format!("{:.8}", height));
    root.set_attr("preserveAspectRatio", "none");

    debug!(width, height, ?canvas, "resized canvas");
}
