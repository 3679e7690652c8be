//! Synthesis of replacement text and decorations.
//!
//! Every position is expressed in the counter-scaled space of
//! [`ScaleFactors`]: an element carrying `scale(scale_x, scale_y)` is placed
//! at `(x / scale_x, y / scale_y)` to land on document point `(x, y)`, and
//! absolute sizes are divided by `scale_size`. The pixel offsets below are
//! tuned by eye and are not derived from font metrics.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::classify::Frame;
use crate::document::{Document, Element};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::pipeline::Warning;
use crate::preset::{PX_PER_PT, Preset};
use crate::transform::ScaleFactors;
use crate::xml::sanitize_xml_text;

/// Gap between the x axis and its tick labels.
const X_TICK_GAP: f64 = 5.0;
/// Gap between the y axis and its tick labels.
const Y_TICK_GAP: f64 = 4.0;
const X_LABEL_GAP: f64 = 9.0;
const Y_LABEL_GAP: f64 = 15.0;
/// Approximate advance of one tick label character.
const TICK_CHAR_WIDTH: f64 = 4.3;

const LEGEND_X: f64 = 400.0;
const LEGEND_Y: f64 = 220.0;
const LEGEND_LINE_LENGTH: f64 = 15.0;
const LEGEND_TEXT_GAP: f64 = 5.0;
const LEGEND_ENTRY_SEP: f64 = 18.0 - 1.5;
const LEGEND_STROKE_WIDTH: f64 = 1.5;
/// Legend font size in points.
const LEGEND_FONT_SIZE: f64 = 10.0;
const ARROW_Y: f64 = 200.0;
const ARROW_STROKE_WIDTH: f64 = 0.8;
const ARROW_MARKER_PATH: &str = "M 8.7185878,4.0337352 -2.2072895,0.01601326 8.7185884,-4.0017078 \
     c -1.7454984,2.3720609 -1.7354408,5.6174519 -6e-7,8.035443 z";

pub const X_TICK_PLACEHOLDER: &str = "X";
pub const Y_TICK_PLACEHOLDER: &str = "Y";
pub const X_LABEL_PLACEHOLDER: &str = "X-AXIS LABEL";
pub const Y_LABEL_PLACEHOLDER: &str = "Y-AXIS LABEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn tick_placeholder(self) -> &'static str {
        match self {
            Axis::X => X_TICK_PLACEHOLDER,
            Axis::Y => Y_TICK_PLACEHOLDER,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Monotonic id source, seeded above every id already in use.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        Self { last: seed }
    }

    pub fn next(&mut self, prefix: &str) -> Result<String> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or(Error::IdOverflow { last: self.last })?;
        Ok(format!("{}{}", prefix, self.last))
    }
}

/// Makes the label list exactly `count` long: extra labels are dropped,
/// missing ones are filled with `placeholder`. No list at all means
/// placeholders everywhere and is not worth a warning.
pub fn reconcile_labels(
    labels: Option<&[String]>,
    count: usize,
    axis: Axis,
) -> (Vec<String>, Option<Warning>) {
    let placeholder = axis.tick_placeholder();
    let Some(labels) = labels else {
        return (vec![placeholder.to_string(); count], None);
    };

    let warning = (labels.len() != count).then_some(Warning::TickLabelCount {
        axis,
        supplied: labels.len(),
        found: count,
    });
    let mut reconciled: Vec<String> = labels.iter().take(count).cloned().collect();
    reconciled.resize(count, placeholder.to_string());
    (reconciled, warning)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn css(self) -> (&'static str, &'static str) {
        match self {
            Anchor::Start => ("start", "start"),
            Anchor::Middle => ("center", "middle"),
            Anchor::End => ("end", "end"),
        }
    }
}

/// Where the tick rows ended up; axis labels are placed relative to them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickLayout {
    pub x_tick_y: f64,
    pub y_tick_x: f64,
}

pub struct Synthesizer<'a> {
    ids: IdAllocator,
    scale: ScaleFactors,
    preset: &'a Preset,
    plot: Rect,
    frame: Frame,
    created: usize,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        ids: IdAllocator,
        scale: ScaleFactors,
        preset: &'a Preset,
        plot: Rect,
        frame: Frame,
    ) -> Self {
        Self {
            ids,
            scale,
            preset,
            plot,
            frame,
            created: 0,
        }
    }

    /// Number of top-level elements added so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Tick labels under the x axis at `xs` and left of the y axis at `ys`.
    /// Labels must already be reconciled with the positions.
    pub fn tick_labels(
        &mut self,
        doc: &mut Document,
        xs: &[f64],
        x_labels: &[String],
        ys: &[f64],
        y_labels: &[String],
    ) -> Result<TickLayout> {
        let s = self.scale;
        let tick_height = self.preset.ticks_size * PX_PER_PT;
        let font_size = self.preset.ticks_size / s.scale_size;

        let x_tick_y = (self.frame.bottom + tick_height) / s.scale_y + X_TICK_GAP / s.scale_size;
        for (x, label) in xs.iter().zip(x_labels) {
            let text = self.text(
                label,
                Anchor::Middle,
                font_size,
                s.text_transform(),
                x / s.scale_x,
                x_tick_y,
            )?;
            self.append(doc, text);
        }

        let y_tick_x = self.frame.left / s.scale_x - Y_TICK_GAP / s.scale_size;
        for (y, label) in ys.iter().zip(y_labels) {
            let text = self.text(
                label,
                Anchor::End,
                font_size,
                s.text_transform(),
                y_tick_x,
                (y + tick_height / 2.0) / s.scale_y,
            )?;
            self.append(doc, text);
        }

        debug!(x = xs.len(), y = ys.len(), "synthesized tick labels");
        Ok(TickLayout { x_tick_y, y_tick_x })
    }

    /// Centered x-axis label below the ticks and a rotated y-axis label left
    /// of the longest y tick label.
    pub fn axis_labels(
        &mut self,
        doc: &mut Document,
        layout: TickLayout,
        x_label: &str,
        y_label: &str,
        y_tick_labels: &[String],
    ) -> Result<()> {
        let s = self.scale;
        let font_size = self.preset.labels_size / s.scale_size;

        let x_label_x = (self.frame.left + self.plot.width / 2.0) / s.scale_x;
        let x_label_y = layout.x_tick_y
            + self.preset.labels_size * PX_PER_PT / s.scale_y
            + X_LABEL_GAP / s.scale_size;
        let text = self.text(
            x_label,
            Anchor::Middle,
            font_size,
            s.text_transform(),
            x_label_x,
            x_label_y,
        )?;
        self.append(doc, text);

        let longest = y_tick_labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let y_label_x =
            layout.y_tick_x - longest as f64 * TICK_CHAR_WIDTH - Y_LABEL_GAP / s.scale_size;
        let y_label_y = (self.frame.bottom - self.plot.height / 2.0) / s.scale_y;
        // The rotation swaps the axes: x carries -y and y carries x.
        let text = self.text(
            y_label,
            Anchor::Middle,
            font_size,
            s.rotated_text_transform(),
            -y_label_y,
            y_label_x,
        )?;
        self.append(doc, text);
        Ok(())
    }

    /// Legend with one colored line and "Entry N" label per curve group,
    /// plus an example arrow next to it.
    pub fn decorations(
        &mut self,
        doc: &mut Document,
        legend_colors: &[String],
        arrow_color: &str,
    ) -> Result<()> {
        let s = self.scale;
        let sx = s.scale_size / s.scale_x;
        let sy = s.scale_size / s.scale_y;

        let marker_id = self.ids.next("marker")?;
        let marker_path = Element::new("path")
            .with_attr("id", self.ids.next("path")?)
            .with_attr(
                "style",
                format!(
                    "fill:{c};stroke:{c};fill-rule:evenodd;fill-opacity:1;stroke-width:0.625;stroke-linejoin:round;stroke-opacity:1",
                    c = arrow_color
                ),
            )
            .with_attr("d", ARROW_MARKER_PATH)
            .with_attr("transform", "scale(-0.6,-0.6)");
        let marker = Element::new("marker")
            .with_attr("orient", "auto")
            .with_attr("refY", "0")
            .with_attr("refX", "0")
            .with_attr("id", marker_id.clone())
            .with_attr("style", "overflow:visible")
            .with_child(marker_path);
        doc.defs_mut().push(marker);

        let arrow = Element::new("path")
            .with_attr(
                "style",
                format!(
                    "fill:none;stroke:{c};stroke-width:{w};marker-end:url(#{m});stroke-linecap:square;stroke-linejoin:round;stroke-miterlimit:10;stroke-dasharray:none;stroke-opacity:1",
                    c = arrow_color,
                    w = ARROW_STROKE_WIDTH / s.scale_size,
                    m = marker_id
                ),
            )
            .with_attr(
                "d",
                format!(
                    "M {:.6},{:.6} h {:.6}",
                    LEGEND_X / sx,
                    ARROW_Y / sy,
                    LEGEND_LINE_LENGTH / sx
                ),
            )
            .with_attr("id", self.ids.next("path")?);
        self.append(doc, arrow);

        let line_dx = LEGEND_LINE_LENGTH / sx;
        let line_x = LEGEND_X / sx;
        // The text transform already takes care of the axis scaling.
        let text_x = (LEGEND_X + LEGEND_LINE_LENGTH + LEGEND_TEXT_GAP) / s.scale_size;
        let baseline_shift = (LEGEND_FONT_SIZE * PX_PER_PT / 3.0 - 1.0) / s.scale_size;

        for (entry, color) in legend_colors.iter().enumerate() {
            let line_y = (LEGEND_Y + entry as f64 * LEGEND_ENTRY_SEP) / sy;
            let line = Element::new("path")
                .with_attr(
                    "style",
                    format!(
                        "fill:none;stroke:{c};stroke-width:{w};stroke-linecap:butt;stroke-linejoin:bevel;stroke-miterlimit:10;stroke-dasharray:none;stroke-opacity:1",
                        c = color,
                        w = LEGEND_STROKE_WIDTH / s.scale_size
                    ),
                )
                .with_attr("d", format!("M {:.6},{:.6} h {:.6}", line_x, line_y, line_dx))
                .with_attr("id", self.ids.next("path")?);
            self.append(doc, line);

            let label = format!("Entry {}", entry + 1);
            let text = self.text(
                &label,
                Anchor::Start,
                LEGEND_FONT_SIZE / s.scale_size,
                s.text_transform(),
                text_x,
                line_y / s.scale_y + baseline_shift,
            )?;
            self.append(doc, text);
        }

        debug!(entries = legend_colors.len(), "synthesized legend");
        Ok(())
    }

    fn text(
        &mut self,
        content: &str,
        anchor: Anchor,
        font_size: f64,
        transform: String,
        x: f64,
        y: f64,
    ) -> Result<Element> {
        let (align, text_anchor) = anchor.css();
        let style = format!(
            "font-family:{};fill:{};font-size:{:.6}pt;font-weight:normal;fill-opacity:1;\
             text-align:{};text-anchor:{};fill-rule:nonzero;stroke:none;line-height:125%;\
             letter-spacing:0px;word-spacing:0px;font-stretch:normal;font-variant:normal;\
             writing-mode:lr-tb",
            self.preset.font_family, self.preset.font_color, font_size, align, text_anchor
        );
        let text_id = self.ids.next("text")?;
        let tspan = Element::new("tspan")
            .with_attr("id", self.ids.next("tspan")?)
            .with_text(sanitize_xml_text(content));
        Ok(Element::new("text")
            .with_attr("id", text_id)
            .with_attr("style", style)
            .with_attr("transform", transform)
            .with_attr("x", format!("{:.6}", x))
            .with_attr("y", format!("{:.6}", y))
            .with_child(tspan))
    }

    fn append(&mut self, doc: &mut Document, el: Element) {
        doc.main_layer_mut().push(el);
        self.created += 1;
    }
}
