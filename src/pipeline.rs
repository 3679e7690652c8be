//! One republishing run: noise cleanup, classification, resize, restyle and
//! synthesis, in that order. A fatal error at any stage drops the document;
//! nothing is handed back for writing.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{self, Classifier, Positional, StyleKeyed};
use crate::document::Document;
use crate::error::Result;
use crate::geometry::{GeometryReport, Rect};
use crate::preset::{DEFAULT_BBOX_COLOR, DEFAULT_GRID_COLOR, Preset};
use crate::restyle::Restyle;
use crate::synth::{
    Axis, IdAllocator, Synthesizer, X_LABEL_PLACEHOLDER, Y_LABEL_PLACEHOLDER, reconcile_labels,
};
use crate::transform::{self, ScaleFactors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    /// Style-keyed when both find colors are given, positional otherwise.
    #[default]
    Auto,
    Style,
    Positional,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub preset: Preset,
    /// `None` keeps the original curve colors.
    pub palette: Option<Vec<String>>,
    pub x_ticks: Option<Vec<String>>,
    pub y_ticks: Option<Vec<String>>,
    pub bbox_color: String,
    pub grid_color: String,
    pub bbox_find_color: Option<String>,
    pub grid_find_color: Option<String>,
    pub classifier: ClassifierKind,
    pub include_decorations: bool,
}

impl RunConfig {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            palette: None,
            x_ticks: None,
            y_ticks: None,
            bbox_color: DEFAULT_BBOX_COLOR.to_string(),
            grid_color: DEFAULT_GRID_COLOR.to_string(),
            bbox_find_color: None,
            grid_find_color: None,
            classifier: ClassifierKind::Auto,
            include_decorations: true,
        }
    }

    fn classifier(&self) -> Box<dyn Classifier> {
        let style_keyed = || {
            Box::new(StyleKeyed::new(
                self.bbox_find_color.as_deref().unwrap_or(DEFAULT_BBOX_COLOR),
                self.grid_find_color.as_deref().unwrap_or(DEFAULT_GRID_COLOR),
            )) as Box<dyn Classifier>
        };
        match self.classifier {
            ClassifierKind::Style => style_keyed(),
            ClassifierKind::Positional => Box::new(Positional),
            ClassifierKind::Auto => {
                if self.bbox_find_color.is_some() && self.grid_find_color.is_some() {
                    style_keyed()
                } else {
                    Box::new(Positional)
                }
            }
        }
    }
}

/// Recoverable condition, resolved with a fallback and reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    TickLabelCount {
        axis: Axis,
        supplied: usize,
        found: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TickLabelCount {
                axis,
                supplied,
                found,
            } if supplied > found => write!(
                f,
                "{} {}-tick labels supplied but only {} {}-ticks found; ignoring the extra labels",
                supplied, axis, found, axis
            ),
            Warning::TickLabelCount {
                axis,
                supplied,
                found,
            } => write!(
                f,
                "{} {}-tick labels supplied for {} {}-ticks; filling the rest with placeholders",
                supplied, axis, found, axis
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurveSummary {
    pub original: String,
    pub assigned: String,
    pub elements: usize,
}

/// Machine readable account of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub strategy: &'static str,
    pub removed: usize,
    pub bounding_box: usize,
    pub grid: usize,
    pub curves: Vec<CurveSummary>,
    pub title: Option<String>,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub synthesized: usize,
    pub plot_area: Rect,
    pub scale: ScaleFactors,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub struct Outcome {
    pub document: Document,
    pub warnings: Vec<Warning>,
    pub summary: Summary,
}

pub fn run(mut doc: Document, report: &GeometryReport, config: &RunConfig) -> Result<Outcome> {
    let preset = &config.preset;
    let classifier = config.classifier();
    let seed = report.max_id().max(doc.max_numeric_id().unwrap_or(0));
    debug!(strategy = classifier.name(), seed, "starting run");

    let mut removed = classify::remove_noise(&mut doc);
    let classification = classifier.classify(&doc, report, &removed)?;
    removed.extend(classify::remove_texts(&mut doc));
    debug!(
        bounding_box = classification.bounding_box.len(),
        grid = classification.grid.len(),
        curves = classification.curves.len(),
        removed = removed.len(),
        "classified"
    );

    let plot = transform::plot_area(&doc, report, &removed)?;
    let scale = ScaleFactors::compute(preset.width, preset.height, &plot)?;
    transform::resize_canvas(&mut doc, &plot, &plot, preset.width, preset.height);
    debug!(?scale, "computed scale factors");

    let restyle = Restyle {
        bbox_color: &config.bbox_color,
        bbox_width: preset.bbox_stroke_width,
        grid_color: &config.grid_color,
        grid_width: preset.grid_stroke_width,
        plot_width: preset.plot_stroke_width,
        palette: config.palette.as_deref(),
    };
    let colors = restyle.apply(&mut doc, &classification);

    let mut warnings = Vec::new();
    let xs = classification.x_tick_positions();
    let ys = classification.y_tick_positions();
    let x_labels = tick_labels(
        config.x_ticks.as_deref(),
        classification.x_tick_labels.as_deref(),
        xs.len(),
        Axis::X,
        &mut warnings,
    );
    let y_labels = tick_labels(
        config.y_ticks.as_deref(),
        classification.y_tick_labels.as_deref(),
        ys.len(),
        Axis::Y,
        &mut warnings,
    );

    let mut synth = Synthesizer::new(
        IdAllocator::new(seed),
        scale,
        preset,
        plot,
        classification.frame,
    );
    let layout = synth.tick_labels(&mut doc, &xs, &x_labels, &ys, &y_labels)?;
    let x_label = non_empty(classification.x_label.as_deref()).unwrap_or(X_LABEL_PLACEHOLDER);
    let y_label = non_empty(classification.y_label.as_deref()).unwrap_or(Y_LABEL_PLACEHOLDER);
    synth.axis_labels(&mut doc, layout, x_label, y_label, &y_labels)?;
    if config.include_decorations && classifier.supports_decorations() {
        synth.decorations(&mut doc, &colors, &config.bbox_color)?;
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    let summary = Summary {
        strategy: classifier.name(),
        removed: removed.len(),
        bounding_box: classification.bounding_box.len(),
        grid: classification.grid.len(),
        curves: classification
            .curves
            .iter()
            .zip(&colors)
            .map(|(group, color)| CurveSummary {
                original: group.color.clone(),
                assigned: color.clone(),
                elements: group.ids.len(),
            })
            .collect(),
        title: classification.title.clone(),
        x_ticks: xs.len(),
        y_ticks: ys.len(),
        synthesized: synth.created(),
        plot_area: plot,
        scale,
        warnings: warnings.clone(),
    };
    info!(
        strategy = summary.strategy,
        synthesized = summary.synthesized,
        warnings = warnings.len(),
        "run finished"
    );

    Ok(Outcome {
        document: doc,
        warnings,
        summary,
    })
}

/// Labels for `count` tick positions. A caller's list wins and is checked
/// against the count; texts found in the drawing already line up with the
/// positions and only have their gaps filled.
fn tick_labels(
    supplied: Option<&[String]>,
    found: Option<&[Option<String>]>,
    count: usize,
    axis: Axis,
    warnings: &mut Vec<Warning>,
) -> Vec<String> {
    if let (None, Some(found)) = (supplied, found) {
        return found
            .iter()
            .map(|label| {
                label
                    .clone()
                    .unwrap_or_else(|| axis.tick_placeholder().to_string())
            })
            .collect();
    }
    let (labels, warning) = reconcile_labels(supplied, count, axis);
    warnings.extend(warning);
    labels
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const STYLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" id="svg1" width="500" height="300">
  <g id="layer1" inkscape:groupmode="layer">
    <path id="path10" style="fill:#ffffff;stroke:none" d="M 0,0 H 500 V 300 H 0 Z"/>
    <path id="path11" style="fill:none;stroke:#262626" d="M 20,20 V 270"/>
    <path id="path12" style="fill:none;stroke:#262626" d="M 480,20 V 270"/>
    <path id="path13" style="fill:none;stroke:#262626" d="M 20,20 H 480"/>
    <path id="path14" style="fill:none;stroke:#262626" d="M 20,270 H 480"/>
    <path id="path15" style="fill:none;stroke:#b0b0b0" d="M 50,20 V 270"/>
    <path id="path16" style="fill:none;stroke:#b0b0b0" d="M 120,20 V 270"/>
    <path id="path17" style="fill:none;stroke:#ff0000" d="M 0,300 L 500,0"/>
    <path id="path18" style="fill:none;stroke:#00aa00" d="M 0,250 L 500,50"/>
    <path id="path19" style="fill:none;stroke:#0000ff" d="M 0,200 L 500,100"/>
    <text id="text20"><tspan id="tspan21">time</tspan></text>
  </g>
</svg>"##;

    const STYLE_REPORT: &str = "svg1,0,0,600,400
layer1,0,0,600,400
path10,0,0,600,400
path11,19.5,20,1,250
path12,479.5,20,1,250
path13,20,19.5,460,1
path14,20,269.5,460,1
path15,49.5,20,1,250
path16,119.5,20,1,250
path17,0,0,500,300
path18,0,50,500,200
path19,0,100,500,100
text20,230,285,40,10
tspan21,230,285,40,10
";

    fn style_config() -> RunConfig {
        let mut config = RunConfig::new(Preset::from_builtin("full").unwrap());
        config.bbox_find_color = Some("#262626".to_string());
        config.grid_find_color = Some("#b0b0b0".to_string());
        config
    }

    fn run_style(config: &RunConfig) -> Result<Outcome> {
        let doc = Document::parse(STYLE_SVG).unwrap();
        let report = GeometryReport::parse(STYLE_REPORT).unwrap();
        run(doc, &report, config)
    }

    fn tick_texts(doc: &Document) -> Vec<(f64, String)> {
        doc.elements()
            .into_iter()
            .filter(|el| el.is("text"))
            .filter(|el| matches!(el.attr("style"), Some(s) if s.contains("text-anchor:middle")))
            .filter(|el| el.text_content().len() == 1)
            .map(|el| {
                let x: f64 = el.attr("x").unwrap().parse().unwrap();
                (x, el.text_content())
            })
            .collect()
    }

    #[test]
    fn supplied_x_labels_land_on_grid_lines() {
        let mut config = style_config();
        config.x_ticks = Some(vec!["0".to_string(), "1".to_string()]);
        let outcome = run_style(&config).unwrap();

        assert!(outcome.warnings.is_empty());
        let scale = outcome.summary.scale;
        let ticks = tick_texts(&outcome.document);
        assert_eq!(ticks.len(), 2);
        assert!((ticks[0].0 * scale.scale_x - 50.0).abs() < 1e-4);
        assert_eq!(ticks[0].1, "0");
        assert!((ticks[1].0 * scale.scale_x - 120.0).abs() < 1e-4);
        assert_eq!(ticks[1].1, "1");
        assert_eq!(outcome.summary.plot_area, Rect::new(0.0, 0.0, 500.0, 300.0));
    }

    #[test]
    fn missing_label_is_padded_with_warning() {
        let mut config = style_config();
        config.x_ticks = Some(vec!["0".to_string()]);
        let outcome = run_style(&config).unwrap();

        assert_eq!(
            outcome.warnings,
            vec![Warning::TickLabelCount {
                axis: Axis::X,
                supplied: 1,
                found: 2
            }]
        );
        let texts: Vec<String> = tick_texts(&outcome.document).into_iter().map(|t| t.1).collect();
        assert_eq!(texts, vec!["0", "X"]);
    }

    #[test]
    fn original_palette_keeps_colors_and_lists_legend_entries() {
        let outcome = run_style(&style_config()).unwrap();
        let doc = &outcome.document;
        for (id, color) in [("path17", "#ff0000"), ("path18", "#00aa00"), ("path19", "#0000ff")] {
            let style = doc.find(id).unwrap().style();
            assert_eq!(style.stroke().color(), Some(color));
        }
        let entries: Vec<String> = doc
            .elements()
            .into_iter()
            .filter(|el| el.is("text") && el.text_content().starts_with("Entry"))
            .map(|el| el.text_content())
            .collect();
        assert_eq!(entries, vec!["Entry 1", "Entry 2", "Entry 3"]);
    }

    #[test]
    fn synthesized_ids_are_above_every_existing_id() {
        let outcome = run_style(&style_config()).unwrap();
        let original = Document::parse(STYLE_SVG).unwrap();
        let existing: Vec<String> = original
            .elements()
            .into_iter()
            .filter_map(|el| el.id().map(str::to_string))
            .collect();
        for el in outcome.document.elements() {
            let Some(id) = el.id() else { continue };
            if existing.iter().any(|e| e == id) {
                continue;
            }
            let n = crate::document::trailing_number(id).unwrap();
            assert!(n > 21, "{} reuses an existing number", id);
        }
    }

    #[test]
    fn noise_and_original_text_are_gone() {
        let outcome = run_style(&style_config()).unwrap();
        assert!(outcome.document.find("path10").is_none());
        assert!(outcome.document.find("text20").is_none());
        // The discovered label text is regenerated.
        assert!(
            outcome
                .document
                .elements()
                .into_iter()
                .any(|el| el.is("text") && el.text_content() == "time")
        );
    }

    #[test]
    fn exhausted_id_space_aborts() {
        let svg = STYLE_SVG.replace(r#"id="path19""#, r#"id="path18446744073709551615""#);
        let doc = Document::parse(&svg).unwrap();
        let report = GeometryReport::parse(STYLE_REPORT).unwrap();
        let err = run(doc, &report, &style_config()).unwrap_err();
        assert!(matches!(err, Error::IdOverflow { last: u64::MAX }));
    }

    #[test]
    fn oblique_grid_path_aborts() {
        let svg = STYLE_SVG.replace("M 120,20 V 270", "M 10,10 L 20,30");
        let doc = Document::parse(&svg).unwrap();
        let report = GeometryReport::parse(STYLE_REPORT).unwrap();
        let err = run(doc, &report, &style_config()).unwrap_err();
        assert!(matches!(err, Error::ObliquePath { ref id } if id == "path16"));
    }

    const POSITIONAL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" id="svg1" width="500" height="300">
  <g id="layer1" inkscape:groupmode="layer">
    <path id="path11" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 V 250"/>
    <path id="path12" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 460,20 V 250"/>
    <path id="path13" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,20 H 460"/>
    <path id="path14" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,250 H 460"/>
    <path id="path15" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 250,20 V 250"/>
    <path id="path16" style="fill:none;stroke:#b0b0b0;stroke-dasharray:2,2" d="M 40,135 H 460"/>
    <path id="path17" style="fill:none;stroke:#1f77b4" d="M 40,200 L 460,40"/>
    <text id="text20"><tspan id="tspan21">x label</tspan></text>
    <text id="text22"><tspan id="tspan23">y label</tspan></text>
    <text id="text24"><tspan id="tspan25">0</tspan></text>
    <text id="text26"><tspan id="tspan27">5</tspan></text>
    <text id="text28"><tspan id="tspan29">10</tspan></text>
    <text id="text30"><tspan id="tspan31">0.0</tspan></text>
    <text id="text32"><tspan id="tspan33">0.5</tspan></text>
    <text id="text34"><tspan id="tspan35">1.0</tspan></text>
  </g>
</svg>"##;

    const POSITIONAL_REPORT: &str = "svg1,0,0,500,300
layer1,0,0,500,300
path11,39.5,20,1,230
path12,459.5,20,1,230
path13,40,19.5,420,1
path14,40,249.5,420,1
path15,249.5,20,1,230
path16,40,134.5,420,1
path17,40,40,420,160
tspan21,230,280,40,10
tspan23,0,100,10,60
tspan25,35,255,10,8
tspan27,245,255,10,8
tspan29,452,255,16,8
tspan31,18,246,14,8
tspan33,18,131,14,8
tspan35,18,16,14,8
";

    fn run_positional(config: &RunConfig) -> Result<Outcome> {
        let doc = Document::parse(POSITIONAL_SVG).unwrap();
        let report = GeometryReport::parse(POSITIONAL_REPORT).unwrap();
        run(doc, &report, config)
    }

    fn all_texts(doc: &Document) -> Vec<(String, f64, f64)> {
        doc.elements()
            .into_iter()
            .filter(|el| el.is("text"))
            .map(|el| {
                let x: f64 = el.attr("x").unwrap().parse().unwrap();
                let y: f64 = el.attr("y").unwrap().parse().unwrap();
                (el.text_content(), x, y)
            })
            .collect()
    }

    #[test]
    fn found_tick_texts_stay_on_their_grid_lines() {
        let preset = Preset::from_builtin("full").unwrap();
        let tick_height = preset.ticks_size * crate::preset::PX_PER_PT;
        let outcome = run_positional(&RunConfig::new(preset)).unwrap();
        assert_eq!(outcome.summary.strategy, "positional");
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

        let texts = all_texts(&outcome.document);
        let contents: Vec<&str> = texts.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(contents, vec!["5", "0.5", "x label", "y label"]);

        let scale = outcome.summary.scale;
        assert!((texts[0].1 * scale.scale_x - 250.0).abs() < 1e-4);
        assert!((texts[1].2 * scale.scale_y - tick_height / 2.0 - 135.0).abs() < 1e-4);
    }

    #[test]
    fn supplied_labels_replace_found_ones_and_are_checked() {
        let mut config = RunConfig::new(Preset::from_builtin("full").unwrap());
        config.x_ticks = Some(vec!["a".to_string(), "b".to_string()]);
        let outcome = run_positional(&config).unwrap();

        assert_eq!(
            outcome.warnings,
            vec![Warning::TickLabelCount {
                axis: Axis::X,
                supplied: 2,
                found: 1
            }]
        );
        let contents: Vec<String> = all_texts(&outcome.document).into_iter().map(|t| t.0).collect();
        assert_eq!(contents, vec!["a", "0.5", "x label", "y label"]);
    }

    #[test]
    fn positional_run_has_no_legend() {
        let mut config = style_config();
        config.classifier = ClassifierKind::Positional;
        let svg = STYLE_SVG.replace("stroke:#262626\"", "stroke:#262626;stroke-dasharray:2,2\"");
        let doc = Document::parse(&svg).unwrap();
        let report = GeometryReport::parse(STYLE_REPORT).unwrap();
        let outcome = run(doc, &report, &config).unwrap();
        assert_eq!(outcome.summary.strategy, "positional");
        assert!(
            !outcome
                .document
                .elements()
                .into_iter()
                .any(|el| el.is("marker"))
        );
    }
}
