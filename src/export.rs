use std::path::Path;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{Error, Result};

/// Loads system fonts plus a local `fonts/` directory into a fontdb
/// `Database` and maps the generic families onto installed ones. resvg and
/// svg2pdf each link their own fontdb, so this is expanded per type.
macro_rules! load_fonts_into {
    ($db:expr) => {{
        let db = $db;
        db.load_system_fonts();
        let local = Path::new("fonts");
        if local.is_dir() {
            db.load_fonts_dir(local);
        }

        let fallbacks =
            FontFallbacks::pick(db.faces().flat_map(|f| f.families.iter().map(|(n, _)| n.as_str())));
        if let Some(family) = &fallbacks.sans_serif {
            db.set_sans_serif_family(family);
        }
        if let Some(family) = &fallbacks.serif {
            db.set_serif_family(family);
        }
        if let Some(family) = &fallbacks.monospace {
            db.set_monospace_family(family);
        }
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    /// Format selected by the output file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::Export {
                message: format!("output file {} has no extension", path.display()),
            })?;
        match ext.as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::Export {
                message: format!("unsupported output format: .{} (use .svg, .png or .pdf)", other),
            }),
        }
    }
}

pub fn render(svg: &str, format: OutputFormat, png_scale: f32) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => Ok(svg.as_bytes().to_vec()),
        OutputFormat::Png => svg_to_png(svg, png_scale),
        OutputFormat::Pdf => svg_to_pdf(svg),
    }
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Export {
            message: format!("invalid PNG scale: {}", scale),
        });
    }

    let mut opts = usvg::Options::default();
    load_fonts(opts.fontdb_mut());

    let tree = usvg::Tree::from_str(svg, &opts).map_err(|e| Error::Export {
        message: format!("failed to parse SVG: {}", e),
    })?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| Error::Export {
        message: format!("cannot allocate a {}x{} pixmap", width, height),
    })?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| Error::Export {
        message: format!("failed to encode PNG: {}", e),
    })
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut db = svg2pdf::usvg::fontdb::Database::new();
    load_fonts_into!(&mut db);

    let mut opts = svg2pdf::usvg::Options::default();
    opts.fontdb = std::sync::Arc::new(db);
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts).map_err(|e| Error::Export {
        message: format!("failed to parse SVG: {}", e),
    })?;

    // Glyphs become paths; no font embedding.
    let mut options = svg2pdf::ConversionOptions::default();
    options.embed_text = false;
    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default()).map_err(|e| Error::Export {
        message: format!("failed to convert SVG to PDF: {}", e),
    })
}

pub(crate) fn load_fonts(db: &mut usvg::fontdb::Database) {
    load_fonts_into!(db);
}

/// Installed families standing in for `sans-serif`, `serif` and `monospace`.
#[derive(Debug, Default, PartialEq)]
struct FontFallbacks {
    sans_serif: Option<String>,
    serif: Option<String>,
    monospace: Option<String>,
}

impl FontFallbacks {
    fn pick<'a>(families: impl IntoIterator<Item = &'a str>) -> Self {
        let mut first = None;
        let mut sans = None;
        let mut serif = None;
        let mut mono = None;

        for family in families {
            first.get_or_insert(family);
            let lower = family.to_ascii_lowercase();
            if sans.is_none() && lower.contains("sans") {
                sans = Some(family);
            }
            if serif.is_none() && lower.contains("serif") && !lower.contains("sans") {
                serif = Some(family);
            }
            if mono.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono = Some(family);
            }
        }

        Self {
            sans_serif: sans.or(first).map(str::to_string),
            serif: serif.or(first).map(str::to_string),
            monospace: mono.or(sans).or(first).map(str::to_string),
        }
    }
}
