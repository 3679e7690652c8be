//! Providers of the per-element geometry report (`id,x,y,width,height`).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use resvg::usvg;
use tracing::debug;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::export::load_fonts;
use crate::geometry::GeometryReport;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub trait GeometryQuery {
    fn name(&self) -> &'static str;

    /// Report for the document at `path` whose content is `source`.
    fn query(&self, path: &Path, source: &str) -> Result<GeometryReport>;
}

/// Bounding boxes computed in-process with usvg.
#[derive(Debug, Clone, Default)]
pub struct UsvgQuery;

impl UsvgQuery {
    /// Report lines in document user units.
    pub fn report_text(&self, source: &str) -> Result<String> {
        // Without a viewBox nothing is scaled to the declared size.
        let mut doc = Document::parse(source)?;
        doc.root.remove_attr("viewBox");
        doc.root.set_attr("width", "1");
        doc.root.set_attr("height", "1");

        let mut opts = usvg::Options::default();
        load_fonts(opts.fontdb_mut());
        let tree = usvg::Tree::from_str(&doc.to_svg_string(), &opts).map_err(|e| {
            Error::QueryFailed {
                message: format!("usvg could not load the document: {}", e),
            }
        })?;

        let mut out = String::new();
        collect_boxes(tree.root(), &mut out);
        debug!(lines = out.lines().count(), "usvg geometry report");
        Ok(out)
    }
}

fn collect_boxes(group: &usvg::Group, out: &mut String) {
    for node in group.children() {
        if !node.id().is_empty() {
            let b = node.abs_stroke_bounding_box();
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                node.id(),
                b.x(),
                b.y(),
                b.width(),
                b.height()
            ));
        }
        if let usvg::Node::Group(child) = node {
            collect_boxes(child, out);
        }
    }
}

impl GeometryQuery for UsvgQuery {
    fn name(&self) -> &'static str {
        "usvg"
    }

    fn query(&self, _path: &Path, source: &str) -> Result<GeometryReport> {
        GeometryReport::parse(&self.report_text(source)?)
    }
}

/// `inkscape --query-all`, killed when it runs past the timeout.
#[derive(Debug, Clone)]
pub struct InkscapeQuery {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl InkscapeQuery {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("inkscape"),
            timeout,
        }
    }

    fn run(&self, path: &Path) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("--query-all")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::QueryFailed {
                message: format!("cannot start {}: {}", self.program.display(), e),
            })?;

        // Drain stdout concurrently so a large report cannot block the child.
        let mut stdout = child.stdout.take().ok_or_else(|| Error::QueryFailed {
            message: "child stdout was not captured".to_string(),
        })?;
        let reader = thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(|e| Error::QueryFailed {
                message: e.to_string(),
            })? {
                Some(status) => break status,
                None if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::QueryTimeout {
                        seconds: self.timeout.as_secs(),
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let output = reader
            .join()
            .map_err(|_| Error::QueryFailed {
                message: "report reader panicked".to_string(),
            })?
            .map_err(|e| Error::QueryFailed {
                message: format!("cannot read report: {}", e),
            })?;

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(Error::QueryFailed {
                message: format!("{} exited with {}: {}", self.program.display(), status, stderr.trim()),
            });
        }
        Ok(output)
    }
}

impl GeometryQuery for InkscapeQuery {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn query(&self, path: &Path, _source: &str) -> Result<GeometryReport> {
        debug!(program = %self.program.display(), file = %path.display(), "querying geometry");
        GeometryReport::parse(&self.run(path)?)
    }
}

/// A report computed ahead of time and stored in a file.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub path: PathBuf,
}

impl GeometryQuery for ReportFile {
    fn name(&self) -> &'static str {
        "report"
    }

    fn query(&self, _path: &Path, _source: &str) -> Result<GeometryReport> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        GeometryReport::parse(&text)
    }
}
