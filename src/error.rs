use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SVG parse error: {message}")]
    Xml { message: String },

    #[error("Malformed geometry report at line {line}: {reason}")]
    MalformedReport { line: usize, reason: String },

    #[error("Geometry report contains no numbered element id to seed new ids from")]
    MissingIdSeed,

    #[error("No element id is left above {last}")]
    IdOverflow { last: u64 },

    #[error("Geometry query failed: {message}")]
    QueryFailed { message: String },

    #[error("Geometry query did not finish within {seconds}s")]
    QueryTimeout { seconds: u64 },

    #[error("Unknown format '{name}'. Available: {available}")]
    UnknownFormat { name: String, available: String },

    #[error("Unknown color palette '{name}'. Available: {available}")]
    UnknownPalette { name: String, available: String },

    #[error("Invalid length '{value}'")]
    InvalidLength { value: String },

    #[error("Invalid preset: {message}")]
    InvalidPreset { message: String },

    #[error("Oblique path '{id}' found among the grid/bounding box lines")]
    ObliquePath { id: String },

    #[error("Expected zero or two corner tick labels, found {count}")]
    CornerTicks { count: usize },

    #[error("Could not locate the plot frame: {message}")]
    MissingFrame { message: String },

    #[error("Plot area is empty or degenerate ({width} x {height})")]
    InvalidPlotArea { width: f64, height: f64 },

    #[error("Export failed: {message}")]
    Export { message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
