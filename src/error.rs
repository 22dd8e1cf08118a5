//! Error type shared by loading, normalization, layout and rendering.

custom_error::custom_error! {
    /// Everything that can abort a load, transform or render request
    pub HistError
    Io{source: std::io::Error} = "I/O error: {source}",
    Parse{line: usize, reason: String} = "parse error on line {line}: {reason}",
    DegenerateRange{what: String} = "degenerate range: {what}",
    Domain{row: usize, value: f64} = "negative count {value} at row {row} cannot be log-normalized",
    ShapeMismatch{expected: usize, actual: usize} = "grid layout expects {expected} entries, got {actual}",
    InvalidParameter{reason: String} = "invalid parameter: {reason}",
    Json{source: serde_json::Error} = "JSON error: {source}",
    Render{message: String} = "rendering failed: {message}",
}

pub type Result<T> = std::result::Result<T, HistError>;
