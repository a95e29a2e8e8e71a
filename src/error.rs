use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, GpxError>;

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("read error: {source} (file: {file}, line: {line}, column: {column})")]
    XmlParse {
        file: String,
        line: usize,
        column: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("premature end of document (file: {file}, line: {line}, column: {column})")]
    UnexpectedEof {
        file: String,
        line: usize,
        column: usize,
    },

    #[error("gpx version number of '{0}' not valid")]
    InvalidVersion(String),

    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 1-based line and column of a byte offset into `input`.
pub(crate) fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = &input.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, offset - line_start + 1)
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
