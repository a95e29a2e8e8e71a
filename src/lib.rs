mod error;
mod metadata;
pub mod model;
mod options;
mod parser;
pub mod preserved;
mod session;
mod shortname;
mod tags;
pub mod time;
pub mod vocab;
mod writer;

use wasm_bindgen::prelude::*;

pub use crate::error::{GpxError, Result};
pub use crate::metadata::{GlobalMetadata, MetaField};
pub use crate::options::GpxOptions;
pub use crate::parser::parse_gpx;
pub use crate::session::{GpxSession, GpxVersion};
pub use crate::shortname::ShortNamer;
pub use crate::tags::{lookup as lookup_tag, Tag, TagEntry};

/// Read every document in `inputs` into one session and write the merged
/// result as a single GPX document.
pub fn convert<S: AsRef<str>>(inputs: &[S], options: &GpxOptions) -> Result<String> {
    let mut session = GpxSession::new(options.clone());
    for (i, xml) in inputs.iter().enumerate() {
        session.read(&format!("input #{}", i + 1), xml.as_ref())?;
    }
    session.write()
}

/// Re-write a single GPX document, returned as an XML string.
#[wasm_bindgen(js_name = normalizeGpx)]
pub fn normalize_gpx(gpx_string: &str, options: JsValue) -> std::result::Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    Ok(convert(&[gpx_string], &opts)?)
}

/// Merge an array of GPX document strings into one GPX document.
#[wasm_bindgen(js_name = mergeGpx)]
pub fn merge_gpx(inputs: js_sys::Array, options: JsValue) -> std::result::Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let documents = inputs
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .as_string()
                .ok_or_else(|| JsValue::from_str(&format!("input #{} is not a string", i + 1)))
        })
        .collect::<std::result::Result<Vec<String>, JsValue>>()?;
    Ok(convert(&documents, &opts)?)
}

fn parse_options(options: JsValue) -> std::result::Result<GpxOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(GpxOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
