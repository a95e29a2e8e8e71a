#![cfg(target_arch = "wasm32")]

use gpx_codec::{merge_gpx, normalize_gpx};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

const V10: &str = r#"<gpx version="1.0"><wpt lat="1" lon="2"><name>A</name></wpt></gpx>"#;
const V11: &str = r#"<gpx version="1.1"><wpt lat="3" lon="4"><name>B</name></wpt></gpx>"#;

#[wasm_bindgen_test]
fn normalize_with_default_options() {
    let out = normalize_gpx(V10, JsValue::UNDEFINED).unwrap();
    assert!(out.contains(r#"version="1.0""#));
    assert!(out.contains(r#"<wpt lat="1.000000000" lon="2.000000000">"#));
}

#[wasm_bindgen_test]
fn normalize_with_options_object() {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"gpxver".into(), &"1.1".into()).unwrap();
    js_sys::Reflect::set(&options, &"elevprec".into(), &JsValue::from_f64(1.0)).unwrap();
    let out = normalize_gpx(V10, options.into()).unwrap();
    assert!(out.contains(r#"version="1.1""#));
}

#[wasm_bindgen_test]
fn merge_documents() {
    let inputs = js_sys::Array::new();
    inputs.push(&V10.into());
    inputs.push(&V11.into());
    let out = merge_gpx(inputs, JsValue::NULL).unwrap();
    assert!(out.contains(r#"version="1.1""#));
    assert!(out.contains("<name>A</name>"));
    assert!(out.contains("<name>B</name>"));
}

#[wasm_bindgen_test]
fn merge_rejects_non_strings() {
    let inputs = js_sys::Array::new();
    inputs.push(&JsValue::from_f64(1.0));
    assert!(merge_gpx(inputs, JsValue::NULL).is_err());
}

#[wasm_bindgen_test]
fn malformed_input_is_an_error() {
    assert!(normalize_gpx("<gpx><wpt></gpx>", JsValue::UNDEFINED).is_err());
}
