//! WebAssembly module for the GTM administration system
//!
//! Provides client-side computation for:
//! - Annotation totals while a form is being filled in
//! - Filtering the annotation list without a round trip
//! - Sales report previews
//! - Week ranges for the report shortcuts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::filters::AnnotationFilter;
use shared::models::{compute_total, Annotation, AnnotationItem, Product};
use shared::report::{build_sales_report, classify_filter, default_estimated_markup};
use shared::types::DateRange;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn to_js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("Fecha inválida \"{}\": {}", value, e))
}

fn range_json(range: &DateRange) -> Result<String, String> {
    serde_json::to_string(range).map_err(|e| e.to_string())
}

fn total_of(items_json: &str) -> Result<String, String> {
    let items: Vec<AnnotationItem> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;
    Ok(compute_total(&items).to_string())
}

fn filtered(annotations_json: &str, search: Option<String>, tipo: Option<String>) -> Result<String, String> {
    let annotations: Vec<Annotation> = serde_json::from_str(annotations_json)
        .map_err(|e| format!("Invalid annotations JSON: {}", e))?;
    let filter = AnnotationFilter { search, tipo };
    let matching: Vec<&Annotation> = annotations.iter().filter(|a| filter.matches(a)).collect();
    serde_json::to_string(&matching).map_err(|e| e.to_string())
}

fn report(
    annotations_json: &str,
    products_json: &str,
    start: &str,
    end: &str,
    markup: Option<String>,
) -> Result<String, String> {
    let range = DateRange::new(parse_date(start)?, parse_date(end)?).map_err(str::to_string)?;
    let annotations: Vec<Annotation> = serde_json::from_str(annotations_json)
        .map_err(|e| format!("Invalid annotations JSON: {}", e))?;
    let products: Vec<Product> = serde_json::from_str(products_json)
        .map_err(|e| format!("Invalid products JSON: {}", e))?;
    let markup = match markup {
        Some(value) => value
            .parse::<Decimal>()
            .map_err(|e| format!("Invalid markup: {}", e))?,
        None => default_estimated_markup(),
    };

    let in_range: Vec<Annotation> = annotations
        .into_iter()
        .filter(|a| range.contains(a.date))
        .collect();
    let report = build_sales_report("", range, &in_range, &products, markup);
    serde_json::to_string(&report).map_err(|e| e.to_string())
}

/// Total of an annotation's items (JSON array), as a decimal string
#[wasm_bindgen]
pub fn annotation_total(items_json: &str) -> Result<String, JsValue> {
    total_of(items_json).map_err(to_js_error)
}

/// Filter a JSON array of annotations by search text and `tipo`
#[wasm_bindgen]
pub fn filter_annotations(
    annotations_json: &str,
    search: Option<String>,
    tipo: Option<String>,
) -> Result<String, JsValue> {
    filtered(annotations_json, search, tipo).map_err(to_js_error)
}

/// Sales report for the annotations dated between `inicio` and `fin`
#[wasm_bindgen]
pub fn sales_report(
    annotations_json: &str,
    products_json: &str,
    inicio: &str,
    fin: &str,
    markup: Option<String>,
) -> Result<String, JsValue> {
    report(annotations_json, products_json, inicio, fin, markup).map_err(to_js_error)
}

/// Filter group ("Aceite", "Combustible", "Aire", "Habitáculo") of a product
#[wasm_bindgen]
pub fn filter_group(product_json: &str) -> Result<String, JsValue> {
    let product: Product = serde_json::from_str(product_json)
        .map_err(|e| to_js_error(format!("Invalid product JSON: {}", e)))?;
    Ok(classify_filter(&product).to_string())
}

/// Monday to Sunday of the week containing `fecha` (YYYY-MM-DD)
#[wasm_bindgen]
pub fn week_of(fecha: &str) -> Result<String, JsValue> {
    parse_date(fecha)
        .and_then(|date| range_json(&DateRange::week_of(date)))
        .map_err(to_js_error)
}

/// Current week according to the browser clock
#[wasm_bindgen]
pub fn current_week() -> Result<String, JsValue> {
    range_json(&DateRange::week_of(browser_today()?)).map_err(to_js_error)
}

/// Previous week according to the browser clock
#[wasm_bindgen]
pub fn previous_week() -> Result<String, JsValue> {
    range_json(&DateRange::previous_week_of(browser_today()?)).map_err(to_js_error)
}

fn browser_today() -> Result<NaiveDate, JsValue> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .ok_or_else(|| to_js_error("Fecha del navegador inválida".to_string()))
}
