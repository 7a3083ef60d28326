//! Report computations: weekly sales, filter stock and dashboard counts

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Annotation, AnnotationType, FilterType, Product};
use crate::types::DateRange;

/// Markup assumed when a line has no product to take the cost from
pub fn default_estimated_markup() -> Decimal {
    Decimal::new(15, 1)
}

/// One row of the sales report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    #[serde(rename = "precioCosto")]
    pub cost_price: Decimal,
    #[serde(rename = "precioVenta")]
    pub sale_price: Decimal,
    #[serde(rename = "ganancia")]
    pub profit: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(rename = "totalVentas")]
    pub total_sales: Decimal,
    #[serde(rename = "totalCostos")]
    pub total_costs: Decimal,
    #[serde(rename = "totalGanancias")]
    pub total_profit: Decimal,
    /// Profit over sales, in percent with one decimal
    #[serde(rename = "margenPromedio")]
    pub average_margin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "periodo")]
    pub period: DateRange,
    #[serde(rename = "lineas")]
    pub lines: Vec<ReportLine>,
    #[serde(rename = "resumen")]
    pub summary: ReportSummary,
}

/// Price a single annotation line.
///
/// Lubricentro lines linked to a product take cost and sale price from the
/// product (zero when the product no longer exists). Every other line sells at
/// its own price and its cost is estimated as `price / markup`.
fn report_line(
    annotation: &Annotation,
    item: &crate::models::AnnotationItem,
    products: &HashMap<Uuid, &Product>,
    markup: Decimal,
) -> ReportLine {
    let (cost_price, sale_price) = match item.product_id {
        Some(product_id) if annotation.kind == AnnotationType::Lubricentro => products
            .get(&product_id)
            .map(|p| (p.cost_price, p.sale_price))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO)),
        _ => {
            let sale = item.unit_price.unwrap_or(Decimal::ZERO);
            let cost = sale.checked_div(markup).unwrap_or(sale);
            (cost, sale)
        }
    };

    let quantity = match item.quantity {
        Some(q) if q != 0 => q,
        _ => 1,
    };
    let qty = Decimal::from(quantity);

    ReportLine {
        date: annotation.date,
        description: item.description.clone(),
        quantity,
        cost_price,
        sale_price,
        profit: sale_price.saturating_sub(cost_price).saturating_mul(qty),
        subtotal: sale_price.saturating_mul(qty),
    }
}

pub fn summarize(lines: &[ReportLine]) -> ReportSummary {
    let total_sales = lines
        .iter()
        .map(|l| l.subtotal)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let total_profit = lines
        .iter()
        .map(|l| l.profit)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let total_costs: Decimal = lines
        .iter()
        .map(|l| l.cost_price.saturating_mul(Decimal::from(l.quantity)))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    let average_margin = if total_sales > Decimal::ZERO {
        (total_profit / total_sales)
            .saturating_mul(Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    };

    ReportSummary {
        total_sales,
        total_costs,
        total_profit,
        average_margin,
    }
}

/// Build the sales report for the annotations of a period
pub fn build_sales_report(
    title: &str,
    period: DateRange,
    annotations: &[Annotation],
    products: &[Product],
    markup: Decimal,
) -> SalesReport {
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let lines: Vec<ReportLine> = annotations
        .iter()
        .flat_map(|annotation| {
            annotation
                .items
                .iter()
                .map(|item| report_line(annotation, item, &by_id, markup))
                .collect::<Vec<_>>()
        })
        .collect();

    let summary = summarize(&lines);

    SalesReport {
        title: title.to_string(),
        period,
        lines,
        summary,
    }
}

/// File name of the exported sales report
pub fn sales_report_file_name(period: &DateRange, extension: &str) -> String {
    format!(
        "GTM_Reporte_Semanal_{}_{}.{}",
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d"),
        extension
    )
}

// ============================================================================
// Filter stock report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub stock: i64,
    #[serde(rename = "tipoFiltro", skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<FilterType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiltersByType {
    pub aceite: Vec<FilterEntry>,
    pub combustible: Vec<FilterEntry>,
    pub aire: Vec<FilterEntry>,
    pub habitaculo: Vec<FilterEntry>,
}

/// Decide the group of a filter, falling back to its description
pub fn classify_filter(product: &Product) -> FilterType {
    if let Some(kind) = product.filter_type {
        return kind;
    }
    let description = product.description.to_lowercase();
    if description.contains("aceite") {
        FilterType::Aceite
    } else if description.contains("combustible")
        || description.contains("nafta")
        || description.contains("diesel")
    {
        FilterType::Combustible
    } else {
        // "aire" and anything unclear
        FilterType::Aire
    }
}

/// Group the products of the "Filtros" category by filter type
pub fn organize_filters(products: &[Product]) -> FiltersByType {
    let mut groups = FiltersByType::default();

    for product in products.iter().filter(|p| p.is_filter()) {
        let entry = FilterEntry {
            code: product.code.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            stock: product.stock,
            filter_type: product.filter_type,
        };
        match classify_filter(product) {
            FilterType::Aceite => groups.aceite.push(entry),
            FilterType::Combustible => groups.combustible.push(entry),
            FilterType::Aire => groups.aire.push(entry),
            FilterType::Habitaculo => groups.habitaculo.push(entry),
        }
    }

    for group in [
        &mut groups.aceite,
        &mut groups.combustible,
        &mut groups.aire,
        &mut groups.habitaculo,
    ] {
        group.sort_by(|a, b| a.description.cmp(&b.description));
    }

    groups
}

// ============================================================================
// Dashboard counts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryCounts {
    #[serde(rename = "lubricentroProductos")]
    pub products: usize,
    #[serde(rename = "tallerItems")]
    pub workshop_items: usize,
    #[serde(rename = "herramientas")]
    pub tools: usize,
    #[serde(rename = "lowStockItems")]
    pub low_stock_items: usize,
    #[serde(rename = "totalInventoryValue")]
    pub total_inventory_value: i64,
}

pub fn inventory_counts(
    products: &[Product],
    workshop_items: usize,
    tools: usize,
    low_stock_threshold: Option<i64>,
) -> InventoryCounts {
    let total = products
        .iter()
        .map(Product::stock_value)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let low_stock_items = low_stock_threshold
        .map(|threshold| products.iter().filter(|p| p.stock <= threshold).count())
        .unwrap_or(0);

    InventoryCounts {
        products: products.len(),
        workshop_items,
        tools,
        low_stock_items,
        total_inventory_value: total
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(i64::MAX),
    }
}
