//! Annotation (expense / sale record) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::decode::Record;
use crate::validation::{validate_not_blank_field, validate_price_field, validate_quantity_field};

/// Kind of annotation; only `Lubricentro` sales move stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationType {
    Lubricentro,
    GastosAlquiler,
    Taller,
    Otro,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 4] = [
        AnnotationType::Lubricentro,
        AnnotationType::GastosAlquiler,
        AnnotationType::Taller,
        AnnotationType::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Lubricentro => "LUBRICENTRO",
            AnnotationType::GastosAlquiler => "GASTOS_ALQUILER",
            AnnotationType::Taller => "TALLER",
            AnnotationType::Otro => "OTRO",
        }
    }

    /// Whether creating or cancelling this kind of annotation touches stock
    pub fn adjusts_stock(&self) -> bool {
        matches!(self, AnnotationType::Lubricentro)
    }
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().replace('_', " "))
    }
}

impl std::str::FromStr for AnnotationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Tipo de anotación desconocido: {}", s))
    }
}

/// One line of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnnotationItem {
    #[serde(rename = "descripcion")]
    pub description: String,

    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_quantity_field")]
    pub quantity: Option<i64>,

    #[serde(rename = "precio", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_price_field")]
    pub unit_price: Option<Decimal>,

    /// Unit label (lts, unidades, ...)
    #[serde(rename = "unidad", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Link to a lubricentro product whose stock this line moves
    #[serde(rename = "productoId", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
}

impl AnnotationItem {
    /// Line subtotal; missing quantity or price count as zero. Saturates
    /// instead of overflowing on unvalidated input.
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity.unwrap_or(0))
            .saturating_mul(self.unit_price.unwrap_or(Decimal::ZERO))
    }
}

/// A recorded expense, sale or workshop event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "tipo")]
    pub kind: AnnotationType,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub items: Vec<AnnotationItem>,
    pub total: Decimal,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Annotation {
    const KIND: &'static str = "anotación";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Annotation {
    /// Build a new annotation from validated input
    pub fn from_input(id: Uuid, input: NewAnnotation, now: DateTime<Utc>) -> Self {
        let total = if input.items.is_empty() {
            input.total.unwrap_or(Decimal::ZERO)
        } else {
            compute_total(&input.items)
        };

        Self {
            id,
            date: input.date.unwrap_or_else(|| now.date_naive()),
            kind: input.kind,
            title: input.title,
            description: input.description,
            items: input.items,
            total,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Stock is never touched here.
    pub fn apply_patch(&mut self, patch: AnnotationPatch, now: DateTime<Utc>) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        let items_changed = patch.items.is_some();
        if let Some(items) = patch.items {
            self.items = items;
        }
        match patch.total {
            Some(total) => self.total = total,
            None if items_changed => self.total = compute_total(&self.items),
            None => {}
        }
        self.updated_at = now;
    }

    /// Stock movements this annotation implies, empty unless it is a lubricentro sale
    pub fn stock_movements(&self) -> Vec<StockMovement> {
        if !self.kind.adjusts_stock() {
            return Vec::new();
        }
        stock_movements(&self.items)
    }
}

/// Input for creating an annotation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAnnotation {
    /// Defaults to today when absent
    #[serde(rename = "fecha", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "tipo")]
    pub kind: AnnotationType,
    #[serde(rename = "titulo")]
    #[validate(custom = "validate_not_blank_field")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(default)]
    #[validate]
    pub items: Vec<AnnotationItem>,
    /// Only used when there are no items to compute it from
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Input for updating an annotation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AnnotationPatch {
    #[serde(rename = "fecha", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<AnnotationType>,
    #[serde(rename = "titulo", default)]
    #[validate(custom = "validate_not_blank_field")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<AnnotationItem>>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Net quantity of one product moved by an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Sum of line subtotals
pub fn compute_total(items: &[AnnotationItem]) -> Decimal {
    items
        .iter()
        .map(AnnotationItem::subtotal)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Aggregate the stock-relevant lines per product, in first-seen order.
///
/// Lines without a product reference or without a positive quantity are
/// ignored. Sums saturate at `i64::MAX`, which no stock can cover.
pub fn stock_movements(items: &[AnnotationItem]) -> Vec<StockMovement> {
    let mut movements: Vec<StockMovement> = Vec::new();
    for item in items {
        let (Some(product_id), Some(quantity)) = (item.product_id, item.quantity) else {
            continue;
        };
        if quantity <= 0 {
            continue;
        }
        match movements.iter_mut().find(|m| m.product_id == product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => movements.push(StockMovement {
                product_id,
                quantity,
            }),
        }
    }
    movements
}
