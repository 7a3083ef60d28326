//! Lubricentro product (stocked inventory row) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::decode::Record;
use crate::validation::{
    validate_not_blank_field, validate_price, validate_price_field, validate_stock,
    validate_stock_field,
};

/// Predefined product categories
pub const PRODUCT_CATEGORIES: [&str; 7] = [
    "Aceites",
    "Filtros",
    "Lubricantes",
    "Aditivos",
    "Líquido de freno",
    "Refrigerantes",
    "Otros",
];

/// Category whose products carry a filter type
pub const FILTER_CATEGORY: &str = "Filtros";

/// Kind of filter, only meaningful for the "Filtros" category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    Aire,
    Aceite,
    Combustible,
    #[serde(rename = "Habitáculo")]
    Habitaculo,
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterType::Aire => write!(f, "Aire"),
            FilterType::Aceite => write!(f, "Aceite"),
            FilterType::Combustible => write!(f, "Combustible"),
            FilterType::Habitaculo => write!(f, "Habitáculo"),
        }
    }
}

/// A stocked, priced product sold through the lubricentro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "categoria")]
    pub category: String,
    /// Units on hand, authoritative, never negative
    pub stock: i64,
    #[serde(rename = "precioCosto")]
    pub cost_price: Decimal,
    #[serde(rename = "precioVenta")]
    pub sale_price: Decimal,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Vehicle models the product fits (filters)
    #[serde(rename = "aplicaciones", default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<String>,
    #[serde(rename = "tipoFiltro", default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<FilterType>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    const KIND: &'static str = "producto";

    fn id(&self) -> Uuid {
        self.id
    }

    fn check(&self) -> Result<(), String> {
        validate_stock(self.stock)?;
        validate_price(self.cost_price)?;
        validate_price(self.sale_price)?;
        Ok(())
    }
}

impl Product {
    pub fn from_input(id: Uuid, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: input.code,
            description: input.description,
            brand: input.brand,
            category: input.category,
            stock: input.stock,
            cost_price: input.cost_price,
            sale_price: input.sale_price,
            location: input.location,
            applications: input.applications,
            filter_type: input.filter_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name used in user-facing messages: description, else code, else id
    pub fn display_name(&self) -> String {
        if !self.description.trim().is_empty() {
            self.description.clone()
        } else if !self.code.trim().is_empty() {
            self.code.clone()
        } else {
            self.id.to_string()
        }
    }

    pub fn is_filter(&self) -> bool {
        self.category == FILTER_CATEGORY
    }

    /// Value of the units on hand at cost
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.stock).saturating_mul(self.cost_price)
    }

    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(cost_price) = patch.cost_price {
            self.cost_price = cost_price;
        }
        if let Some(sale_price) = patch.sale_price {
            self.sale_price = sale_price;
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(applications) = patch.applications {
            self.applications = applications;
        }
        if let Some(filter_type) = patch.filter_type {
            self.filter_type = Some(filter_type);
        }
        self.updated_at = now;
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[serde(rename = "codigo")]
    #[validate(custom = "validate_not_blank_field")]
    pub code: String,
    #[serde(rename = "descripcion")]
    #[validate(custom = "validate_not_blank_field")]
    pub description: String,
    #[serde(rename = "marca", default)]
    pub brand: String,
    #[serde(rename = "categoria")]
    #[validate(custom = "validate_not_blank_field")]
    pub category: String,
    #[serde(default)]
    #[validate(custom = "validate_stock_field")]
    pub stock: i64,
    #[serde(rename = "precioCosto", default)]
    #[validate(custom = "validate_price_field")]
    pub cost_price: Decimal,
    #[serde(rename = "precioVenta", default)]
    #[validate(custom = "validate_price_field")]
    pub sale_price: Decimal,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "aplicaciones", default)]
    pub applications: Vec<String>,
    #[serde(rename = "tipoFiltro", default)]
    pub filter_type: Option<FilterType>,
}

/// Input for updating a product; stock edits here are manual corrections
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductPatch {
    #[serde(rename = "codigo", default)]
    #[validate(custom = "validate_not_blank_field")]
    pub code: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_stock_field")]
    pub stock: Option<i64>,
    #[serde(rename = "precioCosto", default)]
    #[validate(custom = "validate_price_field")]
    pub cost_price: Option<Decimal>,
    #[serde(rename = "precioVenta", default)]
    #[validate(custom = "validate_price_field")]
    pub sale_price: Option<Decimal>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "aplicaciones", default)]
    pub applications: Option<Vec<String>>,
    #[serde(rename = "tipoFiltro", default)]
    pub filter_type: Option<FilterType>,
}
