//! Tool (herramienta) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::decode::Record;
use crate::validation::{validate_not_blank_field, validate_quantity, validate_quantity_field};

/// Predefined tool categories
pub const TOOL_CATEGORIES: [&str; 7] = [
    "Llaves y Dados",
    "Herramientas Eléctricas",
    "Herramientas Neumáticas",
    "Instrumentos de Medición",
    "Herramientas Manuales",
    "Equipamiento Específico",
    "Otras",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Tool {
    const KIND: &'static str = "herramienta";

    fn id(&self) -> Uuid {
        self.id
    }

    fn check(&self) -> Result<(), String> {
        validate_quantity(self.quantity)?;
        Ok(())
    }
}

impl Tool {
    pub fn from_input(id: Uuid, input: NewTool, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            brand: input.brand,
            model: input.model,
            category: input.category,
            quantity: input.quantity,
            location: input.location,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: ToolPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTool {
    #[serde(rename = "nombre")]
    #[validate(custom = "validate_not_blank_field")]
    pub name: String,
    #[serde(rename = "marca", default)]
    pub brand: String,
    #[serde(rename = "modelo", default)]
    pub model: String,
    #[serde(rename = "categoria")]
    #[validate(custom = "validate_not_blank_field")]
    pub category: String,
    #[serde(rename = "cantidad", default)]
    #[validate(custom = "validate_quantity_field")]
    pub quantity: i64,
    #[serde(rename = "ubicacion", default)]
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ToolPatch {
    #[serde(rename = "nombre", default)]
    #[validate(custom = "validate_not_blank_field")]
    pub name: Option<String>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "cantidad", default)]
    #[validate(custom = "validate_quantity_field")]
    pub quantity: Option<i64>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
}
