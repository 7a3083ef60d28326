//! Workshop inventory (inventario taller) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::decode::Record;
use crate::validation::{validate_not_blank_field, validate_quantity, validate_quantity_field};

/// Predefined workshop item kinds
pub const WORKSHOP_ITEM_TYPES: [&str; 8] = [
    "Herramienta Manual",
    "Herramienta Eléctrica",
    "Herramienta de Medición",
    "Equipos de Taller",
    "Equipos Tecnológicos",
    "Muebles",
    "Repuestos",
    "Otros",
];

/// An item owned by the workshop. Only the name is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopItem {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record for WorkshopItem {
    const KIND: &'static str = "item de taller";

    fn id(&self) -> Uuid {
        self.id
    }

    fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("nombre vacío".to_string());
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        Ok(())
    }
}

impl WorkshopItem {
    pub fn from_input(id: Uuid, input: NewWorkshopItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            kind: input.kind,
            brand: input.brand,
            quantity: input.quantity,
            location: input.location,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: WorkshopItemPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(kind) = patch.kind {
            self.kind = Some(kind);
        }
        if let Some(brand) = patch.brand {
            self.brand = Some(brand);
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = Some(quantity);
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWorkshopItem {
    #[serde(rename = "nombre")]
    #[validate(custom = "validate_not_blank_field")]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "cantidad", default)]
    #[validate(custom = "validate_quantity_field")]
    pub quantity: Option<i64>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WorkshopItemPatch {
    #[serde(rename = "nombre", default)]
    #[validate(custom = "validate_not_blank_field")]
    pub name: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "cantidad", default)]
    #[validate(custom = "validate_quantity_field")]
    pub quantity: Option<i64>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
}
