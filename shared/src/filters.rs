//! Search and filter criteria for the list screens
//!
//! Every search is a case-insensitive substring match. A type or category
//! filter of `None`, an empty string or `"Todos"` matches everything.

use serde::{Deserialize, Serialize};

use crate::models::{Annotation, Product, Tool, WorkshopItem};

/// Value the list screens send for "no filter"
pub const ALL: &str = "Todos";

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn normalized(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn selected(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .filter(|value| !value.is_empty() && *value != ALL)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFilter {
    pub search: Option<String>,
    pub tipo: Option<String>,
}

impl AnnotationFilter {
    pub fn matches(&self, annotation: &Annotation) -> bool {
        if let Some(tipo) = selected(&self.tipo) {
            if annotation.kind.as_str() != tipo {
                return false;
            }
        }
        match normalized(&self.search) {
            None => true,
            Some(term) => {
                contains_ci(&annotation.title, &term)
                    || contains_ci(&annotation.description, &term)
                    || annotation
                        .items
                        .iter()
                        .any(|item| contains_ci(&item.description, &term))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub categoria: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = selected(&self.categoria) {
            if product.category != category {
                return false;
            }
        }
        match normalized(&self.search) {
            None => true,
            Some(term) => {
                contains_ci(&product.code, &term)
                    || contains_ci(&product.description, &term)
                    || contains_ci(&product.brand, &term)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkshopItemFilter {
    pub search: Option<String>,
    pub tipo: Option<String>,
    pub ubicacion: Option<String>,
}

impl WorkshopItemFilter {
    pub fn matches(&self, item: &WorkshopItem) -> bool {
        if let Some(kind) = selected(&self.tipo) {
            if item.kind.as_deref() != Some(kind) {
                return false;
            }
        }
        if let Some(location) = selected(&self.ubicacion) {
            if item.location.as_deref() != Some(location) {
                return false;
            }
        }
        match normalized(&self.search) {
            None => true,
            Some(term) => {
                contains_ci(&item.name, &term)
                    || item.brand.as_deref().is_some_and(|b| contains_ci(b, &term))
                    || item
                        .location
                        .as_deref()
                        .is_some_and(|l| contains_ci(l, &term))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolFilter {
    pub search: Option<String>,
    pub categoria: Option<String>,
}

impl ToolFilter {
    pub fn matches(&self, tool: &Tool) -> bool {
        if let Some(category) = selected(&self.categoria) {
            if tool.category != category {
                return false;
            }
        }
        match normalized(&self.search) {
            None => true,
            Some(term) => {
                contains_ci(&tool.name, &term)
                    || contains_ci(&tool.brand, &term)
                    || contains_ci(&tool.model, &term)
            }
        }
    }
}

/// Distinct, sorted, non-empty locations of the workshop items
pub fn distinct_locations(items: &[WorkshopItem]) -> Vec<String> {
    let mut locations: Vec<String> = items
        .iter()
        .filter_map(|item| item.location.clone())
        .filter(|l| !l.trim().is_empty())
        .collect();
    locations.sort();
    locations.dedup();
    locations
}
