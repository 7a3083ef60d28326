//! Validation utilities for the GTM admin platform
//!
//! Plain checks return `Result<(), &'static str>`; the `*_field` adapters wrap
//! them for use in `#[validate(custom = ...)]` attributes.

use rust_decimal::Decimal;
use validator::ValidationError;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Largest quantity accepted on a single annotation line or inventory row
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest stock a product can hold
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Largest unit price, cost or sale price accepted
pub fn max_price() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

/// Stock on hand is between 0 and `MAX_STOCK`
pub fn validate_stock(stock: i64) -> Result<(), &'static str> {
    if stock < 0 {
        return Err("El stock no puede ser negativo");
    }
    if stock > MAX_STOCK {
        return Err("El stock excede el máximo permitido");
    }
    Ok(())
}

/// Prices are non-negative amounts up to `max_price()`
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("El precio no puede ser negativo");
    }
    if price > max_price() {
        return Err("El precio excede el máximo permitido");
    }
    Ok(())
}

/// Quantities on inventory rows and annotation lines are between 0 and
/// `MAX_QUANTITY`
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("La cantidad no puede ser negativa");
    }
    if quantity > MAX_QUANTITY {
        return Err("La cantidad excede el máximo permitido");
    }
    Ok(())
}

/// Required text fields must contain something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("El campo es obligatorio");
    }
    Ok(())
}

// ============================================================================
// Adapters for `validator` derive
// ============================================================================

fn to_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn validate_price_field(price: &Decimal) -> Result<(), ValidationError> {
    validate_price(*price).map_err(|m| to_validation_error("invalid_price", m))
}

pub fn validate_quantity_field<T: std::borrow::Borrow<i64>>(quantity: T) -> Result<(), ValidationError> {
    validate_quantity(*quantity.borrow()).map_err(|m| to_validation_error("invalid_quantity", m))
}

pub fn validate_stock_field<T: std::borrow::Borrow<i64>>(stock: T) -> Result<(), ValidationError> {
    validate_stock(*stock.borrow()).map_err(|m| to_validation_error("invalid_stock", m))
}

pub fn validate_not_blank_field(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value).map_err(|m| to_validation_error("blank", m))
}
