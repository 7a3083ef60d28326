//! Conversion between raw stored documents and typed records
//!
//! Documents are stored as JSON objects without their id; the id lives in the
//! store key. Decoding re-attaches the id, deserializes strictly and then runs
//! the record's own invariant checks. Nothing is defaulted on the way in.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while decoding or encoding a stored document
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{kind} document {id} is not a JSON object")]
    NotAnObject { kind: &'static str, id: Uuid },

    #[error("malformed {kind} document {id}: {source}")]
    Malformed {
        kind: &'static str,
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} document {id}: {reason}")]
    Invalid {
        kind: &'static str,
        id: Uuid,
        reason: String,
    },

    #[error("could not encode {kind} record: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A typed record persisted in one collection
pub trait Record: Serialize + DeserializeOwned {
    /// Human readable record kind, used in error messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Invariants the stored data must satisfy beyond its shape
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Decode a stored document body into a typed record
pub fn decode<T: Record>(id: Uuid, data: Value) -> Result<T, DecodeError> {
    let Value::Object(mut fields) = data else {
        return Err(DecodeError::NotAnObject { kind: T::KIND, id });
    };
    fields.insert("id".to_string(), Value::String(id.to_string()));

    let record: T = serde_json::from_value(Value::Object(fields)).map_err(|source| {
        DecodeError::Malformed {
            kind: T::KIND,
            id,
            source,
        }
    })?;

    record.check().map_err(|reason| DecodeError::Invalid {
        kind: T::KIND,
        id,
        reason,
    })?;

    Ok(record)
}

/// Encode a record into the document body that gets stored (id stripped)
pub fn encode<T: Record>(record: &T) -> Result<Value, DecodeError> {
    let mut value = serde_json::to_value(record).map_err(|source| DecodeError::Encode {
        kind: T::KIND,
        source,
    })?;
    if let Value::Object(fields) = &mut value {
        fields.remove("id");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Tool};
    use serde_json::json;

    fn product_body() -> Value {
        json!({
            "codigo": "F-100",
            "descripcion": "Filtro de aceite",
            "marca": "Fram",
            "categoria": "Filtros",
            "stock": 4,
            "precioCosto": "1200.50",
            "precioVenta": 1800,
            "tipoFiltro": "Aceite",
            "createdAt": "2025-01-10T12:00:00Z",
            "updatedAt": "2025-01-10T12:00:00Z"
        })
    }

    #[test]
    fn test_decode_attaches_id() {
        let id = Uuid::new_v4();
        let product: Product = decode(id, product_body()).unwrap();
        assert_eq!(product.id, id);
        assert_eq!(product.stock, 4);
        assert_eq!(product.code, "F-100");
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode::<Product>(Uuid::new_v4(), json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_types_instead_of_defaulting() {
        let mut body = product_body();
        body["stock"] = json!("muchos");
        let err = decode::<Product>(Uuid::new_v4(), body).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let mut body = product_body();
        body.as_object_mut().unwrap().remove("stock");
        assert!(decode::<Product>(Uuid::new_v4(), body).is_err());
    }

    #[test]
    fn test_decode_runs_invariant_checks() {
        let mut body = product_body();
        body["stock"] = json!(-3);
        let err = decode::<Product>(Uuid::new_v4(), body).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { .. }));
    }

    #[test]
    fn test_encode_strips_id() {
        let id = Uuid::new_v4();
        let tool: Tool = decode(
            id,
            json!({
                "nombre": "Llave torque",
                "marca": "Bahco",
                "modelo": "T-200",
                "categoria": "Llaves y Dados",
                "cantidad": 1,
                "ubicacion": "Tablero 2",
                "createdAt": "2025-01-10T12:00:00Z",
                "updatedAt": "2025-01-10T12:00:00Z"
            }),
        )
        .unwrap();

        let body = encode(&tool).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["nombre"], "Llave torque");

        let again: Tool = decode(id, body).unwrap();
        assert_eq!(again, tool);
    }
}
