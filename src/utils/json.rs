//! Conversion of raw MongoDB documents into API JSON
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

/// Convert a document to JSON, renaming `_id` to `id` and rendering
/// ObjectIds as hex strings at any depth
pub fn document_to_json(doc: Document) -> Value {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        let key = if key == "_id" { "id".to_string() } else { key };
        map.insert(key, bson_to_json(value));
    }
    Value::Object(map)
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
