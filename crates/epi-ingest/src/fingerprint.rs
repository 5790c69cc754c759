//! Content fingerprint of a loaded record set.

use sha2::{Digest, Sha256};

use epi_model::{ExtraValue, RecordSet, Value};

const UNIT: &[u8] = &[0x1f];
const RECORD: &[u8] = &[0x1e];

fn update_value(hasher: &mut Sha256, value: &Value) {
    let tag: &[u8] = match value {
        Value::Missing => b"m",
        Value::Empty => b"e",
        Value::Text(_) => b"t",
        Value::Number(_) => b"n",
    };
    hasher.update(tag);
    match value {
        Value::Number(number) => hasher.update(number.to_bits().to_le_bytes()),
        other => hasher.update(other.to_string().as_bytes()),
    }
    hasher.update(UNIT);
}

/// SHA-256 hex digest over schema, raw and normalized values, and extras.
///
/// Two loads of the same files with the same configuration yield the same digest.
pub fn fingerprint(set: &RecordSet) -> String {
    let mut hasher = Sha256::new();
    for key in set.schema.keys() {
        hasher.update(key.as_bytes());
        hasher.update(UNIT);
    }
    hasher.update(RECORD);
    for record in &set.records {
        for index in 0..set.schema.len() {
            update_value(&mut hasher, record.raw(index));
            update_value(&mut hasher, record.value(index));
        }
        hasher.update(RECORD);
    }
    for (name, extra) in &set.extras {
        hasher.update(name.as_bytes());
        hasher.update(UNIT);
        match extra {
            ExtraValue::List(items) => {
                hasher.update(b"l");
                for item in items {
                    hasher.update(item.as_bytes());
                    hasher.update(UNIT);
                }
            }
            ExtraValue::Map(map) => {
                hasher.update(b"k");
                for (key, value) in map {
                    hasher.update(key.as_bytes());
                    hasher.update(UNIT);
                    hasher.update(value.as_bytes());
                    hasher.update(UNIT);
                }
            }
        }
        hasher.update(RECORD);
    }
    hex::encode(hasher.finalize())
}
