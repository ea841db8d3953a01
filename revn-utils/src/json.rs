//! Canonical JSON: object keys sorted at every depth, so equal values always
//! serialise to identical text (and hash to identical seeds).

use anyhow::Result;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;

pub fn dejsonify<'a, T>(json_str: &'a str) -> serde_json::Result<T>
where
    T: Deserialize<'a>,
{
    serde_json::from_str::<T>(json_str)
}

pub fn jsonify<T>(obj: &T) -> Result<String>
where
    T: Serialize,
{
    Ok(canonical(serde_json::to_value(obj)?).to_string())
}

/// Consumes `value` and rebuilds every object with its entries in key order.
pub fn canonical(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonical(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}

pub fn decompress_obj<T>(input: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_reader(ZlibDecoder::new(input))?)
}

/// zlib stream of the canonical JSON text.
pub fn compress_obj<T>(input: &T) -> Result<Vec<u8>>
where
    T: Serialize,
{
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, &canonical(serde_json::to_value(input)?))?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}
