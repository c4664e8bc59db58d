//! Deserialization helpers shared by the provider adapters

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
///
/// Pair with `#[serde(default, deserialize_with = "null_as_default")]` on
/// collection fields that upstream APIs sometimes send as `null`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn test_null_missing_and_present() {
        let null: Payload = serde_json::from_value(json!({"tags": null})).unwrap();
        assert!(null.tags.is_empty());

        let missing: Payload = serde_json::from_value(json!({})).unwrap();
        assert!(missing.tags.is_empty());

        let present: Payload = serde_json::from_value(json!({"tags": ["en:milk"]})).unwrap();
        assert_eq!(present.tags, vec!["en:milk"]);

        assert!(serde_json::from_value::<Payload>(json!({"tags": 3})).is_err());
    }
}
