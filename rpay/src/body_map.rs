//! Ordered request parameters and declarative field schemas.
//!
//! [`BodyMap`] keeps keys in insertion order so that the encoded query string
//! and JSON body, both of which feed the request signature, are deterministic.
//! [`Schema`] lists the fields an operation accepts and is the single routine
//! behind every required-field check.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::MissingFieldError;

/// An ordered key/value parameter container.
///
/// Values are JSON values: strings cover query parameters and most body
/// fields, while numbers and nested objects (see [`BodyMap::set_body_map`])
/// cover structured POST bodies.
///
/// # Example
///
/// ```rust
/// use rpay::BodyMap;
///
/// let mut bm = BodyMap::new();
/// bm.set("out_trade_no", "T1").set("total_amount", "100");
/// assert_eq!(bm.encode_query_string(), "out_trade_no=T1&total_amount=100");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyMap {
    entries: Vec<(String, Value)>,
}

impl BodyMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or overwrites a value.
    ///
    /// Overwriting keeps the key at its original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builds a nested map in place and stores it under `key`.
    ///
    /// ```rust
    /// use rpay::BodyMap;
    ///
    /// let mut bm = BodyMap::new();
    /// bm.set_body_map("amount", |amount| {
    ///     amount.set("total", 100).set("currency", "CNY");
    /// });
    /// assert_eq!(bm.to_json().unwrap(), br#"{"amount":{"total":100,"currency":"CNY"}}"#);
    /// ```
    pub fn set_body_map(&mut self, key: impl Into<String>, build: impl FnOnce(&mut Self)) -> &mut Self {
        let mut nested = Self::new();
        build(&mut nested);
        self.set(key, Value::from(nested))
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the value under `key` rendered as a string.
    ///
    /// Strings are returned verbatim, other scalars and objects in their JSON
    /// form, and `null` as `None`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_string)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fails with the first key that is absent, `null`, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFieldError`] naming the first offending key.
    pub fn check_required<'k, I>(&self, keys: I) -> Result<(), MissingFieldError>
    where
        I: IntoIterator<Item = &'k str>,
    {
        for key in keys {
            let present = match self.get(key) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(MissingFieldError::new(key));
            }
        }
        Ok(())
    }

    /// Encodes the map as a percent-encoded `key=value&...` string in
    /// insertion order. `null` values are skipped.
    #[must_use]
    pub fn encode_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            if let Some(value) = value_to_string(value) {
                serializer.append_pair(key, &value);
            }
        }
        serializer.finish()
    }

    /// Parses a query string produced by [`BodyMap::encode_query_string`].
    ///
    /// All values come back as strings. A repeated key keeps its last value.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let mut bm = Self::new();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            bm.set(key.into_owned(), value.into_owned());
        }
        bm
    }

    /// Serializes the map as a JSON object in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be serialized.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl From<BodyMap> for Value {
    fn from(bm: BodyMap) -> Self {
        Self::Object(bm.entries.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for BodyMap
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut bm = Self::new();
        for (k, v) in iter {
            bm.set(k, v);
        }
        bm
    }
}

impl Serialize for BodyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BodyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyMapVisitor;

        impl<'de> Visitor<'de> for BodyMapVisitor {
            type Value = BodyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<BodyMap, A::Error> {
                let mut bm = BodyMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    bm.set(key, value);
                }
                Ok(bm)
            }
        }

        deserializer.deserialize_map(BodyMapVisitor)
    }
}

/// One field accepted by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Parameter name.
    pub key: &'static str,
    /// Whether the required-field gate rejects the request without it.
    pub required: bool,
}

impl Field {
    /// A field the request must carry.
    #[must_use]
    pub const fn required(key: &'static str) -> Self {
        Self { key, required: true }
    }

    /// A field the request may carry.
    #[must_use]
    pub const fn optional(key: &'static str) -> Self {
        Self {
            key,
            required: false,
        }
    }
}

/// The declared fields of one operation.
///
/// ```rust
/// use rpay::{BodyMap, Field, Schema};
///
/// const REFUND: Schema = Schema::new(&[
///     Field::required("out_trade_no"),
///     Field::required("refund_amount"),
///     Field::optional("refund_reason"),
/// ]);
///
/// let mut bm = BodyMap::new();
/// bm.set("out_trade_no", "T1");
/// assert_eq!(REFUND.validate(&bm).unwrap_err().key, "refund_amount");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    fields: &'static [Field],
}

impl Schema {
    /// A schema with no declared fields.
    pub const EMPTY: Self = Self::new(&[]);

    /// Creates a schema from a fixed field list.
    #[must_use]
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    /// All declared fields.
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Keys of the required fields, in declaration order.
    pub fn required_keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.key)
    }

    /// Applies the required-field gate.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFieldError`] naming the first absent or empty field.
    pub fn validate(&self, bm: &BodyMap) -> Result<(), MissingFieldError> {
        bm.check_required(self.required_keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_preserves_insertion_order() {
        let mut bm = BodyMap::new();
        bm.set("b", "2").set("a", "1").set("c", "3");
        let keys: Vec<&str> = bm.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut bm = BodyMap::new();
        bm.set("a", "1").set("b", "2").set("a", "9");
        assert_eq!(bm.len(), 2);
        assert_eq!(bm.encode_query_string(), "a=9&b=2");
    }

    #[test]
    fn test_check_required_reports_first_missing() {
        let mut bm = BodyMap::new();
        bm.set("out_trade_no", "T1").set("subject", "");
        let err = bm
            .check_required(["out_trade_no", "total_amount", "subject"])
            .unwrap_err();
        assert_eq!(err.key, "total_amount");
    }

    #[test]
    fn test_check_required_rejects_empty_and_null() {
        let mut bm = BodyMap::new();
        bm.set("subject", "").set("user_id", Value::Null);
        assert_eq!(bm.check_required(["subject"]).unwrap_err().key, "subject");
        assert_eq!(bm.check_required(["user_id"]).unwrap_err().key, "user_id");
    }

    #[test]
    fn test_check_required_accepts_non_string_values() {
        let mut bm = BodyMap::new();
        bm.set("amount", 0).set_body_map("detail", |_| {});
        assert!(bm.check_required(["amount", "detail"]).is_ok());
    }

    #[test]
    fn test_query_string_percent_encodes() {
        let mut bm = BodyMap::new();
        bm.set("subject", "a b&c=d").set("offset", 0).set("skip", Value::Null);
        assert_eq!(bm.encode_query_string(), "subject=a+b%26c%3Dd&offset=0");
    }

    #[test]
    fn test_query_string_round_trip() {
        let mut bm = BodyMap::new();
        bm.set("date", "2026-10-01")
            .set("subject", "月度 账单/1")
            .set("memo", "x=y&z")
            .set("limit", "200");
        let decoded = BodyMap::from_query_string(&bm.encode_query_string());
        assert_eq!(decoded.len(), bm.len());
        for (key, value) in bm.iter() {
            assert_eq!(decoded.get(key), Some(value), "key {key}");
        }
    }

    #[test]
    fn test_json_body_keeps_order_and_nesting() {
        let mut bm = BodyMap::new();
        bm.set("sub_mchid", "1900000109")
            .set("out_request_no", "W1")
            .set("amount", 100)
            .set_body_map("extra", |e| {
                e.set("remark", "r");
            });
        let json = String::from_utf8(bm.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"sub_mchid":"1900000109","out_request_no":"W1","amount":100,"extra":{"remark":"r"}}"#
        );
    }

    #[test]
    fn test_deserialize_keeps_order() {
        let bm: BodyMap = serde_json::from_str(r#"{"z":1,"a":"x"}"#).unwrap();
        let keys: Vec<&str> = bm.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(bm.get("z"), Some(&json!(1)));
    }

    #[test]
    fn test_get_string_renders_scalars() {
        let bm: BodyMap = [("a", json!("s")), ("b", json!(7)), ("c", json!(null))]
            .into_iter()
            .collect();
        assert_eq!(bm.get_string("a").as_deref(), Some("s"));
        assert_eq!(bm.get_string("b").as_deref(), Some("7"));
        assert_eq!(bm.get_string("c"), None);
        assert_eq!(bm.get_string("missing"), None);
    }

    #[test]
    fn test_remove() {
        let mut bm = BodyMap::new();
        bm.set("a", "1").set("b", "2");
        assert_eq!(bm.remove("a"), Some(json!("1")));
        assert!(!bm.contains_key("a"));
        assert_eq!(bm.remove("a"), None);
    }

    #[test]
    fn test_schema_validates_required_only() {
        const SCHEMA: Schema = Schema::new(&[
            Field::required("out_trade_no"),
            Field::optional("memo"),
            Field::required("total_amount"),
        ]);
        let mut bm = BodyMap::new();
        bm.set("out_trade_no", "T1");
        assert_eq!(SCHEMA.validate(&bm).unwrap_err().key, "total_amount");
        bm.set("total_amount", "100");
        assert!(SCHEMA.validate(&bm).is_ok());
        assert_eq!(
            SCHEMA.required_keys().collect::<Vec<_>>(),
            ["out_trade_no", "total_amount"]
        );
        assert!(Schema::EMPTY.validate(&BodyMap::new()).is_ok());
    }
}
