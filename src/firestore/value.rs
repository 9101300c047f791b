//! Firestore typed values and their REST JSON encoding.
//!
//! Firestore tags every field value on the wire with exactly one kind property:
//!
//! ```json
//! { "integerValue": "42" }
//! { "mapValue": { "fields": { "name": { "stringValue": "Ada" } } } }
//! ```
//!
//! [`Value`] is the in-memory side of that contract. [`encode`] and [`decode`] convert
//! between the two, and `Value` implements `Serialize`/`Deserialize` through them so
//! wire models can embed it directly.
//!
//! For working with plain Rust structs, [`Value::from_json`] and [`Value::into_json`]
//! bridge to untagged `serde_json::Value`, inferring kinds from the JSON shape.

use super::FirestoreError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    Timestamp,
    String,
    Bytes,
    Reference,
    GeoPoint,
    Array,
    Map,
}

impl ValueKind {
    const ALL: [ValueKind; 11] = [
        ValueKind::Null,
        ValueKind::Boolean,
        ValueKind::Integer,
        ValueKind::Double,
        ValueKind::Timestamp,
        ValueKind::String,
        ValueKind::Bytes,
        ValueKind::Reference,
        ValueKind::GeoPoint,
        ValueKind::Array,
        ValueKind::Map,
    ];

    /// The JSON property that carries this kind on the wire, e.g. `"integerValue"`.
    pub fn wire_key(&self) -> &'static str {
        match self {
            ValueKind::Null => "nullValue",
            ValueKind::Boolean => "booleanValue",
            ValueKind::Integer => "integerValue",
            ValueKind::Double => "doubleValue",
            ValueKind::Timestamp => "timestampValue",
            ValueKind::String => "stringValue",
            ValueKind::Bytes => "bytesValue",
            ValueKind::Reference => "referenceValue",
            ValueKind::GeoPoint => "geoPointValue",
            ValueKind::Array => "arrayValue",
            ValueKind::Map => "mapValue",
        }
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_key() == key)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::Timestamp => "timestamp",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Reference => "reference",
            ValueKind::GeoPoint => "geo point",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Latitude must lie in `[-90, 90]` and longitude in `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FirestoreError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FirestoreError::InvalidValue(format!(
                "latitude must be between -90 and 90 degrees, got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FirestoreError::InvalidValue(format!(
                "longitude must be between -180 and 180 degrees, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A Firestore field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    /// A document resource name, `projects/{p}/databases/{d}/documents/{path}`.
    Reference(String),
    GeoPoint(GeoPoint),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Value::Reference(name.into())
    }

    pub fn geo_point(point: GeoPoint) -> Self {
        Value::GeoPoint(point)
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(values)
    }

    pub fn map(fields: HashMap<String, Value>) -> Self {
        Value::Map(fields)
    }

    /// Builds a value of the declared `kind` from a loosely typed JSON payload.
    ///
    /// Fails with [`FirestoreError::InvalidValue`] when the payload cannot represent
    /// that kind, e.g. `ValueKind::Integer` with `"abc"` or `1.5`.
    ///
    /// * integers accept an integral number or a decimal string
    /// * doubles accept a number or a numeric string
    /// * timestamps accept an RFC 3339 string
    /// * bytes accept a string (its UTF-8 bytes) or an array of octets
    /// * geo points accept `{"latitude", "longitude"}`
    /// * arrays and maps infer their children as [`Value::from_json`] does
    pub fn with_kind(kind: ValueKind, payload: JsonValue) -> Result<Self, FirestoreError> {
        match (kind, payload) {
            (ValueKind::Null, JsonValue::Null) => Ok(Value::Null),
            (ValueKind::Boolean, JsonValue::Bool(b)) => Ok(Value::Boolean(b)),
            (ValueKind::Integer, JsonValue::Number(n)) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| invalid_payload(kind, &n)),
            (ValueKind::Integer, JsonValue::String(s)) => s
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| invalid_payload(kind, format!("{:?} ({})", s, e))),
            (ValueKind::Double, JsonValue::Number(n)) => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| invalid_payload(kind, &n)),
            (ValueKind::Double, JsonValue::String(s)) => s
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| invalid_payload(kind, format!("{:?} ({})", s, e))),
            (ValueKind::Timestamp, JsonValue::String(s)) => parse_timestamp(&s)
                .map(Value::Timestamp)
                .map_err(|e| invalid_payload(kind, format!("{:?} ({})", s, e))),
            (ValueKind::String, JsonValue::String(s)) => Ok(Value::String(s)),
            (ValueKind::Bytes, JsonValue::String(s)) => Ok(Value::Bytes(s.into_bytes())),
            (ValueKind::Bytes, JsonValue::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|octet| u8::try_from(octet).ok())
                        .ok_or_else(|| invalid_payload(kind, item))
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Value::Bytes),
            (ValueKind::Reference, JsonValue::String(s)) if !s.is_empty() => {
                Ok(Value::Reference(s))
            }
            (ValueKind::GeoPoint, JsonValue::Object(o)) => {
                let latitude = o.get("latitude").and_then(JsonValue::as_f64);
                let longitude = o.get("longitude").and_then(JsonValue::as_f64);
                match (latitude, longitude) {
                    (Some(latitude), Some(longitude)) => {
                        GeoPoint::new(latitude, longitude).map(Value::GeoPoint)
                    }
                    _ => Err(invalid_payload(kind, JsonValue::Object(o))),
                }
            }
            (ValueKind::Array, JsonValue::Array(items)) => Ok(Value::Array(
                items.into_iter().map(Value::from_json).collect(),
            )),
            (ValueKind::Map, JsonValue::Object(o)) => Ok(Value::Map(
                o.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            )),
            (kind, payload) => Err(invalid_payload(kind, payload)),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Reference(_) => ValueKind::Reference,
            Value::GeoPoint(_) => ValueKind::GeoPoint,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64`, as Firestore compares numbers across both kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// The text of a string or reference value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Reference(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_geo_point(&self) -> Option<&GeoPoint> {
        match self {
            Value::GeoPoint(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Appends `value` to an array value.
    pub fn push(&mut self, value: Value) -> Result<(), FirestoreError> {
        match self {
            Value::Array(values) => {
                values.push(value);
                Ok(())
            }
            other => Err(FirestoreError::TypeMismatch(format!(
                "cannot append to a {} value, only to an array",
                other.kind()
            ))),
        }
    }

    /// Inserts `value` under `key` in a map value, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, FirestoreError> {
        match self {
            Value::Map(fields) => Ok(fields.insert(key.into(), value)),
            other => Err(FirestoreError::TypeMismatch(format!(
                "cannot insert a field into a {} value, only into a map",
                other.kind()
            ))),
        }
    }

    /// Infers a value from untagged JSON.
    ///
    /// Numbers representable as `i64` become integers, other numbers doubles;
    /// strings always become strings.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(a) => Value::Array(a.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(o) => Value::Map(
                o.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Flattens into untagged JSON.
    ///
    /// Timestamps become RFC 3339 strings, bytes base64 strings and references their
    /// resource name. Fails on non-finite doubles, which plain JSON cannot carry.
    pub fn into_json(self) -> Result<JsonValue, FirestoreError> {
        Ok(match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(b),
            Value::Integer(i) => JsonValue::Number(i.into()),
            Value::Double(d) => JsonValue::Number(Number::from_f64(d).ok_or_else(|| {
                FirestoreError::InvalidValue(format!("{} has no plain JSON representation", d))
            })?),
            Value::Timestamp(t) => JsonValue::String(format_timestamp(&t)),
            Value::String(s) | Value::Reference(s) => JsonValue::String(s),
            Value::Bytes(b) => JsonValue::String(STANDARD.encode(b)),
            Value::GeoPoint(p) => json!({ "latitude": p.latitude, "longitude": p.longitude }),
            Value::Array(values) => JsonValue::Array(
                values
                    .into_iter()
                    .map(Value::into_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Map(fields) => fields_into_json(fields)?,
        })
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<GeoPoint> for Value {
    fn from(value: GeoPoint) -> Self {
        Value::GeoPoint(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(value: HashMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        decode(&json).map_err(serde::de::Error::custom)
    }
}

/// Encodes a value as Firestore REST JSON.
pub fn encode(value: &Value) -> JsonValue {
    match value {
        Value::Null => json!({ "nullValue": JsonValue::Null }),
        Value::Boolean(b) => json!({ "booleanValue": b }),
        // 64-bit integers travel as decimal strings so JSON doubles cannot round them.
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::Double(d) => json!({ "doubleValue": encode_double(*d) }),
        Value::Timestamp(t) => json!({ "timestampValue": format_timestamp(t) }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Bytes(b) => json!({ "bytesValue": STANDARD.encode(b) }),
        Value::Reference(r) => json!({ "referenceValue": r }),
        Value::GeoPoint(p) => json!({
            "geoPointValue": {
                "latitude": p.latitude,
                "longitude": p.longitude,
            }
        }),
        Value::Array(values) => {
            let values = values.iter().map(encode).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encodes a field map as the object found under `fields` in documents and maps.
pub fn encode_fields(fields: &HashMap<String, Value>) -> JsonValue {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.clone(), encode(value));
    }
    JsonValue::Object(map)
}

/// Decodes Firestore REST JSON into a value.
///
/// Exactly one of the eleven kind properties must be present; other properties
/// are ignored. Fails with [`FirestoreError::Decode`] otherwise, or when the
/// payload does not have the shape its kind requires.
pub fn decode(json: &JsonValue) -> Result<Value, FirestoreError> {
    let object = json
        .as_object()
        .ok_or_else(|| decode_error(format!("expected a value object, got {}", json)))?;

    let mut present = object
        .iter()
        .filter_map(|(key, payload)| ValueKind::from_wire_key(key).map(|kind| (kind, payload)));

    let (kind, payload) = match (present.next(), present.next()) {
        (Some(entry), None) => entry,
        (None, _) => {
            return Err(decode_error(format!(
                "no value kind found in {}",
                json
            )))
        }
        (Some((first, _)), Some((second, _))) => {
            return Err(decode_error(format!(
                "ambiguous value: both {} and {} are set",
                first.wire_key(),
                second.wire_key()
            )))
        }
    };

    match kind {
        ValueKind::Null => match payload {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(s) if s == "NULL_VALUE" => Ok(Value::Null),
            other => Err(payload_error(kind, other)),
        },
        ValueKind::Boolean => payload
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| payload_error(kind, payload)),
        ValueKind::Integer => match payload {
            JsonValue::String(s) => s
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| payload_error(kind, payload)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| payload_error(kind, payload)),
            other => Err(payload_error(kind, other)),
        },
        ValueKind::Double => match payload {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| payload_error(kind, payload)),
            JsonValue::String(s) => match s.as_str() {
                "NaN" => Ok(Value::Double(f64::NAN)),
                "Infinity" => Ok(Value::Double(f64::INFINITY)),
                "-Infinity" => Ok(Value::Double(f64::NEG_INFINITY)),
                _ => Err(payload_error(kind, payload)),
            },
            other => Err(payload_error(kind, other)),
        },
        ValueKind::Timestamp => payload
            .as_str()
            .and_then(|s| parse_timestamp(s).ok())
            .map(Value::Timestamp)
            .ok_or_else(|| payload_error(kind, payload)),
        ValueKind::String => payload
            .as_str()
            .map(Value::string)
            .ok_or_else(|| payload_error(kind, payload)),
        ValueKind::Bytes => payload
            .as_str()
            .and_then(|s| STANDARD.decode(s).ok())
            .map(Value::Bytes)
            .ok_or_else(|| payload_error(kind, payload)),
        ValueKind::Reference => payload
            .as_str()
            .map(Value::reference)
            .ok_or_else(|| payload_error(kind, payload)),
        ValueKind::GeoPoint => {
            let point = payload
                .as_object()
                .ok_or_else(|| payload_error(kind, payload))?;
            // proto3 JSON omits zero coordinates.
            let latitude = coordinate(point, "latitude").ok_or_else(|| payload_error(kind, payload))?;
            let longitude =
                coordinate(point, "longitude").ok_or_else(|| payload_error(kind, payload))?;
            GeoPoint::new(latitude, longitude)
                .map(Value::GeoPoint)
                .map_err(|e| decode_error(e.to_string()))
        }
        ValueKind::Array => {
            let array = payload
                .as_object()
                .ok_or_else(|| payload_error(kind, payload))?;
            match array.get("values") {
                None | Some(JsonValue::Null) => Ok(Value::Array(Vec::new())),
                Some(JsonValue::Array(values)) => values
                    .iter()
                    .map(decode)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                Some(_) => Err(payload_error(kind, payload)),
            }
        }
        ValueKind::Map => {
            let map = payload
                .as_object()
                .ok_or_else(|| payload_error(kind, payload))?;
            match map.get("fields") {
                None | Some(JsonValue::Null) => Ok(Value::Map(HashMap::new())),
                Some(fields) => decode_fields(fields).map(Value::Map),
            }
        }
    }
}

/// Decodes the object found under `fields` in documents and maps.
pub fn decode_fields(json: &JsonValue) -> Result<HashMap<String, Value>, FirestoreError> {
    let object = json
        .as_object()
        .ok_or_else(|| decode_error(format!("expected a fields object, got {}", json)))?;

    let mut fields = HashMap::with_capacity(object.len());
    for (key, value) in object {
        fields.insert(key.clone(), decode(value)?);
    }
    Ok(fields)
}

/// Converts a serializable struct into document fields.
pub fn fields_from_serializable<T: Serialize>(
    value: &T,
) -> Result<HashMap<String, Value>, FirestoreError> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect()),
        other => Err(FirestoreError::InvalidValue(format!(
            "only objects can be stored as documents, got {}",
            other
        ))),
    }
}

/// Converts document fields into a deserializable struct.
pub fn fields_into<T: DeserializeOwned>(fields: HashMap<String, Value>) -> Result<T, FirestoreError> {
    Ok(serde_json::from_value(fields_into_json(fields)?)?)
}

fn fields_into_json(fields: HashMap<String, Value>) -> Result<JsonValue, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, value.into_json()?);
    }
    Ok(JsonValue::Object(map))
}

fn encode_double(d: f64) -> JsonValue {
    if d.is_nan() {
        JsonValue::String("NaN".to_string())
    } else if d.is_infinite() {
        let name = if d > 0.0 { "Infinity" } else { "-Infinity" };
        JsonValue::String(name.to_string())
    } else {
        Number::from_f64(d).map_or(JsonValue::Null, JsonValue::Number)
    }
}

/// RFC 3339 in UTC with a `Z` suffix and only as many fraction digits as needed.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

fn coordinate(point: &Map<String, JsonValue>, name: &str) -> Option<f64> {
    match point.get(name) {
        None => Some(0.0),
        Some(value) => value.as_f64(),
    }
}

fn invalid_payload(kind: ValueKind, payload: impl fmt::Display) -> FirestoreError {
    FirestoreError::InvalidValue(format!("{} is not a valid {} payload", payload, kind))
}

fn payload_error(kind: ValueKind, payload: &JsonValue) -> FirestoreError {
    decode_error(format!("invalid {} payload: {}", kind.wire_key(), payload))
}

fn decode_error(message: String) -> FirestoreError {
    FirestoreError::Decode(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_values() -> Vec<Value> {
        let mut inner = HashMap::new();
        inner.insert("flag".to_string(), Value::boolean(false));
        inner.insert("tags".to_string(), Value::array(vec!["a".into(), "b".into()]));

        vec![
            Value::null(),
            Value::boolean(true),
            Value::integer(-7),
            Value::double(2.5),
            Value::timestamp(Utc.with_ymd_and_hms(2021, 1, 1, 12, 30, 0).unwrap()),
            Value::string("héllo"),
            Value::bytes(vec![0u8, 1, 2, 254, 255]),
            Value::reference("projects/p/databases/(default)/documents/users/alice"),
            Value::geo_point(GeoPoint::new(51.5, -0.12).unwrap()),
            Value::array(vec![Value::integer(1), Value::map(inner.clone())]),
            Value::map(inner),
        ]
    }

    #[test]
    fn test_round_trip_all_kinds() {
        for value in sample_values() {
            let encoded = encode(&value);
            assert_eq!(decode(&encoded).unwrap(), value, "round trip of {}", encoded);
        }
    }

    #[test]
    fn test_encode_wire_shapes() {
        assert_eq!(encode(&Value::integer(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode(&Value::null()), json!({ "nullValue": null }));
        assert_eq!(
            encode(&Value::bytes(b"hi".to_vec())),
            json!({ "bytesValue": "aGk=" })
        );
        assert_eq!(
            encode(&Value::timestamp(
                Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
            )),
            json!({ "timestampValue": "2021-01-01T00:00:00Z" })
        );
        assert_eq!(
            encode(&Value::array(vec![Value::boolean(true)])),
            json!({ "arrayValue": { "values": [{ "booleanValue": true }] } })
        );
        assert_eq!(
            encode(&Value::geo_point(GeoPoint::new(1.0, 2.0).unwrap())),
            json!({ "geoPointValue": { "latitude": 1.0, "longitude": 2.0 } })
        );
    }

    #[test]
    fn test_integer_extremes_survive() {
        for i in [i64::MIN, -1, 0, 1, i64::MAX] {
            let encoded = encode(&Value::integer(i));
            assert_eq!(encoded["integerValue"], JsonValue::String(i.to_string()));
            assert_eq!(decode(&encoded).unwrap(), Value::integer(i));
        }
    }

    #[test]
    fn test_timestamp_with_nanos_round_trips() {
        let ts = Utc.timestamp_opt(1_600_000_000, 123_456_789).unwrap();
        let encoded = encode(&Value::timestamp(ts));
        assert_eq!(
            encoded,
            json!({ "timestampValue": "2020-09-13T12:26:40.123456789Z" })
        );
        assert_eq!(decode(&encoded).unwrap(), Value::timestamp(ts));
    }

    #[test]
    fn test_non_finite_doubles() {
        assert_eq!(
            encode(&Value::double(f64::INFINITY)),
            json!({ "doubleValue": "Infinity" })
        );
        assert_eq!(
            decode(&json!({ "doubleValue": "-Infinity" })).unwrap(),
            Value::double(f64::NEG_INFINITY)
        );
        let nan = decode(&json!({ "doubleValue": "NaN" })).unwrap();
        assert!(nan.as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_decode_rejects_two_kinds() {
        let err = decode(&json!({ "stringValue": "a", "booleanValue": true })).unwrap_err();
        assert!(matches!(err, FirestoreError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_no_kind() {
        assert!(matches!(
            decode(&json!({ "somethingElse": 1 })),
            Err(FirestoreError::Decode(_))
        ));
        assert!(matches!(decode(&json!("x")), Err(FirestoreError::Decode(_))));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let value = decode(&json!({ "stringValue": "a", "comment": "ignored" })).unwrap();
        assert_eq!(value, Value::string("a"));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        for json in [
            json!({ "integerValue": "12.5" }),
            json!({ "integerValue": true }),
            json!({ "booleanValue": "true" }),
            json!({ "timestampValue": "yesterday" }),
            json!({ "bytesValue": "***" }),
            json!({ "geoPointValue": { "latitude": 91.0, "longitude": 0.0 } }),
            json!({ "arrayValue": { "values": [{ "nope": 1 }] } }),
        ] {
            assert!(
                matches!(decode(&json), Err(FirestoreError::Decode(_))),
                "{} should not decode",
                json
            );
        }
    }

    #[test]
    fn test_decode_accepts_wire_variations() {
        assert_eq!(
            decode(&json!({ "integerValue": 5 })).unwrap(),
            Value::integer(5)
        );
        assert_eq!(
            decode(&json!({ "arrayValue": {} })).unwrap(),
            Value::array(Vec::new())
        );
        assert_eq!(
            decode(&json!({ "mapValue": {} })).unwrap(),
            Value::map(HashMap::new())
        );
        assert_eq!(
            decode(&json!({ "geoPointValue": { "longitude": 10.0 } })).unwrap(),
            Value::geo_point(GeoPoint::new(0.0, 10.0).unwrap())
        );
    }

    #[test]
    fn test_with_kind_accepts_matching_payloads() {
        assert_eq!(
            Value::with_kind(ValueKind::Integer, json!("9223372036854775807")).unwrap(),
            Value::integer(i64::MAX)
        );
        assert_eq!(
            Value::with_kind(ValueKind::Double, json!("1.25")).unwrap(),
            Value::double(1.25)
        );
        assert_eq!(
            Value::with_kind(ValueKind::Bytes, json!([104, 105])).unwrap(),
            Value::bytes(b"hi".to_vec())
        );
        assert_eq!(
            Value::with_kind(ValueKind::Timestamp, json!("2021-01-01T01:00:00+01:00")).unwrap(),
            Value::timestamp(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            Value::with_kind(ValueKind::Map, json!({ "n": 1, "s": "x" }))
                .unwrap()
                .as_map()
                .unwrap()
                .get("n"),
            Some(&Value::integer(1))
        );
    }

    #[test]
    fn test_with_kind_rejects_mismatched_payloads() {
        let cases = [
            (ValueKind::Null, json!(0)),
            (ValueKind::Boolean, json!("true")),
            (ValueKind::Integer, json!("abc")),
            (ValueKind::Integer, json!(1.5)),
            (ValueKind::Double, json!(true)),
            (ValueKind::Timestamp, json!(1_600_000_000)),
            (ValueKind::String, json!(1)),
            (ValueKind::Bytes, json!([256])),
            (ValueKind::Reference, json!("")),
            (ValueKind::GeoPoint, json!({ "latitude": 10.0 })),
            (ValueKind::GeoPoint, json!({ "latitude": 0.0, "longitude": 181.0 })),
            (ValueKind::Array, json!({})),
            (ValueKind::Map, json!([])),
        ];

        for (kind, payload) in cases {
            let result = Value::with_kind(kind, payload.clone());
            assert!(
                matches!(result, Err(FirestoreError::InvalidValue(_))),
                "{} with {} should be rejected",
                kind,
                payload
            );
        }
    }

    #[test]
    fn test_push_and_insert() {
        let mut array = Value::array(Vec::new());
        array.push(Value::integer(1)).unwrap();
        array.push(Value::string("two")).unwrap();
        assert_eq!(array.as_array().unwrap().len(), 2);

        let mut map = Value::map(HashMap::new());
        assert_eq!(map.insert("a", Value::integer(1)).unwrap(), None);
        assert_eq!(
            map.insert("a", Value::integer(2)).unwrap(),
            Some(Value::integer(1))
        );
    }

    #[test]
    fn test_push_and_insert_type_mismatch() {
        let mut scalar = Value::string("x");
        assert!(matches!(
            scalar.push(Value::null()),
            Err(FirestoreError::TypeMismatch(_))
        ));
        assert!(matches!(
            scalar.insert("k", Value::null()),
            Err(FirestoreError::TypeMismatch(_))
        ));

        let mut array = Value::array(Vec::new());
        assert!(matches!(
            array.insert("k", Value::null()),
            Err(FirestoreError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_serde_bridge() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct User {
            name: String,
            age: i64,
            score: f64,
            tags: Vec<String>,
        }

        let user = User {
            name: "Alice".to_string(),
            age: 30,
            score: 0.5,
            tags: vec!["admin".to_string()],
        };

        let fields = fields_from_serializable(&user).unwrap();
        assert_eq!(fields.get("age"), Some(&Value::integer(30)));
        assert_eq!(fields.get("score"), Some(&Value::double(0.5)));

        let back: User = fields_into(fields).unwrap();
        assert_eq!(back, user);

        assert!(matches!(
            fields_from_serializable(&vec![1, 2]),
            Err(FirestoreError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_value_serde_impls_use_wire_format() {
        let value = Value::integer(3);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "integerValue": "3" }));

        let parsed: Value = serde_json::from_value(json!({ "stringValue": "x" })).unwrap();
        assert_eq!(parsed, Value::string("x"));

        assert!(serde_json::from_value::<Value>(json!({})).is_err());
    }
}
