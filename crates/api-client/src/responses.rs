use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

// The Datastream Web Service speaks PascalCase JSON; `rename_all` maps it onto
// our snake_case fields.

/// The response from `GET /GetToken`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenResponse {
    pub token_value: String,
    /// WCF date literal, e.g. `/Date(1700000000000)/`.
    pub token_expiry: String,
}

/// The body of `POST /GetData`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetDataRequest<'a> {
    pub data_request: DataRequest<'a>,
    pub properties: Option<Vec<Property>>,
    pub token_value: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataRequest<'a> {
    pub data_types: Vec<DataType<'a>>,
    pub date: DateRange<'a>,
    pub instrument: Instrument<'a>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataType<'a> {
    pub value: &'a str,
    pub properties: Option<Vec<Property>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateRange<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub frequency: &'a str,
    /// 0 = snapshot, 1 = time series.
    pub kind: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instrument<'a> {
    pub value: &'a str,
    pub properties: Option<Vec<Property>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    pub key: String,
    pub value: bool,
}

/// The response from `POST /GetData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetDataResponse {
    pub data_response: DataResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataResponse {
    #[serde(default)]
    pub data_type_values: Vec<DataTypeValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataTypeValue {
    pub data_type: String,
    #[serde(default)]
    pub symbol_values: Vec<SymbolValue>,
}

/// Value type code the service uses for an error string.
pub const VALUE_TYPE_ERROR: i32 = 0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SymbolValue {
    pub symbol: String,
    #[serde(rename = "Type", default)]
    pub value_type: i32,
    #[serde(default)]
    pub value: Value,
}

impl SymbolValue {
    /// Numeric value of this cell. Error strings, `NaN` and `null` decode to `None`;
    /// for a series the last numeric point is taken.
    pub fn decimal(&self) -> Option<Decimal> {
        if self.value_type == VALUE_TYPE_ERROR {
            return None;
        }
        decode_value(&self.value)
    }
}

fn decode_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with("$$") {
                None
            } else {
                Decimal::from_str(s).ok()
            }
        }
        Value::Array(points) => points.iter().rev().find_map(decode_value),
        _ => None,
    }
}

/// Represents an error response from the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
