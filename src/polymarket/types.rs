use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Position (Data API)
// ---------------------------------------------------------------------------

/// One position record as returned by the Data API `/positions` endpoint.
/// Numeric fields arrive as either JSON numbers or strings depending on the
/// endpoint version, so everything goes through the flexible parsers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPosition {
    /// CLOB token id.
    #[serde(default)]
    pub asset: String,
    #[serde(default, alias = "conditionId")]
    pub condition_id: String,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "flexible_decimal")]
    pub size: Option<Decimal>,
    #[serde(default, alias = "avgPrice", deserialize_with = "flexible_decimal")]
    pub avg_price: Option<Decimal>,
    #[serde(default, alias = "curPrice", deserialize_with = "flexible_decimal")]
    pub cur_price: Option<Decimal>,
    #[serde(default, alias = "realizedPnl", deserialize_with = "flexible_decimal")]
    pub realized_pnl: Option<Decimal>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "eventSlug")]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub redeemable: bool,
}

impl RawPosition {
    /// Event-level slug preferred (polymarket.com/event/{slug} URLs), with
    /// the market slug as fallback.
    pub fn display_slug(&self) -> Option<&str> {
        self.event_slug.as_deref().or(self.slug.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Order (authenticated Data API)
// ---------------------------------------------------------------------------

/// One live order record from the authenticated `/orders` endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawOrder {
    #[serde(default)]
    pub id: String,
    /// conditionId of the market.
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default, alias = "type")]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_decimal")]
    pub original_size: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_decimal")]
    pub size_matched: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Normalize the `/orders` response body into a list of raw orders.
///
/// The endpoint has been observed returning a bare array, `{"orders": [...]}`
/// and `{"data": [...]}`; anything else yields an empty list. This is the one
/// place that shape-sniffs; callers only ever see `Vec<RawOrder>`.
pub fn extract_order_list(body: Value) -> Vec<RawOrder> {
    let list = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("orders").or_else(|| map.remove("data")) {
            Some(inner @ Value::Array(_)) => inner,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    serde_json::from_value(list).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Flexible field parsing
// ---------------------------------------------------------------------------

pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn flexible_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value))
}

/// Parse timestamps that arrive as ISO-8601 strings, unix seconds or unix
/// milliseconds (numeric or stringified).
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(timestamp_from_value(&value))
}

pub(crate) fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_unix),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| s.parse::<f64>().ok().and_then(from_unix)),
        _ => None,
    }
}

fn from_unix(ts: f64) -> Option<DateTime<Utc>> {
    // Millisecond timestamps are distinguishable by magnitude.
    let secs = if ts >= 1e12 { ts / 1000.0 } else { ts };
    DateTime::from_timestamp(secs as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_list_accepts_bare_array() {
        let body = json!([{"id": "0xabc", "market": "0xm", "asset_id": "t1"}]);
        let orders = extract_order_list(body);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "0xabc");
    }

    #[test]
    fn order_list_accepts_wrapped_objects() {
        for key in ["orders", "data"] {
            let body = json!({ key: [{"id": "0x1"}, {"id": "0x2"}] });
            assert_eq!(extract_order_list(body).len(), 2);
        }
    }

    #[test]
    fn order_list_rejects_scalars() {
        assert!(extract_order_list(json!("nope")).is_empty());
        assert!(extract_order_list(json!({"orders": "nope"})).is_empty());
    }

    #[test]
    fn position_parses_string_and_numeric_decimals() {
        let raw: RawPosition = serde_json::from_value(json!({
            "asset": "token-1",
            "conditionId": "0xcond",
            "size": "12.5",
            "avgPrice": 0.42,
            "curPrice": null,
            "realizedPnl": "-3.1"
        }))
        .unwrap();

        assert_eq!(raw.size, Some(Decimal::new(125, 1)));
        assert_eq!(raw.avg_price, Some(Decimal::new(42, 2)));
        assert_eq!(raw.cur_price, None);
        assert_eq!(raw.realized_pnl, Some(Decimal::new(-31, 1)));
    }

    #[test]
    fn timestamps_parse_iso_seconds_and_millis() {
        let iso = timestamp_from_value(&json!("2024-05-01T10:00:00Z")).unwrap();
        assert_eq!(iso.timestamp(), 1714557600);

        let secs = timestamp_from_value(&json!(1714557600)).unwrap();
        let millis = timestamp_from_value(&json!(1714557600000i64)).unwrap();
        assert_eq!(secs, millis);

        let stringy = timestamp_from_value(&json!("1714557600")).unwrap();
        assert_eq!(stringy, secs);
    }
}
