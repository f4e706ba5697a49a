use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

/// One cache record as stored on disk.
///
/// Written as a single UTF-8 JSON document per key:
/// `{"data": <any>, "addedAt": <epoch ms>, "expiresAt": <epoch ms | null>}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// The cached value.
    pub data: Value,
    /// Time of the last write, in epoch milliseconds.
    pub added_at: i64,
    /// Expiry deadline in epoch milliseconds. `None` never expires.
    pub expires_at: Option<i64>,
}

impl CacheRecord {
    pub(crate) fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Verdict on raw record bytes read back from disk.
#[derive(Debug)]
pub(crate) enum RecordState {
    /// Well-formed and not expired.
    Live(CacheRecord),
    /// Well-formed but past its deadline.
    Expired,
    /// Not a record: invalid JSON or a malformed `addedAt`/`expiresAt`.
    Corrupt,
}

/// Parses record bytes, insisting on the exact on-disk shape.
///
/// Field checks are explicit rather than derived: a derived deserializer
/// would read a missing `expiresAt` as "never expires", but only an integer
/// or a literal `null` counts as well-formed here. Floats, strings and
/// absent fields all fail.
pub(crate) fn parse_record(bytes: &[u8]) -> Option<CacheRecord> {
    let mut fields = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(fields)) => fields,
        _ => return None,
    };

    let data = fields.remove("data")?;
    let added_at = fields.get("addedAt")?.as_i64()?;
    let expires_at = match fields.get("expiresAt")? {
        Value::Null => None,
        value => Some(value.as_i64()?),
    };

    Some(CacheRecord {
        data,
        added_at,
        expires_at,
    })
}

/// Pure load-and-validate step used by recovery reads.
pub(crate) fn evaluate_record(bytes: &[u8], now: i64) -> RecordState {
    match parse_record(bytes) {
        Some(record) if record.is_expired(now) => RecordState::Expired,
        Some(record) => RecordState::Live(record),
        None => RecordState::Corrupt,
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
