use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Opaque continuation token for keyset pagination.
///
/// Encodes the `(created_at, id)` sort key of the last row the caller has
/// seen — nothing else. It is never an offset or a row count; the reader
/// resumes strictly after this key in `(created_at DESC, id DESC)` order.
///
/// Wire format: base64url (no padding) over JSON
/// `{"createdAt": "<ISO-8601>", "id": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> String {
        // Serialization of this two-field struct cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, ServiceError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| ServiceError::InvalidCursor(format!("bad base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::InvalidCursor(format!("bad payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::TimeZone;

    #[test]
    fn round_trips_exactly() {
        let cursor = Cursor::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
            Uuid::new_v4(),
        );
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn round_trips_subsecond_timestamps() {
        let created_at = Utc
            .timestamp_opt(1_736_500_000, 123_456_789)
            .single()
            .unwrap();
        let cursor = Cursor::new(created_at, Uuid::new_v4());
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.created_at, created_at);
    }

    #[test]
    fn token_is_url_safe() {
        let cursor = Cursor::new(Utc::now(), Uuid::new_v4());
        let token = cursor.encode();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn payload_shape_is_stable() {
        let cursor = Cursor::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Uuid::nil(),
        );
        let json = String::from_utf8(URL_SAFE_NO_PAD.decode(cursor.encode()).unwrap()).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"id\""));
    }

    #[test]
    fn garbage_is_an_invalid_cursor_error() {
        let err = Cursor::decode("not-base64!!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCursor);

        // Valid base64, invalid payload.
        let token = URL_SAFE_NO_PAD.encode(b"{\"nope\":1}");
        let err = Cursor::decode(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCursor);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_law(
                secs in 0_i64..4_000_000_000,
                nanos in 0_u32..1_000_000_000,
                bytes in any::<[u8; 16]>(),
            ) {
                let created_at = chrono::Utc.timestamp_opt(secs, nanos).single().unwrap();
                let cursor = Cursor::new(created_at, Uuid::from_bytes(bytes));
                prop_assert_eq!(Cursor::decode(&cursor.encode()).unwrap(), cursor);
            }
        }
    }
}
