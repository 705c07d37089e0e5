//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A post authored by a user.
///
/// The record round-trips through the cache as JSON, so the serialized form
/// must stay lossless. Timestamps are carried as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hashed_password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn post_record_json_roundtrip() {
        let post = PostRecord {
            id: 42,
            user_id: 7,
            content: "hello".to_string(),
            created_at: datetime!(2024-05-01 12:00:00 UTC),
            updated_at: datetime!(2024-05-01 12:30:00 UTC),
        };

        let encoded = serde_json::to_string(&post).expect("post serializes");
        let decoded: PostRecord = serde_json::from_str(&encoded).expect("post deserializes");

        assert_eq!(decoded, post);
    }

    #[test]
    fn post_record_timestamps_keep_second_precision() {
        let post = PostRecord {
            id: 1,
            user_id: 1,
            content: String::new(),
            created_at: datetime!(2024-05-01 12:00:59 UTC),
            updated_at: datetime!(2024-05-01 12:00:59 UTC),
        };

        let decoded: PostRecord =
            serde_json::from_str(&serde_json::to_string(&post).expect("serialize"))
                .expect("deserialize");
        assert_eq!(
            decoded.created_at.unix_timestamp(),
            post.created_at.unix_timestamp()
        );
    }
}
