use sha2::{Digest, Sha256};

use crate::core::guard;
use crate::core::models::SinkRecord;

/// Longest group or deduplication id SQS accepts.
pub const MAX_ID_LENGTH: usize = 128;

/// Ids over [`MAX_ID_LENGTH`] are replaced by the hex SHA-256 of the full id.
#[must_use]
pub fn fit_id(id: String) -> String {
    if id.len() <= MAX_ID_LENGTH {
        id
    } else {
        hex::encode(Sha256::digest(id.as_bytes()))
    }
}

/// `{topic}-{partition}-{offset}`, unique per log position.
///
/// `None` for a negative partition or offset. With both non-negative the two
/// rightmost dashes always delimit them, whatever the topic ends with.
#[must_use]
pub fn dedup_id(record: &SinkRecord) -> Option<String> {
    if record.partition < 0 || record.offset < 0 {
        return None;
    }
    Some(fit_id(format!(
        "{}-{}-{}",
        record.topic, record.partition, record.offset
    )))
}

/// The record key, or the topic when the key is missing or blank.
#[must_use]
pub fn group_id(record: &SinkRecord) -> String {
    let group = match record.key.as_deref() {
        Some(key) if !guard::is_blank(key) => key,
        _ => record.topic.as_str(),
    };
    fit_id(group.to_string())
}
