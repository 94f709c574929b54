//! Node id generation
//!
//! A millisecond timestamp alone collides when a batch of suggestions is
//! inserted in one event, so every id also carries a random uuid fragment.

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix taken from a v4 uuid
const RANDOM_SUFFIX_LEN: usize = 8;

/// Produces ids of the form `{millis:013}-{random hex}`.
///
/// The zero padded timestamp keeps lexicographic id order aligned with
/// creation order across milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_id(&self) -> String {
        let millis = Utc::now().timestamp_millis().max(0);
        let random = Uuid::new_v4().simple().to_string();
        format!("{millis:013}-{}", &random[..RANDOM_SUFFIX_LEN])
    }
}
