//! Identifier generation
//!
//! Monotonic, time-ordered identifiers used to tag MCP sessions and
//! individual tool calls in log output.

use rand::Rng;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix types for different entity identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Session,
    Call,
    Turn,
}

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::Session => "ses",
            Prefix::Call => "cal",
            Prefix::Turn => "trn",
        }
    }
}

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// ID length (excluding prefix and underscore)
const ID_LENGTH: usize = 26;

fn random_base62(length: usize) -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Create a new ascending identifier with the given prefix.
///
/// Identifiers created within the same millisecond are ordered by a
/// per-process counter, so they still sort in creation order.
pub fn ascending(prefix: Prefix) -> String {
    let timestamp = current_timestamp_ms();

    let last = LAST_TIMESTAMP.swap(timestamp, Ordering::SeqCst);
    let counter = if timestamp != last {
        COUNTER.store(1, Ordering::SeqCst);
        1
    } else {
        COUNTER.fetch_add(1, Ordering::SeqCst) + 1
    };

    let now = (timestamp as u128) * 0x1000 + (counter as u128);

    // 6 bytes of time + counter, big-endian, as hex
    let time_hex: String = (0..6)
        .map(|i| format!("{:02x}", ((now >> (40 - 8 * i)) & 0xff) as u8))
        .collect();

    format!(
        "{}_{}{}",
        prefix.as_str(),
        time_hex,
        random_base62(ID_LENGTH - 12)
    )
}
