use std::collections::HashMap;
use std::time::Duration;

/// Cheap 32-bit rolling hash (`h * 31 + unit` over UTF-16 code units) of a raw
/// message body. Only used to suppress repeats, never for integrity.
///
/// A collision inside the window drops the newer message.
pub fn fingerprint(body: &str) -> u32 {
    body.encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Short-lived `fingerprint -> first seen` table.
///
/// Mutation observers can report one logical change several times; this
/// keeps the handler from running more than once per window.
#[derive(Debug, Clone)]
pub struct DedupCache {
    window_ms: u64,
    seen: HashMap<u32, u64>,
}

impl DedupCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            seen: HashMap::new(),
        }
    }

    /// First sight (or sight after the window lapsed) records `now_ms` and
    /// returns true; a repeat inside the window returns false.
    pub fn should_process(&mut self, fingerprint: u32, now_ms: u64) -> bool {
        match self.seen.get(&fingerprint) {
            Some(first_seen) if now_ms.saturating_sub(*first_seen) < self.window_ms => false,
            _ => {
                self.seen.insert(fingerprint, now_ms);
                true
            }
        }
    }

    /// Evict entries older than the window. Returns how many were removed.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let before = self.seen.len();
        let window = self.window_ms;
        self.seen
            .retain(|_, first_seen| now_ms.saturating_sub(*first_seen) < window);
        before - self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
