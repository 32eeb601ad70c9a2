use std::time::Duration;

/// Wall-clock time of a commit, as a Unix timestamp.
///
/// Reads `Date.now()` in the browser and the system clock elsewhere.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(pub Duration);

impl Instant {
    /// The current time.
    pub fn now() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(any(feature = "hydrate", feature = "csr"))] {
                Instant(Duration::from_millis(js_sys::Date::now() as u64))
            } else {
                // A clock set before 1970 reads as the epoch.
                let since_epoch = std::time::SystemTime::now()
                    .duration_since(std::time::SystemTime::UNIX_EPOCH)
                    .unwrap_or_default();
                Instant(since_epoch)
            }
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }
}

impl std::fmt::Debug for Instant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instant").field(&self.as_millis()).finish()
    }
}
