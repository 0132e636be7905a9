use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Quiet-period filter for search keystrokes.
///
/// Each keystroke restarts the timer. When it expires the pending value is
/// emitted unless it equals the last emitted one.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
    last_emitted: Option<String>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_emitted: None,
        }
    }

    /// Treat `value` as already emitted, e.g. a term restored at startup.
    pub fn seed(&mut self, value: impl Into<String>) {
        self.last_emitted = Some(value.into());
    }

    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some((value.into(), now + self.quiet));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, due)) if now >= *due => {}
            _ => return None,
        }
        let (value, _) = self.pending.take()?;
        if self.last_emitted.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.last_emitted = Some(value.clone());
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_only_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(300));
        debouncer.input("lo", start);
        debouncer.input("log", start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(350)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(400)),
            Some("log".to_string())
        );
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn suppresses_unchanged_value() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::default();
        debouncer.input("bug", start);
        assert!(debouncer.poll(start + DEFAULT_SEARCH_DEBOUNCE).is_some());

        debouncer.input("bugs", start + Duration::from_secs(1));
        debouncer.input("bug", start + Duration::from_millis(1100));
        assert_eq!(debouncer.poll(start + Duration::from_secs(2)), None);
    }

    #[test]
    fn seeded_value_counts_as_emitted() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::default();
        debouncer.seed("crash");
        debouncer.input("crash", start);
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
        debouncer.input("", start + Duration::from_secs(1));
        assert_eq!(
            debouncer.poll(start + Duration::from_secs(2)),
            Some(String::new())
        );
    }
}
