//! Coalesces bursts of search triggers into one search

use std::time::{Duration, Instant};

/// Idle time required after the last input trigger
pub const QUIET_WINDOW: Duration = Duration::from_millis(750);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Typing, toggles and selects; waits for the quiet window
    Input,
    /// Page buttons and the page field; runs at once
    Pagination,
}

/// Poll-driven debouncer. Callers pass the current time, so it never sleeps.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    last_trigger: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            last_trigger: None,
        }
    }

    /// Record a trigger. Returns the args to run immediately for pagination.
    ///
    /// A pagination trigger also drops any pending input trigger, since its
    /// args already carry the latest filter values.
    pub fn trigger(&mut self, args: T, kind: TriggerKind, now: Instant) -> Option<T> {
        match kind {
            TriggerKind::Pagination => Some(self.fire_now(args)),
            TriggerKind::Input => {
                self.pending = Some(args);
                self.last_trigger = Some(now);
                None
            }
        }
    }

    /// Bypass the window, dropping whatever was waiting
    pub fn fire_now(&mut self, args: T) -> T {
        self.cancel();
        args
    }

    /// Take the coalesced args once the quiet window has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_trigger = None;
        self.pending.take()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_trigger.map(|last| last + self.window)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_trigger = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(QUIET_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_collapses_to_last_args() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        let mut fired = Vec::new();

        for i in 0..5u64 {
            let now = start + ms(i * 100);
            assert_eq!(debouncer.trigger(i, TriggerKind::Input, now), None);
            if let Some(args) = debouncer.poll(now) {
                fired.push(args);
            }
        }
        assert!(fired.is_empty());

        // window counts from the last trigger at 400ms
        assert_eq!(debouncer.poll(start + ms(1000)), None);
        fired.extend(debouncer.poll(start + ms(1150)));
        fired.extend(debouncer.poll(start + ms(2000)));
        assert_eq!(fired, vec![4]);
    }

    #[test]
    fn test_spaced_triggers_fire_independently() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();

        debouncer.trigger("first", TriggerKind::Input, start);
        assert_eq!(debouncer.poll(start + ms(750)), Some("first"));

        debouncer.trigger("second", TriggerKind::Input, start + ms(900));
        assert_eq!(debouncer.poll(start + ms(1700)), Some("second"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_pagination_bypasses_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();

        debouncer.trigger("typing", TriggerKind::Input, start);
        assert_eq!(
            debouncer.trigger("page 2", TriggerKind::Pagination, start + ms(10)),
            Some("page 2")
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + ms(5000)), None);
    }

    #[test]
    fn test_deadline_tracks_last_trigger() {
        let start = Instant::now();
        let mut debouncer: Debouncer<u8> = Debouncer::new(ms(50));
        assert_eq!(debouncer.deadline(), None);
        debouncer.trigger(1, TriggerKind::Input, start);
        debouncer.trigger(2, TriggerKind::Input, start + ms(20));
        assert_eq!(debouncer.deadline(), Some(start + ms(70)));
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + ms(100)), None);
    }
}
