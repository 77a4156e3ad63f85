//! Small helpers: conversation IDs, relative time display, debouncing.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tokio::task::JoinHandle;

/// Generates a numeric memory ID that fits the server's integer range.
///
/// Truncates the current epoch milliseconds to 9 digits.
pub fn generate_memory_id() -> i64 {
    Utc::now().timestamp_millis() % 1_000_000_000
}

/// Builds a locally generated conversation identifier.
pub fn new_conversation_id() -> String {
    format!("conversation_{}", generate_memory_id())
}

/// Formats a timestamp relative to now for transcript display.
pub fn format_relative_time(date: DateTime<Local>) -> String {
    let elapsed = Local::now().signed_duration_since(date);

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}

/// Trailing-edge debouncer: only the last call within the window fires.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `f` to run after the delay, cancelling any earlier pending
    /// call. Must be called from within a tokio runtime.
    pub fn call<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeDelta;

    use super::*;

    /// Memory IDs stay within 9 digits.
    #[test]
    fn test_memory_id_fits_int_range() {
        let id = generate_memory_id();
        assert!((0..1_000_000_000).contains(&id));
    }

    /// Conversation IDs carry the fixed prefix.
    #[test]
    fn test_conversation_id_prefix() {
        let id = new_conversation_id();
        assert!(id.starts_with("conversation_"));
        assert!(id["conversation_".len()..].parse::<i64>().is_ok());
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Local::now();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(
            format_relative_time(now - TimeDelta::minutes(5)),
            "5m ago"
        );
        assert_eq!(format_relative_time(now - TimeDelta::hours(3)), "3h ago");

        let old = now - TimeDelta::days(2);
        assert_eq!(format_relative_time(old), old.format("%Y-%m-%d").to_string());
    }

    /// Rapid calls collapse into a single trailing invocation.
    #[tokio::test(start_paused = true)]
    async fn test_debouncer_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            debouncer.call(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
