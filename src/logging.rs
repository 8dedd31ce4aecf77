use std::fmt;

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber. `RUST_LOG` wins over the
/// configured fallback filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

const MAX_LOGGED_TERM_CHARS: usize = 32;

/// Search terms are free-form user input; log a bounded, escaped form.
#[derive(Debug, Clone)]
pub struct LoggableSearchTerm(String);

impl LoggableSearchTerm {
    pub fn new(term: impl AsRef<str>) -> Self {
        Self(Self::sanitize(term.as_ref()))
    }

    fn sanitize(term: &str) -> String {
        let mut sanitized: String = term
            .chars()
            .take(MAX_LOGGED_TERM_CHARS)
            .flat_map(char::escape_debug)
            .collect();
        if term.chars().count() > MAX_LOGGED_TERM_CHARS {
            sanitized.push('…');
        }
        sanitized
    }
}

impl fmt::Display for LoggableSearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Note lifecycle events for structured logging
#[derive(Debug, Clone, Copy)]
pub enum NoteEvent {
    Created,
    Updated,
    Deleted,
    Searched,
    ValidationFailed,
    NotFound,
}

impl NoteEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteEvent::Created => "created",
            NoteEvent::Updated => "updated",
            NoteEvent::Deleted => "deleted",
            NoteEvent::Searched => "searched",
            NoteEvent::ValidationFailed => "validation_failed",
            NoteEvent::NotFound => "not_found",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NoteEvent::ValidationFailed | NoteEvent::NotFound)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log a note event; failures go out at `warn`, the rest at `info`.
#[macro_export]
macro_rules! log_note_event {
    ($event:expr, $($field:tt)*) => {
        if $event.is_failure() {
            tracing::warn!(
                note_event = %$event,
                event_type = "note",
                $($field)*
            );
        } else {
            tracing::info!(
                note_event = %$event,
                event_type = "note",
                $($field)*
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_term_is_kept() {
        assert_eq!(LoggableSearchTerm::new("ruby").to_string(), "ruby");
    }

    #[test]
    fn test_long_term_is_truncated() {
        let logged = LoggableSearchTerm::new("x".repeat(100)).to_string();
        assert_eq!(logged, format!("{}…", "x".repeat(MAX_LOGGED_TERM_CHARS)));
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(
            LoggableSearchTerm::new("a\nb\u{1b}").to_string(),
            "a\\nb\\u{1b}"
        );
    }

    #[test]
    fn test_failure_events() {
        assert!(NoteEvent::NotFound.is_failure());
        assert!(NoteEvent::ValidationFailed.is_failure());
        assert!(!NoteEvent::Created.is_failure());
        assert_eq!(NoteEvent::Deleted.to_string(), "deleted");
    }
}
