use std::fmt;

/// Longest event type accepted from callers.
pub const MAX_EVENT_TYPE_LEN: usize = 64;

/// Event type used by the synchronous test send.
pub const TEST_EVENT: &str = "test";

/// Subscriptions created without an explicit event list receive these.
pub const DEFAULT_EVENTS: [&str; 3] = ["booking.created", "booking.updated", "booking.cancelled"];

/// A dotted, lowercase event name such as `booking.created`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EventType(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTypeError {
    Empty,
    TooLong,
    InvalidSyntax(String),
}

impl fmt::Display for EventTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTypeError::Empty => write!(f, "event type must not be empty"),
            EventTypeError::TooLong => {
                write!(f, "event type must be at most {MAX_EVENT_TYPE_LEN} characters")
            }
            EventTypeError::InvalidSyntax(raw) => write!(
                f,
                "invalid event type `{raw}`: expected lowercase segments separated by dots"
            ),
        }
    }
}

impl EventType {
    pub fn parse(raw: &str) -> Result<Self, EventTypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EventTypeError::Empty);
        }
        if raw.len() > MAX_EVENT_TYPE_LEN {
            return Err(EventTypeError::TooLong);
        }
        let valid = raw.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        });
        if !valid {
            return Err(EventTypeError::InvalidSyntax(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Rehydrate a value that was validated before it was persisted.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn test() -> Self {
        Self(TEST_EVENT.to_string())
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_EVENTS
            .iter()
            .map(|name| Self((*name).to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a caller-supplied list into a deduplicated set, keeping first-seen order.
pub fn parse_event_set(raw: &[String]) -> Result<Vec<EventType>, EventTypeError> {
    let mut events: Vec<EventType> = Vec::with_capacity(raw.len());
    for entry in raw {
        let event = EventType::parse(entry)?;
        if !events.contains(&event) {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_dotted_lowercase_name_when_parse_should_accept() {
        let event = EventType::parse(" booking.created ").unwrap();
        assert_eq!(event.as_str(), "booking.created");
    }

    #[test]
    fn given_uppercase_or_empty_segment_when_parse_should_reject() {
        assert!(matches!(
            EventType::parse("Booking.created"),
            Err(EventTypeError::InvalidSyntax(_))
        ));
        assert!(matches!(
            EventType::parse("booking..created"),
            Err(EventTypeError::InvalidSyntax(_))
        ));
        assert_eq!(EventType::parse("   "), Err(EventTypeError::Empty));
    }

    #[test]
    fn given_overlong_name_when_parse_should_reject() {
        let raw = "a".repeat(MAX_EVENT_TYPE_LEN + 1);
        assert_eq!(EventType::parse(&raw), Err(EventTypeError::TooLong));
    }

    #[test]
    fn given_duplicates_when_parse_event_set_should_dedupe_in_order() {
        let raw = vec![
            "booking.updated".to_string(),
            "booking.created".to_string(),
            "booking.updated".to_string(),
        ];
        let events = parse_event_set(&raw).unwrap();
        let names: Vec<&str> = events.iter().map(EventType::as_str).collect();
        assert_eq!(names, vec!["booking.updated", "booking.created"]);
    }

    #[test]
    fn given_defaults_should_cover_booking_lifecycle() {
        let names: Vec<String> = EventType::defaults()
            .into_iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["booking.created", "booking.updated", "booking.cancelled"]
        );
    }
}
