//! Identifier generation for block instances.
//!
//! Port identifiers are never generated directly: an instance port id is
//! derived from its block id plus the port's template-local key, see
//! [`crate::model::PortId::instance`].

use std::fmt;

use uuid::Uuid;

/// A source of session-unique identifier strings.
///
/// Returned strings must be safe to embed as structural keys and to
/// concatenate with a separator (no `:` inside).
pub trait IdSource: fmt::Debug {
    /// Produce the next identifier. Never returns a value twice.
    fn next_id(&mut self) -> String;
}

/// Random 128-bit identifiers (UUID v4, hyphenated form).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().hyphenated().to_string()
    }
}

/// Deterministic identifiers `"{prefix}{n}"`, used for script replay and tests.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    counter: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("b")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_distinct_and_separator_free() {
        let mut ids = UuidIds;
        let seen: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
        assert!(seen.iter().all(|s| !s.contains(':') && s.len() == 36));
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("blk");
        assert_eq!(ids.next_id(), "blk1");
        assert_eq!(ids.next_id(), "blk2");
    }
}
