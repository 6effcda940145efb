//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an inventory entry.
///
/// Assigned by the store on insert (a `BIGSERIAL` in Postgres) and never changed
/// afterwards. Valid identifiers are strictly positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::invalid_id(format!(
                "EntryId must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse an identifier supplied in a JSON body.
    ///
    /// Clients send either a number or a numeric string; `null` and absence are
    /// both treated as "not supplied".
    pub fn from_json(value: Option<&serde_json::Value>) -> Result<Self, DomainError> {
        match value {
            None | Some(serde_json::Value::Null) => Err(DomainError::invalid_id("ID is required")),
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(v) => Self::new(v),
                None => Err(DomainError::invalid_id(format!("EntryId: not an integer: {n}"))),
            },
            Some(serde_json::Value::String(s)) => s.parse(),
            Some(other) => Err(DomainError::invalid_id(format!(
                "EntryId: unexpected value {other}"
            ))),
        }
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<EntryId> for i64 {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

impl FromStr for EntryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_id("ID is required"));
        }
        let value = i64::from_str(s).map_err(|e| DomainError::invalid_id(format!("EntryId: {e}")))?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_query_string_ids() {
        assert_eq!("42".parse::<EntryId>().unwrap().get(), 42);
        assert_eq!(" 7 ".parse::<EntryId>().unwrap().get(), 7);
        assert!(matches!("".parse::<EntryId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("abc".parse::<EntryId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("0".parse::<EntryId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn parses_body_ids() {
        assert_eq!(EntryId::from_json(Some(&json!(5))).unwrap().get(), 5);
        assert_eq!(EntryId::from_json(Some(&json!("12"))).unwrap().get(), 12);
        assert!(EntryId::from_json(None).is_err());
        assert!(EntryId::from_json(Some(&json!(null))).is_err());
        assert!(EntryId::from_json(Some(&json!(1.5))).is_err());
        assert!(EntryId::from_json(Some(&json!(-3))).is_err());
    }
}
