//! Request body validation for create/update.
//!
//! Clients send count fields in camelCase (`steakKnives`) while the read model is
//! snake_case (`steak_knives`); both spellings are accepted on input.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use cutlery_core::{DomainError, DomainResult, EntryId};

use crate::entry::{EntryFields, ItemCounts};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw JSON object received as a create/update body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPayload {
    fields: Map<String, Value>,
}

impl EntryPayload {
    /// Parse a request body. An empty body is treated as `{}`.
    pub fn from_slice(body: &[u8]) -> DomainResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) => Err(DomainError::validation("request body must be a JSON object")),
            Err(e) => Err(DomainError::validation(format!("malformed JSON body: {e}"))),
        }
    }

    /// Identifier addressed by an update.
    pub fn id(&self) -> DomainResult<EntryId> {
        EntryId::from_json(self.fields.get("id"))
    }

    /// Validate the full field set.
    ///
    /// Venue, date and the nine item counts are required; `ashtrays` defaults to 0
    /// and the responsible fields default to null.
    pub fn to_fields(&self) -> DomainResult<EntryFields> {
        let venue = self.required_str("venue")?.trim().to_string();
        if venue.is_empty() {
            return Err(DomainError::missing("venue"));
        }
        let date = parse_date("date", self.required_str("date")?)?;

        let counts = ItemCounts {
            forks: self.count("forks", &["forks"])?,
            knives: self.count("knives", &["knives"])?,
            steak_knives: self.count("steakKnives", &["steakKnives", "steak_knives"])?,
            spoons: self.count("spoons", &["spoons"])?,
            dessert_spoons: self.count("dessertSpoons", &["dessertSpoons", "dessert_spoons"])?,
            ice_cooler: self.count("iceCooler", &["iceCooler", "ice_cooler"])?,
            plates: self.count("plates", &["plates"])?,
            sugar_tongs: self.count("sugarTongs", &["sugarTongs", "sugar_tongs"])?,
            ice_tongs: self.count("iceTongs", &["iceTongs", "ice_tongs"])?,
            ashtrays: self.optional_count("ashtrays")?.unwrap_or(0),
        };

        let responsible_name = self
            .optional_str("responsible_name", &["responsible_name", "responsibleName"])?
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let responsible_date =
            match self.optional_str("responsible_date", &["responsible_date", "responsibleDate"])? {
                Some(s) if !s.trim().is_empty() => Some(parse_date("responsible_date", s)?),
                _ => None,
            };

        Ok(EntryFields {
            venue,
            date,
            counts,
            responsible_name,
            responsible_date,
        })
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn required_str(&self, key: &'static str) -> DomainResult<&str> {
        match self.present(key) {
            None => Err(DomainError::missing(key)),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(DomainError::validation(format!("{key} must be a string"))),
        }
    }

    fn optional_str(&self, name: &'static str, keys: &[&str]) -> DomainResult<Option<&str>> {
        match keys.iter().find_map(|k| self.present(k)) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(DomainError::validation(format!("{name} must be a string"))),
        }
    }

    fn count(&self, name: &'static str, keys: &[&str]) -> DomainResult<i32> {
        let value = keys
            .iter()
            .find_map(|k| self.present(k))
            .ok_or(DomainError::missing(name))?;
        to_count(name, value)
    }

    fn optional_count(&self, key: &'static str) -> DomainResult<Option<i32>> {
        self.present(key).map(|v| to_count(key, v)).transpose()
    }
}

fn to_count(name: &str, value: &Value) -> DomainResult<i32> {
    let n = value
        .as_i64()
        .ok_or_else(|| DomainError::validation(format!("{name} must be an integer")))?;
    if n < 0 {
        return Err(DomainError::validation(format!("{name} must not be negative")));
    }
    i32::try_from(n).map_err(|_| DomainError::validation(format!("{name} is too large")))
}

fn parse_date(name: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| DomainError::validation(format!("{name} must be a YYYY-MM-DD date: {e}")))
}
