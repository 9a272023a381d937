//! Per-field validation messages collected while checking a submitted form.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub(crate) const REQUIRED: &str = "This field is required.";

/// Messages keyed by form field name.
///
/// Every field is checked before returning, so one submission reports all of
/// its problems at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field` (empty when the field is valid).
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterates `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (field.as_str(), m.as_str())))
    }

    /// Returns `Ok(value)` when no message was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Returns the trimmed value, or records "required" and returns `None`.
pub(crate) fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    Some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("amount", "Enter a number.");
        errors.add("date", REQUIRED);
        errors.add("amount", "second");

        assert_eq!(errors.get("amount").len(), 2);
        assert!(errors.contains("date"));
        assert!(errors.get("category").is_empty());
        assert_eq!(
            errors.to_string(),
            "amount: Enter a number.; amount: second; date: This field is required."
        );
    }

    #[test]
    fn blank_value_is_required() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "description", "  "), None);
        assert_eq!(required(&mut errors, "category", " food "), Some("food"));
        assert_eq!(errors.get("description"), [REQUIRED.to_string()]);
    }
}
