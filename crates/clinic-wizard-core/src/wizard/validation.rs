//! Field-keyed validation messages.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{is_filled, FieldKey};

/// Ordered map of field → human-readable message.
///
/// An empty map means the validated step is clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors<F: FieldKey>(BTreeMap<F, String>);

impl<F: FieldKey> Default for ValidationErrors<F> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<F: FieldKey> ValidationErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; the first message for a field wins.
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Drop the message for a field, returning it if there was one.
    pub fn remove(&mut self, field: F) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: F) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Fold another step's messages into this one.
    pub fn merge(&mut self, other: ValidationErrors<F>) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    /// Add `message` unless the text field is filled.
    pub(crate) fn require_text(&mut self, field: F, value: &Option<String>, message: &str) {
        if !is_filled(value) {
            self.insert(field, message);
        }
    }

    /// Add `message` unless the value is present.
    pub(crate) fn require<T>(&mut self, field: F, value: &Option<T>, message: &str) {
        if value.is_none() {
            self.insert(field, message);
        }
    }
}

/// Serializes keyed by wire name, e.g. `{"firstName": "First name is required"}`.
impl<F: FieldKey> Serialize for ValidationErrors<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, message) in &self.0 {
            map.serialize_entry(field.name(), message)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientField;

    #[test]
    fn test_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.insert(PatientField::FirstName, "First name is required");
        errors.insert(PatientField::FirstName, "something else");
        assert_eq!(errors.get(PatientField::FirstName), Some("First name is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_require_text_treats_blank_as_missing() {
        let mut errors = ValidationErrors::new();
        errors.require_text(PatientField::Address, &Some("   ".into()), "Address is required");
        errors.require_text(PatientField::LastName, &Some("Pérez".into()), "unused");
        assert!(errors.contains(PatientField::Address));
        assert!(!errors.contains(PatientField::LastName));
    }

    #[test]
    fn test_serializes_by_wire_name() {
        let mut errors = ValidationErrors::new();
        errors.insert(PatientField::ParentAFirstName, "Required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "parentA_firstName": "Required" }));
    }
}
