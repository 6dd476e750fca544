use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, regions::RegionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    First,
    Last,
    Number,
    Region,
}

impl FormField {
    /// Fields in the order they are rendered and checked on submit.
    pub const ALL: [FormField; 4] = [
        FormField::First,
        FormField::Last,
        FormField::Number,
        FormField::Region,
    ];

    /// Input name used by the form markup and the document attribute.
    pub fn name(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Number => "number",
            Self::Region => "region",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Last => "Last",
            Self::Number => "Number",
            Self::Region => "State",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = ValidationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "number" => Ok(Self::Number),
            "region" => Ok(Self::Region),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// In-memory state of the sign-up form, edited one field at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub first: String,
    pub last: String,
    pub number: String,
    pub region: String,
}

impl SignupForm {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::First => &self.first,
            FormField::Last => &self.last,
            FormField::Number => &self.number,
            FormField::Region => &self.region,
        }
    }

    /// Overwrites exactly one field. No validation happens here.
    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::First => &mut self.first,
            FormField::Last => &mut self.last,
            FormField::Number => &mut self.number,
            FormField::Region => &mut self.region,
        };
        *slot = value.into();
    }

    pub fn first_missing_field(&self) -> Option<FormField> {
        FormField::ALL
            .into_iter()
            .find(|field| self.field(*field).is_empty())
    }

    /// Checks presence of every field first, then region membership.
    ///
    /// Region matching is exact and case-sensitive: `"texas"` is rejected
    /// while `"Texas"` is accepted.
    pub fn validate(&self, regions: &RegionSet) -> Result<SignupRecord, ValidationError> {
        if let Some(field) = self.first_missing_field() {
            return Err(ValidationError::MissingField(field));
        }
        if !regions.contains(&self.region) {
            return Err(ValidationError::InvalidRegion(self.region.clone()));
        }

        Ok(SignupRecord {
            first: self.first.clone(),
            last: self.last.clone(),
            number: self.number.clone(),
            region: self.region.clone(),
        })
    }
}

/// A validated submission. Serializes to the persisted document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub first: String,
    pub last: String,
    pub number: String,
    pub region: String,
}

impl SignupRecord {
    pub fn greeting(&self) -> String {
        format!(
            "Hey there, {}. Thanks for signing up. You've just taken a step towards creating a greener future.",
            self.first
        )
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
