use thiserror::Error;

use crate::domain::FormField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(FormField),
    #[error("'{0}' is not a recognized region")]
    InvalidRegion(String),
    #[error("unknown form field '{0}'")]
    UnknownField(String),
}

impl ValidationError {
    /// Text shown in the alert dialog when a submission is rejected.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!(
                "Please fill in every field before submitting ({} is empty).",
                field.label()
            ),
            Self::InvalidRegion(region) => {
                format!("'{region}' is not a recognized state. Please enter its full name, e.g. Texas.")
            }
            Self::UnknownField(name) => format!("The form has no field named '{name}'."),
        }
    }
}
