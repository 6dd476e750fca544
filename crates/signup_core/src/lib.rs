//! Sign-up form controller and the create-record pathway behind it.

pub mod config;
pub mod form;
pub mod service;

pub use config::{build_store, load_settings, Settings, StoreBackend};
pub use form::{FormController, Notifier, RecordSink};
pub use service::{insert_record, CreateRecordError, SignupService};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
