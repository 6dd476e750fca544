use std::sync::Arc;

use shared::{
    domain::{FormField, SignupForm, SignupRecord},
    error::ValidationError,
    regions::RegionSet,
};
use tracing::{debug, info, warn};

/// Blocking user notification. Success and rejection messages share it.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Receives validated records. Implementations must not block on persistence;
/// the outcome is never reported back to the form.
pub trait RecordSink {
    fn create_record(&self, record: SignupRecord);
}

pub struct FormController<N, S> {
    form: SignupForm,
    regions: Arc<RegionSet>,
    notifier: N,
    sink: S,
}

impl<N: Notifier, S: RecordSink> FormController<N, S> {
    pub fn new(regions: Arc<RegionSet>, notifier: N, sink: S) -> Self {
        Self {
            form: SignupForm::default(),
            regions,
            notifier,
            sink,
        }
    }

    pub fn form(&self) -> &SignupForm {
        &self.form
    }

    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.update_field(field, value);
        debug!(field = field.name(), "form field updated");
    }

    /// Same as [`Self::update_field`], addressed by the input's `name`.
    pub fn update_field_by_name(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let field = name.parse::<FormField>()?;
        self.update_field(field, value);
        Ok(())
    }

    /// Validates the current form and, if it passes, alerts the user and then
    /// hands the record to the sink.
    ///
    /// The success alert goes out before persistence starts, so the user sees
    /// it whatever the store later does. Form state is left as-is.
    pub fn submit(&self) -> Result<SignupRecord, ValidationError> {
        let record = match self.form.validate(&self.regions) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "sign-up submission rejected");
                self.notifier.alert(&err.user_message());
                return Err(err);
            }
        };

        info!(region = %record.region, "sign-up submission accepted");
        self.notifier.alert(&record.greeting());
        self.sink.create_record(record.clone());
        Ok(record)
    }
}
