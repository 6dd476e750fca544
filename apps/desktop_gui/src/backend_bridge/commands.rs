//! Backend commands queued from UI to backend worker.

use shared::domain::SignupRecord;

#[derive(Debug)]
pub enum BackendCommand {
    CreateRecord { record: SignupRecord },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRecord { .. } => "create_record",
        }
    }
}
