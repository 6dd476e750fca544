//! Backend-to-UI events and error modeling for the sign-up window.
//!
//! Store outcomes never travel this way; only worker lifecycle does.

pub enum UiEvent {
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    CommandQueue,
}

#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn label(&self) -> &'static str {
        match self.context {
            UiErrorContext::BackendStartup => "Backend startup",
            UiErrorContext::CommandQueue => "Command queue",
        }
    }
}
