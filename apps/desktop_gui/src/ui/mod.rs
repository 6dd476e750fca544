//! UI layer: the sign-up window and its alert dialog.

pub mod app;

pub use app::SignupFormApp;
