//! Domain types shared by the sign-up form, its persistence pathway, and the front ends.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod regions;
