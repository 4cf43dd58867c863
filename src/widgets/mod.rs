//! User interface components shared between the roster pages.

pub mod actions;
pub mod alert;
pub mod non_public;
