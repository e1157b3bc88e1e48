//! Read entities definitions.

pub mod interview;
