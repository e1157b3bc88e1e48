//! Domain definitions.

pub mod identity;
pub mod interview;
pub mod route;

pub use self::{
    identity::{Identity, Session},
    interview::InterviewRecord,
};
