//! Read model of applicant profiles consumed by the forms engine.

pub mod domain;
pub mod source;

pub use domain::{PhotoId, Profile, ProfileId, UserId};
pub use source::{ProfileError, ProfileSource};
