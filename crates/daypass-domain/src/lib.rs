//! Domain types shared across Daypass services.
//!
//! Pure types with no framework dependencies.

pub mod id;
pub mod user;
pub mod verification;
