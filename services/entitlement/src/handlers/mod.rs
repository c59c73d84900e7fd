pub mod claim;
pub mod contact;
pub mod verification;
