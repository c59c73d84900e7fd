pub mod claim;
pub mod contact;
pub mod rate_limit;
pub mod verification;
