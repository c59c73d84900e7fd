//! sea-orm entities for the entitlement service tables.

pub mod claimed_vouchers;
pub mod contact_messages;
pub mod users;
pub mod verification_codes;
pub mod vouchers;
