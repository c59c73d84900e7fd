//! Request identity types shared across Daypass services.
//!
//! Session and credential verification happen upstream at the gateway; services
//! only read what the gateway injected.

pub mod client_ip;
pub mod identity;
