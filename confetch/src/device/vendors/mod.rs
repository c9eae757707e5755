//! Built-in vendor profiles.

pub mod fortigate;
pub mod juniper_sw;
pub mod palo_alto;
