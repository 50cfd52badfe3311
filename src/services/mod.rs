pub mod admin_service;
pub mod audit_service;
pub mod spin_service;

pub use admin_service::*;
pub use audit_service::*;
pub use spin_service::*;
