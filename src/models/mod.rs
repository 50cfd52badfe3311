pub mod admin;
pub mod common;
pub mod prize;
pub mod spin;

pub use admin::*;
pub use common::*;
pub use prize::*;
pub use spin::*;
