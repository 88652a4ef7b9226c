//! HTTP routes exposed by the edge service.

pub mod health;
pub mod icon;
