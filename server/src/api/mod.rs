//! JSON API handlers, one module per resource.

pub mod availability;
pub mod favorites;
pub mod properties;
pub mod reservations;
pub mod reviews;
pub mod users;
