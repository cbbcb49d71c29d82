//! Data loading and validation for game tables and the card catalog.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
