//! Loading and validation of case catalogs, pattern tables and goals.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
