pub mod primary;
pub mod schema;

pub use primary::*;
pub use schema::*;
