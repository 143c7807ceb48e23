//! Per-type property schema and columnar storage (§3, §4.2, §4.3).

mod error;
mod filter;
mod schema;
mod store;
mod value;

pub use error::Error;
pub use filter::{count, ids, Operator, Sort};
pub use schema::Schema;
pub use store::Store;
pub use value::{Kind, Value};
