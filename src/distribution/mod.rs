pub mod aggregate;
pub mod error;
pub mod extract;
pub mod filter;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod tabulate;

pub use error::{ItnError, Result};
