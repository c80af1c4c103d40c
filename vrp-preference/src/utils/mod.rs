//! Contains helper functionality shared across the crate.

mod errors;
pub use self::errors::*;

mod csv_io;
pub(crate) use self::csv_io::*;
