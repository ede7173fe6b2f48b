//! Safe SQL builder: identifiers from declarations only, values as parameters.

mod builder;
pub mod dialect;
pub mod params;
pub use builder::*;
pub use dialect::Dialect;
pub use params::*;
