mod address;
mod location;

pub use address::{Address, Coordinates};
pub use location::Location;
