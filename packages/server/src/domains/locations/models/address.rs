use serde::{Deserialize, Serialize};

/// Geographic coordinates resolved from a postcode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// An address as handled by the sync coordinator: free-text lines plus the
/// postcode and the coordinates derived from it.
///
/// This is a value object passed in from the entity-CRUD layer on create and
/// update; persistence stays with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub coordinates: Option<Coordinates>,
}
