pub mod locations;
pub mod organization;
pub mod verification;
