mod organization;

pub use organization::{Administrator, Organization, PostgresOrganizationStore};
