mod unverify;

pub use unverify::UnverifyOrganization;
