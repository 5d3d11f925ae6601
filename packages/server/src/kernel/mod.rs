// Kernel - infrastructure layer
//
// External-service clients and the trait seams that let tests swap them for
// deterministic fakes. Business logic lives in domains/ and only touches
// infrastructure through the Base* traits defined here.

pub mod mailer;
pub mod postcode_client;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use mailer::MailerClient;
pub use postcode_client::PostcodeApiClient;
pub use scheduled_tasks::VerificationScheduler;
pub use traits::{BaseGeocoder, BaseMailer, BaseOrganizationStore, OutboundEmail};
