//! Remote collaborator boundary: the cloud session traits, the HTTP-backed
//! implementation used by the binary, and the notification sinks.

pub mod http;
pub mod notify;
pub mod session;

pub use http::HttpCloudClient;
pub use notify::{LogNotifier, NotifySink, WebhookNotifier};
pub use session::{CloudClient, CloudSession, FamilyGroup, SignBonus};
