mod deployment;
mod fakes;
mod site;

pub use deployment::TestDeployment;
pub use fakes::{FailingTranscoder, StaticAnalytics, WebpTranscoder};
pub use site::{OWNER_PASSWORD, TestSite, key};
