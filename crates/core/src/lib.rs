pub mod analytics;
pub mod clock;
pub mod content_key;
pub mod error;
pub mod ids;
pub mod list;
pub mod merge;
pub mod notice;
pub mod path;
pub mod plan;
pub mod token;

pub use content_key::ContentKey;
pub use error::CoreError;
pub use ids::*;
pub use list::{AddOutcome, ListItem, ListManager, SortOrder};
pub use merge::{deep_merge, resolve_uploads};
pub use path::{DocPath, PathSegment};
pub use plan::{Plan, SiteContext};
