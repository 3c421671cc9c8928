pub mod error;
pub mod events;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use events::{Step, StreamEvent};
pub use storage::KeyValueStore;
pub use types::{BookmarkEntry, Document, PageRecord, SearchOutcome, UploadFlag};

/// Maximum number of page records kept in the local history.
pub const BATCH_SIZE: usize = 100;

/// Key under which the visited-page records are persisted.
pub const NAVIGATION_DATA_KEY: &str = "navigationData";

/// Key under which the generated user id is persisted.
pub const USER_ID_KEY: &str = "userId";

/// Key of the "what's new" notice flag for the current release.
pub const UPDATE_FLAG_KEY: &str = "sm-update-flag-v1.6";

/// User-facing message when a search fails without a more specific reason.
pub const GENERIC_ERROR_MESSAGE: &str = "There is a problem generating response";
