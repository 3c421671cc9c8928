//! Page-visit capture: turning a loaded page into a history record, plus reading
//! bookmark trees for the bookmark corpus.

pub mod bookmarks;
pub mod extract;
pub mod observer;
pub mod record;

pub use bookmarks::{collect_bookmarks, load_bookmarks};
pub use extract::{extract_content, PageContent, PARAGRAPH_BUDGET};
pub use observer::{fetch_page, VisitObserver};
pub use record::{build_record, format_capture_date, is_capturable};

pub mod prelude {
    pub use super::observer::VisitObserver;
    pub use sm_core::{BookmarkEntry, Error, PageRecord, Result};
}
