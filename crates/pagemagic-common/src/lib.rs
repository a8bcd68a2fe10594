//! Shared types for PageMagic.
//!
//! Holds the error taxonomy, the persisted data model (history entries,
//! usage records, scope keys), the storage key layout and the message
//! protocol spoken between the popup and the page.

pub mod errors;
pub mod history;
pub mod id;
pub mod keys;
pub mod messages;
pub mod scope;
pub mod usage;

pub use errors::{ConfigError, MessagingError, PageMagicError, StorageError};
pub use history::{all_disabled, applied_css, HistoryEntry};
pub use id::new_id;
pub use messages::{PageRequest, PageResponse};
pub use scope::{ScopeKey, ScopeKind};
pub use usage::{DailyUsage, ModelUsage, TokenCounts, TotalUsage};

pub type Result<T> = std::result::Result<T, PageMagicError>;
