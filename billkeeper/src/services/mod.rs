//! Services module
//!
//! Screen-level logic over the store: search, reports, notifications and
//! sign-in flows.

pub mod auth;
pub mod credentials;
pub mod notifications;
pub mod reports;
pub mod search;

pub use auth::AuthService;
pub use credentials::{CredentialStore, KeyringCredentials, MemoryCredentials, StoredCredentials};
pub use notifications::{Notification, NotificationKind};
pub use search::{search_bills, BillQuery, BillSort, SortOrder};
