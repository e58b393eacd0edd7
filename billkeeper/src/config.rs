//! Application configuration constants
//!
//! Central location for storage keys, defaults, and validation boundaries
//! used throughout the application, plus the small runtime configuration
//! read at startup.

use std::path::PathBuf;

// ===== Persistence =====

/// Key of the single slot that holds the serialized store snapshot
pub const STORAGE_KEY: &str = "bill-management-storage";

/// File name of the snapshot when the JSON file backend is used
pub const SNAPSHOT_FILE_NAME: &str = "bill-management-storage.json";

/// File name of the SQLite key-value database
pub const DATABASE_FILE_NAME: &str = "billkeeper.db";

/// Version stamped into the persisted snapshot envelope
pub const SNAPSHOT_VERSION: u32 = 0;

// ===== User Defaults =====

/// Display name given to a freshly signed-in user
pub const DEFAULT_USER_NAME: &str = "User";

/// Currency assigned to new users (ISO 4217)
pub const DEFAULT_CURRENCY: &str = "USD";

/// Language assigned to new users
pub const DEFAULT_LANGUAGE: &str = "en";

// ===== Presentation =====

/// Label used wherever a bill's category no longer exists
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Number of bills shown in the dashboard's recent list
pub const RECENT_BILLS_LIMIT: usize = 3;

/// Unpaid bills due within this many days raise a due-soon notification
pub const DUE_SOON_WINDOW_DAYS: i64 = 3;

// ===== Validation Limits =====

/// Maximum length of a bill description in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Maximum number of attachments on a single bill
pub const MAX_ATTACHMENTS_PER_BILL: usize = 20;

/// Maximum length of a category name in characters
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

// ===== Runtime Configuration =====

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "BILLKEEPER_DATA_DIR";

/// Environment variable selecting the storage backend ("sqlite" or "json")
pub const STORAGE_BACKEND_ENV: &str = "BILLKEEPER_STORAGE";

/// Where the snapshot slot lives on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// `kv` table in a local SQLite database
    #[default]
    Sqlite,
    /// Pretty-printed JSON file in the data directory
    JsonFile,
}

impl StorageBackend {
    /// Parse a backend name; unknown names yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Some(Self::Sqlite),
            "json" | "file" => Some(Self::JsonFile),
            _ => None,
        }
    }
}

/// Startup configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
}

impl AppConfig {
    pub fn new(data_dir: PathBuf, backend: StorageBackend) -> Self {
        Self { data_dir, backend }
    }

    /// Read configuration from the environment, falling back to a
    /// `.billkeeper` directory under the current working directory.
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".billkeeper"));

        let backend = match std::env::var(STORAGE_BACKEND_ENV) {
            Ok(value) => StorageBackend::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Unknown storage backend {:?}, using sqlite", value);
                StorageBackend::Sqlite
            }),
            Err(_) => StorageBackend::default(),
        };

        Self { data_dir, backend }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE_NAME)
    }
}
