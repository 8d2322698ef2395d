mod error;
mod sqlite;
mod users;

pub use error::{StorageError, StorageResult};
pub use sqlite::connect_pool;
pub use users::{SqliteUserStore, User, UserLookup, UserStore, UserUpdate};
