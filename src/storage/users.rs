use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};

const USER_COLUMNS: &str = "id, email, hashed_password, session_id, reset_token, created_at, updated_at";

/// User account in the system
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single-column criterion for finding users
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(Uuid),
    Email(String),
    SessionId(String),
    ResetToken(String),
}

impl UserLookup {
    /// Build a lookup from a column name known only at runtime.
    pub fn parse(column: &str, value: &str) -> StorageResult<Self> {
        match column {
            "id" => Uuid::parse_str(value)
                .map(Self::Id)
                .map_err(|_| StorageError::InvalidQuery(format!("id is not a UUID: {value}"))),
            "email" => Ok(Self::Email(value.to_string())),
            "session_id" => Ok(Self::SessionId(value.to_string())),
            "reset_token" => Ok(Self::ResetToken(value.to_string())),
            other => Err(StorageError::InvalidQuery(format!("unknown column {other}"))),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Email(_) => "email",
            Self::SessionId(_) => "session_id",
            Self::ResetToken(_) => "reset_token",
        }
    }
}

impl std::fmt::Display for UserLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Email(email) => write!(f, "email={email}"),
            // Session ids and reset tokens are credentials
            Self::SessionId(_) => f.write_str("session_id=<redacted>"),
            Self::ResetToken(_) => f.write_str("reset_token=<redacted>"),
        }
    }
}

/// A single field change applied by [`UserStore::update_user`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserUpdate {
    HashedPassword(String),
    SessionId(Option<String>),
    ResetToken(Option<String>),
}

impl UserUpdate {
    fn column(&self) -> &'static str {
        match self {
            Self::HashedPassword(_) => "hashed_password",
            Self::SessionId(_) => "session_id",
            Self::ResetToken(_) => "reset_token",
        }
    }
}

/// User store trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user with an already hashed password
    async fn add_user(&self, email: &str, hashed_password: &str) -> StorageResult<User>;

    /// First user matching the lookup, `None` when nothing matches
    async fn find_user_by(&self, lookup: &UserLookup) -> StorageResult<Option<User>>;

    /// All users matching the lookup
    async fn find_users_by(&self, lookup: &UserLookup) -> StorageResult<Vec<User>>;

    /// Apply all updates to one user, or none of them
    async fn update_user(&self, id: Uuid, updates: &[UserUpdate]) -> StorageResult<()>;

    /// Number of stored users
    async fn count_users(&self) -> StorageResult<i64>;

    /// List all users
    async fn list_users(&self) -> StorageResult<Vec<User>>;
}

/// SQLite implementation of UserStore
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for users
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BLOB PRIMARY KEY NOT NULL,
                email TEXT UNIQUE NOT NULL,
                hashed_password TEXT NOT NULL,
                session_id TEXT,
                reset_token TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_session_id ON users(session_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_reset_token ON users(reset_token)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_matching(&self, lookup: &UserLookup) -> StorageResult<Vec<SqliteRow>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} = ?1 ORDER BY created_at ASC",
            lookup.column()
        );

        let query = sqlx::query(&sql);
        let query = match lookup {
            UserLookup::Id(id) => query.bind(*id),
            UserLookup::Email(value)
            | UserLookup::SessionId(value)
            | UserLookup::ResetToken(value) => query.bind(value.as_str()),
        };

        Ok(query.fetch_all(&self.pool).await?)
    }
}

fn user_from_row(row: &SqliteRow) -> StorageResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        session_id: row.try_get("session_id")?,
        reset_token: row.try_get("reset_token")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn add_user(&self, email: &str, hashed_password: &str) -> StorageResult<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StorageError::DuplicateEmail(email.to_string());
                }
            }
            StorageError::Database(e)
        })?;

        Ok(User {
            id,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            session_id: None,
            reset_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_user_by(&self, lookup: &UserLookup) -> StorageResult<Option<User>> {
        self.fetch_matching(lookup)
            .await?
            .first()
            .map(user_from_row)
            .transpose()
    }

    async fn find_users_by(&self, lookup: &UserLookup) -> StorageResult<Vec<User>> {
        self.fetch_matching(lookup)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn update_user(&self, id: Uuid, updates: &[UserUpdate]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            return Err(StorageError::UserNotFound(id));
        }

        let now = Utc::now();
        for update in updates {
            let sql = format!(
                "UPDATE users SET {} = ?1, updated_at = ?2 WHERE id = ?3",
                update.column()
            );
            let query = sqlx::query(&sql);
            let query = match update {
                UserUpdate::HashedPassword(hash) => query.bind(hash.as_str()),
                UserUpdate::SessionId(value) | UserUpdate::ResetToken(value) => {
                    query.bind(value.as_deref())
                }
            };
            query.bind(now).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_users(&self) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}
