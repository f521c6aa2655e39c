//! User Storage
//! Mission: Store and manage user accounts with SQLite

use crate::auth::models::User;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, info};
use uuid::Uuid;

/// Store-level failures, separated so callers can tell domain
/// conditions (duplicate, missing) from backend breakage.
#[derive(Debug)]
pub enum StoreError {
    /// Unique constraint violation on username
    Duplicate,
    /// No row matched the lookup
    NotFound,
    /// Anything SQLite-level
    Backend(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "Username already exists"),
            StoreError::NotFound => write!(f, "User not found"),
            StoreError::Backend(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Duplicate
            }
            _ => StoreError::Backend(e),
        }
    }
}

/// User storage with SQLite backend. Every operation opens its own
/// connection and runs as a self-contained transaction; the UNIQUE
/// constraint on username is the only serialization point.
pub struct UserStore {
    db_path: String,
    echo: bool,
}

impl UserStore {
    /// Create a new user store and initialize the schema
    pub fn new(db_path: &str, echo: bool) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.to_string(),
            echo,
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), StoreError> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn open(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn trace_sql(&self, sql: &str) {
        if self.echo {
            debug!("sql: {}", sql);
        }
    }

    /// Insert a new user. The caller supplies an already-hashed
    /// password; plaintext never reaches the store.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let sql = "INSERT INTO users (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)";
        self.trace_sql(sql);

        let conn = self.open()?;
        conn.execute(
            sql,
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at,
            ],
        )?;

        info!("Created user: {}", user.username);

        Ok(user)
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let sql = "SELECT id, username, password_hash, created_at
             FROM users WHERE username = ?1";
        self.trace_sql(sql);

        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let user = stmt.query_row(params![username], row_to_user)?;

        Ok(user)
    }

    /// Get user by id
    pub fn get_user_by_id(&self, id: &Uuid) -> Result<User, StoreError> {
        let sql = "SELECT id, username, password_hash, created_at
             FROM users WHERE id = ?1";
        self.trace_sql(sql);

        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let user = stmt.query_row(params![id.to_string()], row_to_user)?;

        Ok(user)
    }

    /// List all users, insertion order
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = "SELECT id, username, password_hash, created_at FROM users";
        self.trace_sql(sql);

        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Rename a user and replace their password hash in one statement
    pub fn update_user(
        &self,
        username: &str,
        new_username: &str,
        new_password_hash: &str,
    ) -> Result<User, StoreError> {
        let sql = "UPDATE users SET username = ?1, password_hash = ?2 WHERE username = ?3";
        self.trace_sql(sql);

        let conn = self.open()?;
        let rows_affected = conn.execute(sql, params![new_username, new_password_hash, username])?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        info!("Updated user: {} -> {}", username, new_username);

        self.get_user_by_username(new_username)
    }

    /// Delete a user by username
    pub fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        let sql = "DELETE FROM users WHERE username = ?1";
        self.trace_sql(sql);

        let conn = self.open()?;
        let rows_affected = conn.execute(sql, params![username])?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        info!("Deleted user: {}", username);
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}
