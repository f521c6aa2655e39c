//! Revocation Ledger
//! Mission: Track revoked token identifiers so logged-out tokens stay dead

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, info};
use uuid::Uuid;

/// Ledger-level failures
#[derive(Debug)]
pub enum RevocationError {
    /// The jti is already on the denylist
    AlreadyRevoked,
    /// Anything SQLite-level
    Backend(rusqlite::Error),
}

impl std::fmt::Display for RevocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevocationError::AlreadyRevoked => write!(f, "Token is already revoked"),
            RevocationError::Backend(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for RevocationError {}

impl From<rusqlite::Error> for RevocationError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                RevocationError::AlreadyRevoked
            }
            _ => RevocationError::Backend(e),
        }
    }
}

/// Durable denylist of jti values. A listed jti is rejected regardless
/// of the token's signature and expiry. Rows are insert-only; the only
/// deletion path is `prune_older_than`, driven by the background task.
pub struct RevocationLedger {
    db_path: String,
    echo: bool,
}

impl RevocationLedger {
    /// Create a new ledger and initialize the schema
    pub fn new(db_path: &str, echo: bool) -> Result<Self, RevocationError> {
        let ledger = Self {
            db_path: db_path.to_string(),
            echo,
        };
        ledger.init_db()?;
        Ok(ledger)
    }

    fn init_db(&self) -> Result<(), RevocationError> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS revoked_tokens (
                id TEXT PRIMARY KEY,
                jti TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn open(&self) -> Result<Connection, RevocationError> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn trace_sql(&self, sql: &str) {
        if self.echo {
            debug!("sql: {}", sql);
        }
    }

    /// Put a jti on the denylist. Revoking the same jti twice surfaces
    /// the uniqueness violation as `AlreadyRevoked`.
    pub fn revoke(&self, jti: &str) -> Result<(), RevocationError> {
        let sql = "INSERT INTO revoked_tokens (id, jti, created_at) VALUES (?1, ?2, ?3)";
        self.trace_sql(sql);

        let conn = self.open()?;
        conn.execute(
            sql,
            params![
                Uuid::new_v4().to_string(),
                jti,
                Utc::now().to_rfc3339(),
            ],
        )?;

        info!("Revoked token jti {}", jti);
        Ok(())
    }

    /// Check whether a jti has been revoked
    pub fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        let sql = "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?1)";
        self.trace_sql(sql);

        let conn = self.open()?;
        let revoked: bool = conn.query_row(sql, params![jti], |row| row.get(0))?;

        Ok(revoked)
    }

    /// Delete denylist rows revoked before the cutoff. Once a row is
    /// older than the longest token lifetime, the token it names has
    /// expired on its own and the row no longer affects verification.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, RevocationError> {
        let sql = "DELETE FROM revoked_tokens WHERE datetime(created_at) < datetime(?1)";
        self.trace_sql(sql);

        let conn = self.open()?;
        let pruned = conn.execute(sql, params![cutoff.to_rfc3339()])?;

        if pruned > 0 {
            info!("Pruned {} expired denylist entries", pruned);
        }

        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn create_test_ledger() -> (RevocationLedger, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let ledger = RevocationLedger::new(db_path, false).unwrap();
        (ledger, temp_file)
    }

    #[test]
    fn test_revoke_and_check() {
        let (ledger, _temp) = create_test_ledger();

        let jti = Uuid::new_v4().to_string();
        assert!(!ledger.is_revoked(&jti).unwrap());

        ledger.revoke(&jti).unwrap();
        assert!(ledger.is_revoked(&jti).unwrap());

        // Other jtis stay unaffected
        assert!(!ledger.is_revoked("some-other-jti").unwrap());
    }

    #[test]
    fn test_double_revoke_rejected() {
        let (ledger, _temp) = create_test_ledger();

        let jti = Uuid::new_v4().to_string();
        ledger.revoke(&jti).unwrap();

        let err = ledger.revoke(&jti).unwrap_err();
        assert!(matches!(err, RevocationError::AlreadyRevoked));

        // Still revoked after the failed second insert
        assert!(ledger.is_revoked(&jti).unwrap());
    }

    #[test]
    fn test_prune_removes_only_old_entries() {
        let (ledger, _temp) = create_test_ledger();

        let fresh_jti = Uuid::new_v4().to_string();
        ledger.revoke(&fresh_jti).unwrap();

        // Backdate a second entry past the cutoff
        let stale_jti = Uuid::new_v4().to_string();
        let conn = Connection::open(&ledger.db_path).unwrap();
        conn.execute(
            "INSERT INTO revoked_tokens (id, jti, created_at) VALUES (?1, ?2, ?3)",
            params![
                Uuid::new_v4().to_string(),
                stale_jti,
                (Utc::now() - Duration::days(40)).to_rfc3339(),
            ],
        )
        .unwrap();

        let pruned = ledger
            .prune_older_than(Utc::now() - Duration::days(30))
            .unwrap();
        assert_eq!(pruned, 1);

        assert!(!ledger.is_revoked(&stale_jti).unwrap());
        assert!(ledger.is_revoked(&fresh_jti).unwrap());
    }

    #[test]
    fn test_prune_on_empty_ledger() {
        let (ledger, _temp) = create_test_ledger();

        let pruned = ledger.prune_older_than(Utc::now()).unwrap();
        assert_eq!(pruned, 0);
    }
}
