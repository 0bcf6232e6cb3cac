use rusqlite::{params, Connection};

use crate::db::{is_unique_violation, DatabaseError, InsertOutcome};
use crate::models::{Account, NewAccount};

/// Insert a hospital account.
///
/// A clash on `hospital` or `code` is reported as `InsertOutcome::Duplicate`
/// rather than an error; the caller decides whether that matters.
pub fn insert_account(conn: &Connection, account: &NewAccount) -> Result<InsertOutcome, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO users (hospital, code, password) VALUES (?1, ?2, ?3)",
        params![account.hospital, account.code, account.password_hash],
    );

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
        Err(e) => Err(e.into()),
    }
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, hospital, code, password FROM users WHERE id = ?1")?;
    match stmt.query_row(params![id], account_from_row) {
        Ok(account) => Ok(Some(account)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Look up an account by its access code (the login identifier).
pub fn get_account_by_code(conn: &Connection, code: &str) -> Result<Option<Account>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, hospital, code, password FROM users WHERE code = ?1 LIMIT 1")?;
    match stmt.query_row(params![code], account_from_row) {
        Ok(account) => Ok(Some(account)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_accounts(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        hospital: row.get(1)?,
        code: row.get(2)?,
        password_hash: row.get(3)?,
    })
}
