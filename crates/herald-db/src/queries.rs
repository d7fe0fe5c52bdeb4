use crate::Database;
use crate::models::{InboxRow, NotificationRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

impl Database {
    // -- Users --

    /// Insert a user and return its id. Returns `None` when the username is taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// All users, oldest first. The password column is left empty.
    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, username, created_at FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: String::new(),
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        sender_id: i64,
        receiver_id: i64,
        message: &str,
    ) -> Result<NotificationRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                "INSERT INTO notifications (sender_id, receiver_id, message)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, sender_id, receiver_id, message, is_read, created_at",
                rusqlite::params![sender_id, receiver_id, message],
                notification_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_notification(&self, id: i64) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, sender_id, receiver_id, message, is_read, created_at
                     FROM notifications WHERE id = ?1",
                    [id],
                    notification_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// A page of the receiver's inbox, newest first. Rows created in the same
    /// instant fall back to id order so consecutive pages never overlap.
    pub fn list_notifications_for(
        &self,
        receiver_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InboxRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch sender_username in a single query
            let mut stmt = conn.prepare(
                "SELECT n.id, n.message, n.is_read, n.created_at, u.id, u.username
                 FROM notifications n
                 JOIN users u ON n.sender_id = u.id
                 WHERE n.receiver_id = ?1
                 ORDER BY n.created_at DESC, n.id DESC
                 LIMIT ?2 OFFSET ?3",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![receiver_id, limit, offset], |row| {
                    Ok(InboxRow {
                        id: row.get(0)?,
                        message: row.get(1)?,
                        is_read: row.get(2)?,
                        created_at: row.get(3)?,
                        sender_id: row.get(4)?,
                        sender_username: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Returns the number of rows touched (0 when the id does not exist).
    pub fn mark_notification_read(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
            Ok(n)
        })
    }

    pub fn mark_all_notifications_read(&self, receiver_id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE receiver_id = ?1 AND is_read = 0",
                [receiver_id],
            )?;
            Ok(n)
        })
    }

    pub fn count_unread_notifications(&self, receiver_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE receiver_id = ?1 AND is_read = 0",
                [receiver_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    value: P,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {predicate}");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        message: row.get(3)?,
        is_read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
