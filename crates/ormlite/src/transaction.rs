//! Scoped transactions.
//!
//! [`Transaction`] begins on creation and rolls back when dropped unless
//! [`Transaction::commit`] succeeded, so early returns and panics inside a
//! batch never leave a transaction open.
//!
//! ```ignore
//! ormlite::transaction(&mut conn, |conn| {
//!     conn.execute("UPDATE accounts SET balance = balance - 100 WHERE id = 1", &Params::none())?;
//!     conn.execute("UPDATE accounts SET balance = balance + 100 WHERE id = 2", &Params::none())?;
//!     Ok(())
//! })?;
//! ```

use crate::connection::Connection;
use crate::error::OrmResult;

/// An open transaction on a borrowed connection.
#[must_use = "dropping a Transaction rolls it back"]
pub struct Transaction<'c, C: Connection + ?Sized> {
    conn: &'c mut C,
    finished: bool,
}

impl<'c, C: Connection + ?Sized> Transaction<'c, C> {
    /// Begin a transaction on `conn`.
    pub fn begin(conn: &'c mut C) -> OrmResult<Self> {
        conn.begin()?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// The connection, for issuing statements inside the transaction.
    pub fn connection(&mut self) -> &mut C {
        &mut *self.conn
    }

    /// Commit. If the commit itself fails the guard still rolls back on drop.
    pub fn commit(mut self) -> OrmResult<()> {
        self.conn.commit()?;
        self.finished = true;
        Ok(())
    }

    /// Roll back explicitly.
    pub fn rollback(mut self) -> OrmResult<()> {
        self.finished = true;
        self.conn.rollback()
    }
}

impl<C: Connection + ?Sized> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!(target: "ormlite.tx", "rolling back unfinished transaction");
        if let Err(err) = self.conn.rollback() {
            tracing::warn!(target: "ormlite.tx", error = %err, "rollback failed");
        }
    }
}

/// Run `body` inside a transaction.
///
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the original error; a failing
///   rollback is logged and does not replace it.
pub fn transaction<C, T, F>(conn: &mut C, body: F) -> OrmResult<T>
where
    C: Connection + ?Sized,
    F: FnOnce(&mut C) -> OrmResult<T>,
{
    let mut tx = Transaction::begin(conn)?;
    let value = body(tx.connection())?;
    tx.commit()?;
    Ok(value)
}
