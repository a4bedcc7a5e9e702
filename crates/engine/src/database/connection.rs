//! Pooled connection checkout with deadline enforcement
//!
//! A deadline reaches a connection through two hooks:
//! - a progress handler that interrupts running statements
//! - a busy handler that stops waiting on a locked database
//!
//! SQLite only accepts a plain function as busy handler, so the deadline it
//! polls lives in a thread-local slot set for the duration of the checkout.
//! Operations never leave the thread that checked the connection out.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::warn;
use versakv_core::{Deadline, Result};

use crate::error::{pool_error, sql_error};

/// Virtual machine instructions between deadline polls
const PROGRESS_INTERVAL: i32 = 1_000;

/// Sleep between lock attempts while the database is busy
const BUSY_POLL: Duration = Duration::from_millis(5);

struct BusyWait {
    deadline: Deadline,
    limit: Duration,
    started: Instant,
}

thread_local! {
    /// Deadline of the operation running on this thread, if bounded
    static BUSY_WAIT: RefCell<Option<BusyWait>> = const { RefCell::new(None) };
}

/// Busy handler: keep retrying until the lock frees, the configured busy
/// timeout elapses, or the operation's deadline fires
fn wait_while_busy(attempt: i32) -> bool {
    BUSY_WAIT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let Some(wait) = slot.as_mut() else {
            return false;
        };
        if attempt == 0 {
            wait.started = Instant::now();
        }
        if wait.deadline.is_over() || wait.started.elapsed() >= wait.limit {
            return false;
        }
        let pause = wait
            .deadline
            .remaining()
            .map_or(BUSY_POLL, |left| left.min(BUSY_POLL));
        std::thread::sleep(pause);
        true
    })
}

/// A pooled connection whose statements and lock waits are cut short once
/// the operation's deadline fires
///
/// Both hooks are removed on drop, before the connection returns to the
/// pool, so they never outlive the operation that installed them.
pub(crate) struct WatchedConnection {
    conn: PooledConnection<SqliteConnectionManager>,
    busy_timeout: Duration,
    watched: bool,
}

impl WatchedConnection {
    /// Check out a connection, waiting no longer than the deadline allows
    ///
    /// `busy_timeout` is the connection's configured lock wait; it still
    /// bounds waits under a deadline and is restored on drop.
    pub(crate) fn checkout(
        pool: &Pool<SqliteConnectionManager>,
        deadline: &Deadline,
        busy_timeout: Duration,
    ) -> Result<Self> {
        let conn = match deadline.remaining() {
            Some(remaining) => pool.get_timeout(remaining),
            None => pool.get(),
        }
        .map_err(|e| pool_error(e, deadline))?;

        let watched = deadline.is_bounded();
        if watched {
            BUSY_WAIT.with(|slot| {
                *slot.borrow_mut() = Some(BusyWait {
                    deadline: deadline.clone(),
                    limit: busy_timeout,
                    started: Instant::now(),
                })
            });
            let polled = deadline.clone();
            conn.progress_handler(PROGRESS_INTERVAL, Some(move || polled.is_over()));
        }
        let watched_conn = WatchedConnection {
            conn,
            busy_timeout,
            watched,
        };
        if watched {
            watched_conn
                .conn
                .busy_handler(Some(wait_while_busy))
                .map_err(|e| sql_error(e, "checkout", deadline))?;
        }
        Ok(watched_conn)
    }
}

impl Deref for WatchedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for WatchedConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for WatchedConnection {
    fn drop(&mut self) {
        if self.watched {
            self.conn.progress_handler(0, None::<fn() -> bool>);
            if let Err(e) = self.conn.busy_timeout(self.busy_timeout) {
                warn!(target: "versakv::sqlite", error = %e, "Failed to restore busy timeout");
            }
            BUSY_WAIT.with(|slot| slot.borrow_mut().take());
        }
    }
}
