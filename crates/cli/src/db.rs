//! The in-memory user collection and the storage file behind it.

use anyhow::{anyhow, bail, Result};
use record::{User, MAX_USERS};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use storage::Storage;
use tracing::{debug, info};

use crate::display::BookStats;

/// Owns the decoded users and their storage file.
///
/// # Write Path
///
/// - `add` appends the new record to the file and syncs it, then keeps it in
///   memory.
/// - `remove` rewrites the whole file through an atomic snapshot, then drops
///   the record from memory.
///
/// Memory only changes once the file write has succeeded. A `Database` has a
/// single writer; share it behind a [`Mutex`] (see [`lock`]).
pub struct Database {
    storage: Storage,
    users: Vec<User>,
}

impl Database {
    /// Opens (or creates) the storage file and decodes its users.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut storage = Storage::open(path)?;
        let users = storage.load()?;
        info!(
            path = %storage.path().display(),
            users = users.len(),
            "database loaded"
        );
        Ok(Self { storage, users })
    }

    /// Label shown in the prompt.
    pub fn name(&self) -> String {
        self.storage.name()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_full(&self) -> bool {
        self.users.len() >= MAX_USERS
    }

    pub fn active_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_active()).count()
    }

    pub fn book_stats(&self) -> BookStats {
        BookStats::from_users(&self.users)
    }

    /// Appends `user` to the collection.
    ///
    /// An active user gets the marker of the slot it lands in
    /// (`1 << position`).
    pub fn add(&mut self, mut user: User) -> Result<()> {
        if self.is_full() {
            bail!("no free slots for a new user");
        }
        user.active_index = if user.is_active() {
            1 << self.users.len()
        } else {
            0
        };

        self.storage.append(&user)?;
        debug!(name = %user.name, position = self.users.len(), "user added");
        self.users.push(user);
        Ok(())
    }

    /// Removes the first user whose trimmed name matches `name`.
    ///
    /// The last user takes the freed slot. Returns `false` when nobody
    /// matched.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let Some(pos) = self.users.iter().position(|u| u.has_name(name)) else {
            return Ok(false);
        };

        let mut next = self.users.clone();
        next.swap_remove(pos);
        self.storage.save_snapshot(&next)?;
        self.users = next;
        debug!(name = name.trim(), "user removed");
        Ok(true)
    }

    /// Rewrites the storage file from memory.
    pub fn save(&mut self) -> Result<()> {
        self.storage.save_snapshot(&self.users)?;
        Ok(())
    }

    /// Saves a final snapshot and releases the file.
    pub fn close(&mut self) -> Result<()> {
        if !self.storage.is_open() {
            return Ok(());
        }
        self.save()?;
        self.storage.close()?;
        info!(path = %self.storage.path().display(), "database closed");
        Ok(())
    }
}

/// Locks a shared database.
pub fn lock(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| anyhow!("database lock poisoned"))
}
