//! # Storage
//!
//! The single flat file that holds the user records, and the crash-safe
//! snapshot that rewrites it.
//!
//! New records are appended to the open file. Removing a record rewrites the
//! whole collection through [`Storage::save_snapshot`]:
//!
//! 1. create a uniquely named `.<file name>.*.tmp` next to the storage file,
//! 2. encode every record into it,
//! 3. `sync_all()` the temp file,
//! 4. close the temp file,
//! 5. close the storage handle,
//! 6. rename the temp file over the storage path,
//! 7. restore the storage file's permission bits (logged, not fatal),
//! 8. reopen the storage path.
//!
//! The temp file lives in the same directory so the rename stays on one
//! filesystem and is atomic: the storage path holds either the old or the new
//! collection, never a partial one.
//!
//! A `Storage` has a single writer. Callers that share one across threads must
//! serialize access themselves.

use record::{decode, encode, encode_one, RecordError, User};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Permission bits of the storage file (`rw-rw-r--`).
pub const FILE_MODE: u32 = 0o664;

/// Permission bits of directories created for the storage file (`rwxrwxr-x`).
pub const DIR_MODE: u32 = 0o775;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    #[error("storage file {} is not open", .0.display())]
    Closed(PathBuf),
}

pub struct Storage {
    /// `None` once closed, or after a snapshot could not reopen the file.
    file: Option<File>,
    path: PathBuf,
}

impl Storage {
    /// Opens (creating if needed) the storage file at `path`, along with any
    /// missing parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir(dir)?;
        }
        let file = open_file(&path)?;
        debug!(path = %path.display(), "storage opened");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the storage, used as the prompt label.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Reads the collection from the start of the file.
    pub fn load(&mut self) -> Result<Vec<User>, StorageError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))?;
        let users = decode(BufReader::new(file))?;
        Ok(users)
    }

    /// Appends one record and syncs it to disk.
    pub fn append(&mut self, user: &User) -> Result<(), StorageError> {
        let file = self.file_mut()?;
        encode_one(file, user)?;
        file.sync_all()?;
        Ok(())
    }

    /// Atomically replaces the file contents with `users`.
    ///
    /// On error the storage path still holds its previous contents and the
    /// temp file is removed. If only the final reopen fails the new contents
    /// are in place but the handle is gone: later calls return
    /// [`StorageError::Closed`].
    pub fn save_snapshot(&mut self, users: &[User]) -> Result<(), StorageError> {
        self.save_snapshot_with(users, |_| Ok(()))
    }

    /// [`save_snapshot`](Self::save_snapshot) with a hook that runs after the
    /// temp file is synced and closed and right before it replaces the storage
    /// file.
    fn save_snapshot_with<F>(&mut self, users: &[User], before_replace: F) -> Result<(), StorageError>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        self.file_mut()?;
        debug!(
            path = %self.path.display(),
            records = users.len(),
            "writing snapshot"
        );

        if let Err(err) = self.replace_with_snapshot(users, before_replace) {
            if self.file.is_none() {
                // the old contents are still there, keep serving them
                self.file = open_file(&self.path).ok();
            }
            return Err(err);
        }
        restore_file_mode(&self.path);

        self.file = Some(open_file(&self.path)?);
        debug!(path = %self.path.display(), "snapshot committed");
        Ok(())
    }

    // The temp file is unique to this call and removed on drop unless it was
    // renamed into place.
    fn replace_with_snapshot<F>(&mut self, users: &[User], before_replace: F) -> Result<(), StorageError>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", self.name()))
            .suffix(".tmp")
            .tempfile_in(self.dir())?;
        encode(&mut tmp, users)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        let tmp_path = tmp.into_temp_path();

        // release the old handle before the path is swapped under it
        if let Some(old) = self.file.take() {
            drop(old);
        }

        before_replace(&tmp_path)?;
        tmp_path.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Syncs and releases the file handle.
    pub fn close(&mut self) -> Result<(), StorageError> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn file_mut(&mut self) -> Result<&mut File, StorageError> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(StorageError::Closed(self.path.clone())),
        }
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

fn open_file(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).read(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(FILE_MODE);
    }
    opts.open(path)
}

fn create_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir)
}

/// The rename already committed the snapshot; a chmod failure is only logged.
fn restore_file_mode(path: &Path) {
    if let Err(err) = set_file_mode(path) {
        warn!(path = %path.display(), error = %err, "could not restore file mode");
    }
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}
