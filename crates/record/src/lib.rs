//! # Record
//!
//! The `User` record and its fixed binary layout.
//!
//! The storage file is a plain sequence of records with no header, footer or
//! record count. End of file is the only terminator, apart from the hard cap of
//! [`MAX_USERS`] records per collection.
//!
//! ## Record layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ name_len (u8) | name bytes                               │
//! │ active_and_age (u64 BE): bit 63 = active, bits 0-62 = age│
//! │ mass (f64 BE, kilograms as written)                      │
//! │ books_len (u8) | books bytes (comma-joined titles)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. Mass is written verbatim and normalized only on
//! decode (see [`normalize_mass`]), so a value inside one of the normalization
//! bands does not survive a round trip unchanged.

mod codec;
mod mass;

pub use codec::{decode, encode, encode_one, RecordError};
pub use mass::{normalize_mass, KG_PER_OZ, KG_PER_QUINTAL};

/// Bit 63 of the `active_and_age` word carries the active flag.
pub const ACTIVE_MASK: u64 = 1 << 63;

/// Bits 0-62 of the `active_and_age` word carry the age.
pub const AGE_MASK: u64 = !ACTIVE_MASK;

/// A collection never holds more than this many records.
pub const MAX_USERS: usize = 8;

/// Largest byte length of the `name` field and of the joined `books` field.
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// Separator used to join book titles into a single wire field.
pub const BOOK_SEPARATOR: char = ',';

/// One entry of the user database.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub age: u8,
    /// One-hot marker: `1 << position` for an active user decoded at
    /// `position`, `0` for an inactive one.
    pub active_index: u8,
    /// Kilograms.
    pub mass: f64,
    pub books: Vec<String>,
}

impl User {
    /// Builds a record with `active_index = 1` when `active` is set. The
    /// positional marker is assigned later by whoever places the record in a
    /// collection.
    pub fn new(
        name: impl Into<String>,
        age: u8,
        active: bool,
        mass: f64,
        books: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            active_index: u8::from(active),
            mass,
            books,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_index != 0
    }

    /// Name comparison ignores leading and trailing whitespace.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim() == name.trim()
    }
}
