use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use thiserror::Error;

use crate::mass::normalize_mass;
use crate::{User, ACTIVE_MASK, AGE_MASK, BOOK_SEPARATOR, MAX_FIELD_LEN, MAX_USERS};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("truncated record")]
    Truncated,
    #[error("{field} is {len} bytes long, at most 255 fit in a record")]
    FieldTooLong { field: &'static str, len: usize },
}

/// Appends one record to `w`.
///
/// Both length-prefixed fields are checked before anything is written, and the
/// record is handed to the sink in a single `write_all`, so a rejected record
/// leaves the sink untouched.
pub fn encode_one<W: Write>(w: &mut W, user: &User) -> Result<(), RecordError> {
    let books = join_books(&user.books);
    check_len("name", user.name.len())?;
    check_len("books", books.len())?;

    let mut buf = Vec::with_capacity(1 + user.name.len() + 8 + 8 + 1 + books.len());

    buf.write_u8(user.name.len() as u8)?;
    buf.extend_from_slice(user.name.as_bytes());

    let mut active_and_age = u64::from(user.age);
    if user.is_active() {
        active_and_age |= ACTIVE_MASK;
    }
    buf.write_u64::<BigEndian>(active_and_age)?;

    // kilograms as given; normalization is decode-only
    buf.write_f64::<BigEndian>(user.mass)?;

    buf.write_u8(books.len() as u8)?;
    buf.extend_from_slice(books.as_bytes());

    w.write_all(&buf)?;
    Ok(())
}

/// Encodes every record in order, stopping at the first failure.
pub fn encode<W: Write>(w: &mut W, users: &[User]) -> Result<(), RecordError> {
    for user in users {
        encode_one(w, user)?;
    }
    Ok(())
}

/// Reads records until a clean end of input or until [`MAX_USERS`] records
/// have been read, whichever comes first.
///
/// End of input is clean only at a record boundary. Running out of bytes
/// anywhere inside a record fails the whole decode with
/// [`RecordError::Truncated`]. Bytes after the last allowed record are not
/// looked at.
///
/// The active bit of the record at position `n` becomes the marker `1 << n`.
pub fn decode<R: Read>(mut r: R) -> Result<Vec<User>, RecordError> {
    let mut users = Vec::with_capacity(MAX_USERS);

    while users.len() < MAX_USERS {
        let name_len = match r.read_u8() {
            Ok(v) => v,
            Err(e) => {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    break;
                }
                return Err(RecordError::Io(e));
            }
        };

        let user = read_record_body(&mut r, name_len, users.len()).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                RecordError::Truncated
            } else {
                RecordError::Io(e)
            }
        })?;
        users.push(user);
    }

    Ok(users)
}

fn read_record_body<R: Read>(r: &mut R, name_len: u8, position: usize) -> io::Result<User> {
    let mut name = vec![0u8; name_len as usize];
    r.read_exact(&mut name)?;

    let active_and_age = r.read_u64::<BigEndian>()?;
    let active = u8::from(active_and_age & ACTIVE_MASK != 0);

    let mass = r.read_f64::<BigEndian>()?;

    let books_len = r.read_u8()?;
    let mut books = vec![0u8; books_len as usize];
    r.read_exact(&mut books)?;

    Ok(User {
        name: String::from_utf8_lossy(&name).into_owned(),
        age: (active_and_age & AGE_MASK) as u8,
        active_index: active << position,
        mass: normalize_mass(mass),
        books: split_books(&books),
    })
}

fn check_len(field: &'static str, len: usize) -> Result<(), RecordError> {
    if len > MAX_FIELD_LEN {
        return Err(RecordError::FieldTooLong { field, len });
    }
    Ok(())
}

fn join_books(books: &[String]) -> String {
    let mut sep = [0u8; 4];
    books.join(BOOK_SEPARATOR.encode_utf8(&mut sep))
}

// An empty field decodes to no books; `[""]` and `[]` look the same on disk.
fn split_books(raw: &[u8]) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    String::from_utf8_lossy(raw)
        .split(BOOK_SEPARATOR)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KG_PER_OZ, KG_PER_QUINTAL};
    use anyhow::Result;
    use std::io::Cursor;

    // Builds a record by hand so decode tests do not depend on encode.
    fn wire(name: &[u8], active: bool, age: u64, mass: f64, books: &[u8]) -> Vec<u8> {
        let mut buf = vec![name.len() as u8];
        buf.extend_from_slice(name);
        let word = if active { age | ACTIVE_MASK } else { age };
        buf.extend_from_slice(&word.to_be_bytes());
        buf.extend_from_slice(&mass.to_be_bytes());
        buf.push(books.len() as u8);
        buf.extend_from_slice(books);
        buf
    }

    fn books(titles: &[&str]) -> Vec<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // -------------------- Encode --------------------

    #[test]
    fn encode_exact_layout() -> Result<()> {
        let user = User::new("Jo", 30, true, 80.0, books(&["1984", "Dune"]));
        let mut out = Vec::new();
        encode_one(&mut out, &user)?;

        let mut expected = vec![2u8, b'J', b'o'];
        expected.extend_from_slice(&[0x80, 0, 0, 0, 0, 0, 0, 30]);
        expected.extend_from_slice(&80.0f64.to_be_bytes());
        expected.push(9);
        expected.extend_from_slice(b"1984,Dune");
        assert_eq!(out, expected);
        Ok(())
    }

    #[test]
    fn encode_inactive_clears_top_bit() -> Result<()> {
        let user = User::new("Al", 255, false, 1.0, vec![]);
        let mut out = Vec::new();
        encode_one(&mut out, &user)?;
        assert_eq!(&out[3..11], &[0, 0, 0, 0, 0, 0, 0, 255]);
        // empty books list is a zero length prefix and nothing else
        assert_eq!(out.len(), 1 + 2 + 8 + 8 + 1);
        assert_eq!(out[out.len() - 1], 0);
        Ok(())
    }

    #[test]
    fn encode_keeps_mass_verbatim() -> Result<()> {
        let user = User::new("Q", 1, false, 0.75, vec![]);
        let mut out = Vec::new();
        encode_one(&mut out, &user)?;
        assert_eq!(&out[10..18], &0.75f64.to_be_bytes());
        Ok(())
    }

    #[test]
    fn encode_rejects_long_name_without_writing() {
        let user = User::new("x".repeat(256), 1, true, 70.0, vec![]);
        let mut out = Vec::new();
        let err = encode_one(&mut out, &user).unwrap_err();
        assert!(matches!(
            err,
            RecordError::FieldTooLong {
                field: "name",
                len: 256
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn encode_rejects_long_joined_books_without_writing() {
        // 128 + 1 + 127 = 256 bytes once joined
        let user = User::new(
            "Jane",
            1,
            false,
            70.0,
            vec!["a".repeat(128), "b".repeat(127)],
        );
        let mut out = Vec::new();
        let err = encode_one(&mut out, &user).unwrap_err();
        assert!(matches!(
            err,
            RecordError::FieldTooLong {
                field: "books",
                len: 256
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn encode_accepts_fields_at_the_limit() -> Result<()> {
        let user = User::new("n".repeat(255), 1, false, 70.0, vec!["b".repeat(255)]);
        let mut out = Vec::new();
        encode_one(&mut out, &user)?;
        assert_eq!(out[0], 255);
        assert_eq!(out.len(), 1 + 255 + 8 + 8 + 1 + 255);
        Ok(())
    }

    #[test]
    fn encode_many_stops_at_first_bad_record() {
        let users = vec![
            User::new("ok", 1, false, 70.0, vec![]),
            User::new("y".repeat(300), 1, false, 70.0, vec![]),
            User::new("never", 1, false, 70.0, vec![]),
        ];
        let mut out = Vec::new();
        assert!(encode(&mut out, &users).is_err());
        assert_eq!(out, wire(b"ok", false, 1, 70.0, b""));
    }

    #[test]
    fn encode_surfaces_sink_errors() {
        let user = User::new("Jo", 30, true, 80.0, vec![]);
        let err = encode_one(&mut Broken, &user).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }

    // -------------------- Decode --------------------

    #[test]
    fn decode_empty_input_is_empty_collection() -> Result<()> {
        assert!(decode(Cursor::new(Vec::new()))?.is_empty());
        Ok(())
    }

    #[test]
    fn decode_reads_all_records_until_clean_eof() -> Result<()> {
        let mut data = wire(b"John Doe", true, 30, 80.0, b"Harry Potter,1984");
        data.extend(wire(b"Jake Doe", false, 20, 60.0, b""));
        data.extend(wire(b" Jane Doe ", false, 150, 55.5, b"Dune"));

        let users = decode(Cursor::new(data))?;
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].name, "John Doe");
        assert_eq!(users[0].age, 30);
        assert_eq!(users[0].books, books(&["Harry Potter", "1984"]));
        assert_eq!(users[1].books, Vec::<String>::new());
        assert_eq!(users[2].name, " Jane Doe ");
        assert_eq!(users[2].age, 150);
        assert_eq!(users[2].mass, 55.5);
        Ok(())
    }

    #[test]
    fn decode_assigns_positional_one_hot_markers() -> Result<()> {
        let mut data = wire(b"a", true, 1, 70.0, b"");
        data.extend(wire(b"b", false, 2, 70.0, b""));
        data.extend(wire(b"c", true, 3, 70.0, b""));

        let markers: Vec<u8> = decode(Cursor::new(data))?
            .iter()
            .map(|u| u.active_index)
            .collect();
        assert_eq!(markers, vec![1, 0, 4]);
        Ok(())
    }

    #[test]
    fn decode_marker_for_last_slot() -> Result<()> {
        let mut data = Vec::new();
        for i in 0..8u64 {
            data.extend(wire(b"u", i == 7, i, 70.0, b""));
        }
        let users = decode(Cursor::new(data))?;
        assert_eq!(users[7].active_index, 0b1000_0000);
        assert!(users[..7].iter().all(|u| !u.is_active()));
        Ok(())
    }

    #[test]
    fn decode_masks_age_to_low_byte() -> Result<()> {
        let data = wire(b"a", true, 0x1234, 70.0, b"");
        let users = decode(Cursor::new(data))?;
        assert_eq!(users[0].age, 0x34);
        assert!(users[0].is_active());
        Ok(())
    }

    #[test]
    fn decode_normalizes_mass() -> Result<()> {
        let mut data = wire(b"q", false, 1, 0.75, b"");
        data.extend(wire(b"o", false, 1, 700.0, b""));
        data.extend(wire(b"k", false, 1, 80.0, b""));
        data.extend(wire(b"b1", false, 1, 0.0009, b""));
        data.extend(wire(b"b2", false, 1, 1.0, b""));
        data.extend(wire(b"b3", false, 1, 620.0, b""));

        let masses: Vec<f64> = decode(Cursor::new(data))?.iter().map(|u| u.mass).collect();
        assert_eq!(
            masses,
            vec![0.75 * KG_PER_QUINTAL, 700.0 * KG_PER_OZ, 80.0, 0.0009, 1.0, 620.0]
        );
        Ok(())
    }

    #[test]
    fn decode_stops_at_cap_and_ignores_the_rest() -> Result<()> {
        let mut data = Vec::new();
        for i in 0..10u64 {
            data.extend(wire(format!("user{i}").as_bytes(), false, i, 70.0, b""));
        }
        let users = decode(Cursor::new(data))?;
        assert_eq!(users.len(), MAX_USERS);
        assert_eq!(users[7].name, "user7");
        Ok(())
    }

    #[test]
    fn decode_full_collection_with_trailing_garbage() -> Result<()> {
        let mut data = Vec::new();
        for _ in 0..MAX_USERS {
            data.extend(wire(b"u", false, 1, 70.0, b""));
        }
        data.extend_from_slice(&[42, 1, 2]);
        assert_eq!(decode(Cursor::new(data))?.len(), MAX_USERS);
        Ok(())
    }

    #[test]
    fn decode_truncated_record_fails() {
        let full = wire(b"John", true, 30, 80.0, b"Dune");
        for cut in 1..full.len() {
            let mut data = wire(b"ok", false, 1, 70.0, b"");
            data.extend_from_slice(&full[..cut]);
            let err = decode(Cursor::new(data)).unwrap_err();
            assert!(
                matches!(err, RecordError::Truncated),
                "cut at {cut} should be truncated, got {err:?}"
            );
        }
    }

    #[test]
    fn decode_surfaces_reader_errors() {
        let err = decode(Broken).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));

        let good = wire(b"ok", false, 1, 70.0, b"");
        let err = decode(Cursor::new(good).chain(Broken)).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }

    #[test]
    fn decode_name_bytes_permissively() -> Result<()> {
        let data = wire(&[b'A', 0xFF, b'B'], false, 1, 70.0, b"");
        let users = decode(Cursor::new(data))?;
        assert_eq!(users[0].name, "A\u{FFFD}B");
        Ok(())
    }

    // -------------------- Round trip --------------------

    #[test]
    fn round_trip_outside_normalization_bands() -> Result<()> {
        let mut users = vec![
            User::new("John Doe", 30, true, 80.0, books(&["Harry Potter", "1984"])),
            User::new("Jake Doe", 20, false, 1.0, vec![]),
            User::new("Ширина", 255, true, 620.0, books(&["Кобзар"])),
            User::new("", 0, false, 0.0, books(&["a", "", "b"])),
        ];
        // markers as decode will assign them
        users[2].active_index = 1 << 2;

        let mut out = Vec::new();
        encode(&mut out, &users)?;
        assert_eq!(decode(Cursor::new(out))?, users);
        Ok(())
    }

    #[test]
    fn single_empty_book_reads_back_as_no_books() -> Result<()> {
        let user = User::new("Jo", 1, false, 70.0, books(&[""]));
        let mut out = Vec::new();
        encode_one(&mut out, &user)?;
        assert_eq!(out, wire(b"Jo", false, 1, 70.0, b""));
        assert!(decode(Cursor::new(out))?[0].books.is_empty());
        Ok(())
    }
}
