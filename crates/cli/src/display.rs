//! Display strings for user fields and the tables built from them.

use record::User;
use std::collections::BTreeMap;
use table::{Table, TablePrinter};

/// Column headers of the users table, in display order.
pub const USER_HEADERS: [&str; 5] = ["Name", "Age", "Active", "Mass", "Books"];

/// Column headers of the per-book statistics table.
pub const BOOK_STATS_HEADERS: [&str; 2] = ["Book", "Avg age"];

const MASS_PRECISION: usize = 3;

/// Escapes control characters and quotes, without surrounding quotes.
pub fn format_name(name: &str) -> String {
    let quoted = format!("{name:?}");
    quoted[1..quoted.len() - 1].to_string()
}

pub fn format_age(age: u8) -> String {
    age.to_string()
}

pub fn format_active(active_index: u8) -> String {
    let label = if active_index != 0 { "yes" } else { "-" };
    label.to_string()
}

/// Kilograms with up to three decimals and at least one.
pub fn format_mass(mass: f64) -> String {
    let fixed = format!("{:.*}", MASS_PRECISION, mass);
    let mut trimmed = fixed.trim_end_matches('0').to_string();
    if trimmed.ends_with('.') {
        trimmed.push('0');
    }
    format!("{trimmed} kg")
}

/// One quoted title per line.
pub fn format_books(books: &[String]) -> String {
    books
        .iter()
        .map(|book| format!("{book:?}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Users laid out one per row.
pub struct UserList<'a>(pub &'a [User]);

impl TablePrinter for UserList<'_> {
    fn to_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new(headers.iter().copied());
        for user in self.0 {
            let values = [
                format_name(&user.name),
                format_age(user.age),
                format_active(user.active_index),
                format_mass(user.mass),
                format_books(&user.books),
            ];
            table.push_pairs(headers.iter().copied().zip(values));
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookStat {
    pub title: String,
    pub avg_age: u32,
}

/// Average age of each book's readers, oldest audience first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookStats(pub Vec<BookStat>);

impl BookStats {
    pub fn from_users(users: &[User]) -> Self {
        let mut totals: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        for user in users {
            for book in &user.books {
                let entry = totals.entry(book.as_str()).or_default();
                entry.0 += u32::from(user.age);
                entry.1 += 1;
            }
        }

        let mut stats: Vec<BookStat> = totals
            .into_iter()
            .map(|(title, (sum, readers))| BookStat {
                title: title.to_string(),
                avg_age: (f64::from(sum) / f64::from(readers)).round() as u32,
            })
            .collect();
        // BTreeMap already ordered titles; the stable sort keeps that for ties
        stats.sort_by(|a, b| b.avg_age.cmp(&a.avg_age));
        Self(stats)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TablePrinter for BookStats {
    fn to_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new(headers.iter().copied());
        for stat in &self.0 {
            let values = [format_name(&stat.title), stat.avg_age.to_string()];
            table.push_pairs(headers.iter().copied().zip(values));
        }
        table
    }
}
