//! # Table
//!
//! Renders rows of pre-formatted strings as a bordered, column-aligned text
//! table.
//!
//! A [`Table`] is an ordered list of column headers plus rows that map a header
//! to its display string. Cell values may contain `\n`; each newline-separated
//! line is laid out on its own physical line, and lines longer than the column
//! are hard-wrapped.
//!
//! ## Column width
//!
//! A column is as wide as the widest of:
//! - its header,
//! - every newline-separated line of every cell in it, each clamped to the
//!   table's width limit.
//!
//! Widths are counted in Unicode code points.
//!
//! ## Output
//!
//! With a width limit of 12:
//!
//! ```text
//! ╭──────────┬──────────────╮
//! │   Name   │    Books     │
//! ╞══════════╪══════════════╡
//! │ John Doe │ "1984"       │
//! │          │ "Harry Potte │
//! │          │ r"           │
//! ╰──────────┴──────────────╯
//! ```
//!
//! Headers are centered, cells left-aligned. Output goes to the sink one
//! physical line per write.

mod style;
mod wrap;

use std::collections::HashMap;
use std::io::{self, Write};

pub use style::{Rule, Style};
pub use wrap::next_line;

/// Default ceiling for a column's width.
pub const DEFAULT_WIDTH_LIMIT: usize = 38;

/// Values of one table row keyed by column header.
///
/// A header with no entry renders as an empty cell.
pub type Row = HashMap<String, String>;

/// Anything that can lay itself out as a [`Table`].
pub trait TablePrinter {
    fn to_table(&self, headers: &[&str]) -> Table;
}

/// Builds the table for `data` and renders it to `w`.
pub fn print_data<W, P>(w: &mut W, data: &P, headers: &[&str]) -> io::Result<()>
where
    W: Write,
    P: TablePrinter + ?Sized,
{
    data.to_table(headers).render(w)
}

#[derive(Debug, Clone)]
pub struct Table {
    /// Column names, in display order.
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    width_limit: usize,
    style: Style,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            width_limit: DEFAULT_WIDTH_LIMIT,
            style: Style::default(),
        }
    }

    /// Caps every column at `limit` code points; values of zero are raised to
    /// one.
    pub fn with_width_limit(mut self, limit: usize) -> Self {
        self.width_limit = limit.max(1);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Adds a row from `(header, value)` pairs.
    pub fn push_pairs<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let row = pairs
            .into_iter()
            .map(|(header, value)| (header.to_string(), value))
            .collect();
        self.rows.push(row);
    }

    /// Width of each column, in header order, not counting padding.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .map(|header| {
                let mut width = header.chars().count();
                for row in &self.rows {
                    let Some(value) = row.get(header) else {
                        continue;
                    };
                    for line in value.split('\n') {
                        width = width.max(line.chars().count().min(self.width_limit));
                    }
                }
                width
            })
            .collect()
    }

    /// Writes the table to `w`, one physical line per write.
    ///
    /// A table without headers writes nothing. Sink errors are returned as-is.
    pub fn render<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }
        let widths = self.column_widths();

        if let Some(rule) = &self.style.top {
            self.write_rule(w, rule, &widths)?;
        }
        self.write_header(w, &widths)?;
        self.write_rule(w, &self.style.header, &widths)?;

        for (i, row) in self.rows.iter().enumerate() {
            for line in self.row_lines(row, &widths) {
                self.write_framed(w, &line)?;
            }
            if i + 1 < self.rows.len() {
                if let Some(rule) = &self.style.between_rows {
                    self.write_rule(w, rule, &widths)?;
                }
            }
        }

        if let Some(rule) = &self.style.bottom {
            self.write_rule(w, rule, &widths)?;
        }
        Ok(())
    }

    /// Renders into a `String`.
    pub fn render_to_string(&self) -> String {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.render(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_header<W: Write>(&self, w: &mut W, widths: &[usize]) -> io::Result<()> {
        let cells: Vec<String> = self
            .headers
            .iter()
            .zip(widths)
            .map(|(header, &width)| {
                let len = header.chars().count();
                let left = width.saturating_sub(len) / 2 + len;
                let right = width.saturating_sub(left);
                format!(" {header:>left$}{:right$} ", "")
            })
            .collect();
        self.write_framed(w, &cells.join(self.style.column))
    }

    fn write_rule<W: Write>(&self, w: &mut W, rule: &Rule, widths: &[usize]) -> io::Result<()> {
        let segments: Vec<String> = widths.iter().map(|width| rule.line.repeat(width + 2)).collect();
        let line = format!("{}{}{}\n", rule.left, segments.join(rule.cross), rule.right);
        w.write_all(line.as_bytes())
    }

    fn write_framed<W: Write>(&self, w: &mut W, inner: &str) -> io::Result<()> {
        let column = self.style.column;
        w.write_all(format!("{column}{inner}{column}\n").as_bytes())
    }

    // One table row becomes as many physical lines as its tallest cell needs.
    fn row_lines(&self, row: &Row, widths: &[usize]) -> Vec<String> {
        let mut remaining: Vec<&str> = self
            .headers
            .iter()
            .map(|header| row.get(header).map(String::as_str).unwrap_or(""))
            .collect();

        let mut lines = Vec::new();
        loop {
            let mut done = true;
            let mut cells = Vec::with_capacity(remaining.len());
            for (content, &width) in remaining.iter_mut().zip(widths) {
                let (cell, rest) = next_line(*content, width);
                *content = rest;
                if !rest.is_empty() {
                    done = false;
                }
                cells.push(cell);
            }
            lines.push(cells.join(self.style.column));
            if done {
                return lines;
            }
        }
    }
}
