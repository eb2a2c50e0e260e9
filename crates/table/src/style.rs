//! Border symbols.

/// One horizontal rule: `left`, `line` repeated over each column (plus its two
/// padding spaces), `cross` between columns, `right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub left: &'static str,
    pub line: &'static str,
    pub cross: &'static str,
    pub right: &'static str,
}

impl Rule {
    pub const fn new(
        left: &'static str,
        line: &'static str,
        cross: &'static str,
        right: &'static str,
    ) -> Self {
        Self {
            left,
            line,
            cross,
            right,
        }
    }
}

/// The full set of symbols used to draw a table.
///
/// `top` is drawn above the header, `header` between the header and the body,
/// `between_rows` between two body rows and `bottom` after the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub column: &'static str,
    pub top: Option<Rule>,
    pub header: Rule,
    pub between_rows: Option<Rule>,
    pub bottom: Option<Rule>,
}

impl Style {
    /// Rounded Unicode box with a double rule under the header.
    ///
    /// ```text
    /// ╭──────┬─────╮
    /// │ Name │ Age │
    /// ╞══════╪═════╡
    /// │ Jane │ 5   │
    /// ├──────┼─────┤
    /// │ John │ 7   │
    /// ╰──────┴─────╯
    /// ```
    pub const fn rounded() -> Self {
        Self {
            column: "│",
            top: Some(Rule::new("╭", "─", "┬", "╮")),
            header: Rule::new("╞", "═", "╪", "╡"),
            between_rows: Some(Rule::new("├", "─", "┼", "┤")),
            bottom: Some(Rule::new("╰", "─", "┴", "╯")),
        }
    }

    /// Plain ASCII, every row closed by its own rule.
    ///
    /// ```text
    /// | Name | Age |
    /// |------|-----|
    /// | Jane | 5   |
    /// |------+-----|
    /// ```
    pub const fn ascii() -> Self {
        let row = Rule::new("|", "-", "+", "|");
        Self {
            column: "|",
            top: None,
            header: Rule::new("|", "-", "|", "|"),
            between_rows: Some(row),
            bottom: Some(row),
        }
    }

    /// Same as `self` without rules between body rows.
    pub fn compact(mut self) -> Self {
        self.between_rows = None;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::rounded()
    }
}
