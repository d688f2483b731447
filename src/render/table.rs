//! Box-drawn text tables.

use std::fmt;

/// A fixed-header text table, one cell of padding on each side.
///
/// Columns are as wide as their widest cell and every row is separated from
/// the next by a rule.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    head: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(head: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            head: head.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.head.len()))
            .max()
            .unwrap_or(0);

        (0..columns)
            .map(|col| {
                std::iter::once(&self.head)
                    .chain(&self.rows)
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn rule(f: &mut fmt::Formatter<'_>, widths: &[usize], left: char, mid: char, right: char) -> fmt::Result {
    write!(f, "{}", left)?;
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", mid)?;
        }
        write!(f, "{}", "─".repeat(width + 2))?;
    }
    write!(f, "{}", right)
}

fn line(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> fmt::Result {
    write!(f, "│")?;
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = width - cell.chars().count();
        write!(f, " {}{} │", cell, " ".repeat(pad))?;
    }
    Ok(())
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        rule(f, &widths, '┌', '┬', '┐')?;
        writeln!(f)?;
        line(f, &widths, &self.head)?;
        for row in &self.rows {
            writeln!(f)?;
            rule(f, &widths, '├', '┼', '┤')?;
            writeln!(f)?;
            line(f, &widths, row)?;
        }
        writeln!(f)?;
        rule(f, &widths, '└', '┴', '┘')
    }
}
