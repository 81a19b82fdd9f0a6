use std::collections::HashMap;
use std::fmt;

/// Tabular data attached to a step, scenario or document.
/// The first Markdown row supplies the column names; every following row
/// is stored as a mapping from column name to cell text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Table {
    /// Build a table from a header row and raw data rows.
    /// Rows shorter than the header are padded with empty cells, extra
    /// cells are dropped.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                columns
                    .iter()
                    .map(|column| (column.clone(), cells.next().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// True if every name is one of this table's columns.
    pub fn has_columns<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> bool {
        names.all(|name| self.has_column(name))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for column in &self.columns {
            write!(f, " {} |", column)?;
        }
        writeln!(f)?;
        write!(f, "|")?;
        for _ in &self.columns {
            write!(f, "---|")?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "|")?;
            for column in &self.columns {
                let cell = row.get(column).map(String::as_str).unwrap_or("");
                write!(f, " {} |", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The literal contents of a fenced code block attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBlock {
    /// Info string of the fence (empty when none was given).
    pub language: String,
    pub content: String,
}

impl TextBlock {
    pub fn new(language: impl Into<String>, content: impl Into<String>) -> Self {
        TextBlock {
            language: language.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_are_keyed_by_column() {
        let table = Table::from_rows(
            strings(&["a", "b"]),
            vec![strings(&["1", "2"]), strings(&["3", "4"])],
        );
        assert_eq!(table.cell(0, "a"), Some("1"));
        assert_eq!(table.cell(1, "b"), Some("4"));
        assert_eq!(table.cell(2, "a"), None);
        assert_eq!(table.column_index("b"), Some(1));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::from_rows(strings(&["a", "b", "c"]), vec![strings(&["1"])]);
        assert_eq!(table.cell(0, "a"), Some("1"));
        assert_eq!(table.cell(0, "c"), Some(""));
    }

    #[test]
    fn column_superset_check() {
        let table = Table::from_rows(strings(&["a", "b", "sum"]), vec![]);
        assert!(table.has_columns(["a", "sum"].into_iter()));
        assert!(!table.has_columns(["a", "difference"].into_iter()));
        assert!(table.is_empty());
    }

    #[test]
    fn renders_as_markdown() {
        let table = Table::from_rows(strings(&["x"]), vec![strings(&["1"])]);
        assert_eq!(table.to_string(), "| x |\n|---|\n| 1 |\n");
    }
}
