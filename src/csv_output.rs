//! CSV output format for cross-run comparison tables

use crate::compare::ComparisonRow;

/// CSV comparison table: one column per run after the fixed triple
#[derive(Debug)]
pub struct ComparisonCsv {
    /// One label per run, in column order (typically the snapshot file paths)
    labels: Vec<String>,
    rows: Vec<ComparisonRow>,
}

impl ComparisonCsv {
    /// Create a new CSV comparison formatter
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(labels: Vec<String>, rows: Vec<ComparisonRow>) -> Self {
        Self { labels, rows }
    }

    /// Add a comparison row
    pub fn add_row(&mut self, row: ComparisonRow) {
        self.rows.push(row);
    }

    /// Generate the CSV header row
    fn header(&self) -> String {
        let mut headers = vec!["Play".to_string(), "Task".to_string(), "Host".to_string()];
        headers.extend(self.labels.iter().map(|label| Self::escape_field(label)));
        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Format one comparison row; an absent delta becomes an empty cell
    fn format_row(row: &ComparisonRow) -> String {
        let mut fields = vec![
            Self::escape_field(&row.play),
            Self::escape_field(&row.task),
            Self::escape_field(&row.host),
        ];
        for delta in &row.deltas {
            match delta {
                Some(seconds) => fields.push(format!("{seconds:.2}")),
                None => fields.push(String::new()),
            }
        }
        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }
}
