//! Result collection and export
//!
//! [`ResultCollector`] appends every thread row to all five output columns in
//! one call, so the columns grow in lockstep. [`ResultCollector::finalize`]
//! still pads short columns with `N/A` before handing out the table.

pub mod export;

pub use export::{ExportFormat, TableExporter};

use crate::models::{ThreadRow, NOT_AVAILABLE};

/// Output column names, in order
pub const COLUMNS: [&str; 5] = [
    "Query",
    "Query Timestamp",
    "Response",
    "Response Timestamp",
    "Timestamp Difference",
];

/// Accumulates rows as five parallel columns
#[derive(Debug, Default)]
pub struct ResultCollector {
    columns: [Vec<String>; 5],
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row to every column
    pub fn append_row(&mut self, row: ThreadRow) {
        let ThreadRow {
            query,
            query_timestamp,
            response,
            response_timestamp,
            timestamp_diff,
        } = row;

        let cells = [
            query,
            query_timestamp,
            response,
            response_timestamp,
            timestamp_diff,
        ];
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    /// Rows appended so far
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pad every column to the longest one and freeze the table
    pub fn finalize(mut self) -> ResultTable {
        let target = self.len();
        let mut padded = 0;

        for (name, column) in COLUMNS.iter().zip(self.columns.iter_mut()) {
            let missing = target - column.len();
            if missing > 0 {
                tracing::warn!(column = name, missing, "Padding misaligned column");
                column.resize(target, NOT_AVAILABLE.to_string());
                padded += missing;
            }
        }

        ResultTable {
            columns: self.columns,
            padded_cells: padded,
        }
    }
}

/// Immutable, row-aligned result table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    columns: [Vec<String>; 5],
    padded_cells: usize,
}

impl ResultTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells added while finalizing
    pub fn padded_cells(&self) -> usize {
        self.padded_cells
    }

    /// Cells of one column by position
    pub fn column(&self, index: usize) -> Option<&[String]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Cells of one column by name
    pub fn column_by_name(&self, name: &str) -> Option<&[String]> {
        COLUMNS
            .iter()
            .position(|column| *column == name)
            .and_then(|index| self.column(index))
    }

    /// Rows as cell arrays, in column order
    pub fn rows(&self) -> impl Iterator<Item = [&str; 5]> + '_ {
        (0..self.len()).map(move |i| {
            [
                self.columns[0][i].as_str(),
                self.columns[1][i].as_str(),
                self.columns[2][i].as_str(),
                self.columns[3][i].as_str(),
                self.columns[4][i].as_str(),
            ]
        })
    }
}
