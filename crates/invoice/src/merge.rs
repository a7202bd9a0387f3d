//! Vertical merge planning for repeated column values

use std::collections::BTreeMap;

/// An inclusive run of table rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowSpan {
    pub first: usize,
    pub last: usize,
}

impl RowSpan {
    pub fn row_count(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, row: usize) -> bool {
        self.first <= row && row <= self.last
    }
}

/// A merged cell: one column over a run of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellSpan {
    pub column: usize,
    pub rows: RowSpan,
}

/// Rows sharing each distinct value of one mergeable column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnGroups {
    /// Column index in the table
    pub column: usize,
    /// Column key (`description`, `asin`, `product`, `amount`)
    pub name: &'static str,
    /// Value -> row indices where it appears, in insertion order
    pub values: BTreeMap<String, Vec<usize>>,
}

impl ColumnGroups {
    pub fn new(column: usize, name: &'static str) -> Self {
        Self {
            column,
            name,
            values: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, value: &str, row: usize) {
        self.values.entry(value.to_string()).or_default().push(row);
    }

    /// Merge spans for this column
    pub fn spans(&self) -> Vec<CellSpan> {
        let mut spans: Vec<CellSpan> = self
            .values
            .values()
            .flat_map(|rows| plan_spans(rows))
            .map(|rows| CellSpan {
                column: self.column,
                rows,
            })
            .collect();
        spans.sort();
        spans
    }
}

/// Per-column value groups for every mergeable column of a table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeInfo {
    pub columns: Vec<ColumnGroups>,
}

impl MergeInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnGroups> {
        self.columns.iter().find(|groups| groups.name == name)
    }

    /// All merge spans, ordered by column then first row
    pub fn spans(&self) -> Vec<CellSpan> {
        let mut spans: Vec<CellSpan> = self.columns.iter().flat_map(ColumnGroups::spans).collect();
        spans.sort();
        spans
    }
}

/// Split row indices into contiguous runs of at least two rows
///
/// Indices are sorted first; a run ends wherever the next index is not
/// exactly one more than the previous. Single rows produce no span.
///
/// ```
/// use invoice::{plan_spans, RowSpan};
///
/// let spans = plan_spans(&[0, 1, 2, 4, 5, 7]);
/// assert_eq!(spans, vec![RowSpan { first: 0, last: 2 }, RowSpan { first: 4, last: 5 }]);
/// ```
pub fn plan_spans(rows: &[usize]) -> Vec<RowSpan> {
    let mut sorted = rows.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut spans = Vec::new();
    let Some((&first, rest)) = sorted.split_first() else {
        return spans;
    };

    let mut start = first;
    let mut previous = first;
    for &row in rest {
        if row != previous + 1 {
            if previous > start {
                spans.push(RowSpan {
                    first: start,
                    last: previous,
                });
            }
            start = row;
        }
        previous = row;
    }
    if previous > start {
        spans.push(RowSpan {
            first: start,
            last: previous,
        });
    }

    spans
}
