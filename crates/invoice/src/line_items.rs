//! Line-item parsing and pricing
//!
//! Each non-blank input line is `description, asin, x, y` where the last two
//! fields depend on the [`Variant`]. Malformed lines are skipped and reported
//! in [`PricedTable::skipped`]; they never abort the batch.

use crate::merge::{CellSpan, ColumnGroups, MergeInfo};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use text_format::{format_days, format_money, format_usd};
use thiserror::Error;

/// Minimum number of comma-separated fields per line
pub const MIN_FIELDS: usize = 4;

/// Invoice layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Advertising: daily rate times number of days
    Ad,
    /// Promotion: fixed amount per product, billed once per product/amount
    Promo,
}

impl Variant {
    /// Column titles of the header row
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Variant::Ad => &["Description", "Asin", "Per day", "Day", "AMOUNT"],
            Variant::Promo => &["Description", "Asin", "Product", "Amount"],
        }
    }

    pub fn column_count(self) -> usize {
        self.header().len()
    }

    /// Mergeable columns as `(column index, key)`
    pub fn mergeable_columns(self) -> &'static [(usize, &'static str)] {
        match self {
            Variant::Ad => &[(0, "description"), (1, "asin")],
            Variant::Promo => &[
                (0, "description"),
                (1, "asin"),
                (2, "product"),
                (3, "amount"),
            ],
        }
    }

    /// Column widths as fractions of the usable page width
    pub fn column_ratios(self) -> &'static [f64] {
        match self {
            Variant::Ad => &[0.35, 0.18, 0.15, 0.15, 0.17],
            Variant::Promo => &[0.40, 0.18, 0.27, 0.15],
        }
    }
}

/// Why a line was skipped
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LineItemError {
    #[error("expected at least {MIN_FIELDS} comma-separated fields, found {0}")]
    TooFewFields(usize),

    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("amount too large")]
    Overflow,
}

/// One parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum LineItem {
    Ad {
        description: String,
        asin: String,
        rate: Decimal,
        days: i64,
        /// `rate * days`
        amount: Decimal,
    },
    Promo {
        description: String,
        asin: String,
        product: String,
        amount: Decimal,
    },
}

impl LineItem {
    /// Parse one line for the given variant
    pub fn parse(line: &str, variant: Variant) -> Result<Self, LineItemError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return Err(LineItemError::TooFewFields(fields.len()));
        }

        let description = fields[0].to_string();
        let asin = fields[1].to_string();

        match variant {
            Variant::Ad => {
                let rate = parse_decimal("rate", fields[2])?;
                let days: i64 = fields[3]
                    .parse()
                    .map_err(|_| LineItemError::InvalidNumber {
                        field: "days",
                        value: fields[3].to_string(),
                    })?;
                let amount = rate
                    .checked_mul(Decimal::from(days))
                    .ok_or(LineItemError::Overflow)?;
                Ok(LineItem::Ad {
                    description,
                    asin,
                    rate,
                    days,
                    amount,
                })
            }
            Variant::Promo => Ok(LineItem::Promo {
                description,
                asin,
                product: fields[2].to_string(),
                amount: parse_decimal("amount", fields[3])?,
            }),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            LineItem::Ad { description, .. } | LineItem::Promo { description, .. } => description,
        }
    }

    pub fn asin(&self) -> &str {
        match self {
            LineItem::Ad { asin, .. } | LineItem::Promo { asin, .. } => asin,
        }
    }

    /// Amount shown on this item's row
    pub fn amount(&self) -> Decimal {
        match self {
            LineItem::Ad { amount, .. } | LineItem::Promo { amount, .. } => *amount,
        }
    }

    /// Display cells for this item's row
    pub fn cells(&self) -> Vec<String> {
        match self {
            LineItem::Ad {
                description,
                asin,
                rate,
                days,
                amount,
            } => vec![
                description.clone(),
                asin.clone(),
                format_money(*rate),
                format_days(*days),
                format_money(*amount),
            ],
            LineItem::Promo {
                description,
                asin,
                product,
                amount,
            } => vec![
                description.clone(),
                asin.clone(),
                product.clone(),
                format_money(*amount),
            ],
        }
    }
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, LineItemError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| LineItemError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Input lines split on `\r\n`, `\n` or a lone `\r`
fn input_lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// A line that could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the input (blank lines counted, `\r\n` is one break)
    pub line_number: usize,
    pub text: String,
    pub error: LineItemError,
}

/// Header, item rows and TOTAL row, with merge groups and the total
#[derive(Debug, Clone, PartialEq)]
pub struct PricedTable {
    pub variant: Variant,
    /// Row 0 is the header, the last row is TOTAL
    pub rows: Vec<Vec<String>>,
    pub items: Vec<LineItem>,
    pub merge_info: MergeInfo,
    pub total: Decimal,
    pub skipped: Vec<SkippedRow>,
}

impl PricedTable {
    /// Parse and price raw line-item text
    ///
    /// Lines are split on any newline convention and blank lines ignored.
    /// AD totals add every row; Promo totals add each distinct
    /// `(product, amount)` pair once.
    pub fn parse(input: &str, variant: Variant) -> Self {
        let mut rows = vec![variant.header().iter().map(|s| s.to_string()).collect()];
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        let mut merge_info = MergeInfo {
            columns: variant
                .mergeable_columns()
                .iter()
                .map(|&(column, name)| ColumnGroups::new(column, name))
                .collect(),
        };
        let mut total = Decimal::ZERO;
        let mut billed: HashSet<(String, Decimal)> = HashSet::new();

        for (index, line) in input_lines(input).enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let priced = LineItem::parse(line, variant).and_then(|item| {
                let key = match &item {
                    LineItem::Ad { .. } => None,
                    LineItem::Promo {
                        product, amount, ..
                    } => Some((product.clone(), amount.normalize())),
                };
                let billable = key.as_ref().map_or(true, |key| !billed.contains(key));
                let new_total = if billable {
                    total
                        .checked_add(item.amount())
                        .ok_or(LineItemError::Overflow)?
                } else {
                    if let Some((product, amount)) = &key {
                        log::debug!("{product} at {amount} already billed, not added to total");
                    }
                    total
                };
                Ok((item, key, new_total))
            });

            let item = match priced {
                Ok((item, key, new_total)) => {
                    total = new_total;
                    if let Some(key) = key {
                        billed.insert(key);
                    }
                    item
                }
                Err(error) => {
                    log::warn!("skipping line {}: {} ({:?})", index + 1, error, line);
                    skipped.push(SkippedRow {
                        line_number: index + 1,
                        text: line.to_string(),
                        error,
                    });
                    continue;
                }
            };

            let cells = item.cells();
            let row = rows.len();
            for groups in &mut merge_info.columns {
                groups.record(&cells[groups.column], row);
            }
            rows.push(cells);
            items.push(item);
        }

        let mut total_row = vec![String::new(); variant.column_count()];
        total_row[0] = "TOTAL".to_string();
        total_row[variant.column_count() - 1] = format_usd(total);
        rows.push(total_row);

        log::debug!(
            "priced {} line item(s), {} skipped, total {}",
            items.len(),
            skipped.len(),
            format_money(total)
        );

        Self {
            variant,
            rows,
            items,
            merge_info,
            total,
            skipped,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Rows between the header and TOTAL
    pub fn item_rows(&self) -> &[Vec<String>] {
        &self.rows[1..self.rows.len() - 1]
    }

    pub fn total_row(&self) -> &[String] {
        &self.rows[self.rows.len() - 1]
    }

    /// Total formatted as `USD 70.00`
    pub fn total_display(&self) -> String {
        format_usd(self.total)
    }

    /// Merge spans for every mergeable column
    pub fn spans(&self) -> Vec<CellSpan> {
        self.merge_info.spans()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::RowSpan;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ad_total() {
        let table = PricedTable::parse("Widget,A1,10.00,3\nWidget,A1,20.00,2", Variant::Ad);

        assert_eq!(table.total, Decimal::new(70, 0));
        assert_eq!(table.total_display(), "USD 70.00");
        assert_eq!(
            table.rows,
            vec![
                vec!["Description", "Asin", "Per day", "Day", "AMOUNT"],
                vec!["Widget", "A1", "10.00", "3 days", "30.00"],
                vec!["Widget", "A1", "20.00", "2 days", "40.00"],
                vec!["TOTAL", "", "", "", "USD 70.00"],
            ]
        );
    }

    #[test]
    fn test_ad_total_equals_sum_of_rows() {
        let input = "A,x,1.5,2\r\n\r\nB,y,2.25,4\nC,z,0.10,3\n";
        let table = PricedTable::parse(input, Variant::Ad);
        let sum: Decimal = table.items.iter().map(LineItem::amount).sum();
        assert_eq!(table.total, sum);
        assert_eq!(table.total_display(), "USD 12.30");
    }

    #[test]
    fn test_promo_dedupes_product_amount_pairs() {
        let input = "Deal,B1,Mug,15\nDeal,B2,Mug,15.00\nDeal,B3,Cup,15";
        let table = PricedTable::parse(input, Variant::Promo);

        assert_eq!(table.item_rows().len(), 3);
        assert_eq!(table.total, Decimal::new(30, 0));
        assert_eq!(table.total_row(), ["TOTAL", "", "", "USD 30.00"]);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let input = "Widget,A1,10,3\nbad line\nWidget,A1,ten,3\nWidget,A1,10,2.5\nWidget,A1,5,1";
        let table = PricedTable::parse(input, Variant::Ad);

        assert_eq!(table.items.len(), 2);
        assert_eq!(table.total, Decimal::new(35, 0));
        let lines: Vec<usize> = table.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(table.skipped[0].error, LineItemError::TooFewFields(1));
        assert_eq!(
            table.skipped[1].error,
            LineItemError::InvalidNumber {
                field: "rate",
                value: "ten".to_string()
            }
        );
    }

    #[test]
    fn test_oversized_product_is_skipped() {
        let input = "Widget,A1,100000000000000000000,9223372036854775807\nWidget,A1,10,3";
        let table = PricedTable::parse(input, Variant::Ad);

        assert_eq!(table.items.len(), 1);
        assert_eq!(table.total_display(), "USD 30.00");
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].line_number, 1);
        assert_eq!(table.skipped[0].error, LineItemError::Overflow);
    }

    #[test]
    fn test_total_overflow_skips_row() {
        let input = "Big,A1,79228162514264337593543950335,1\nBig,A2,79228162514264337593543950335,1";
        let table = PricedTable::parse(input, Variant::Ad);

        assert_eq!(table.items.len(), 1);
        assert_eq!(table.total, Decimal::MAX);
        assert_eq!(table.item_rows().len(), 1);
        assert_eq!(table.skipped[0].line_number, 2);
        assert_eq!(table.skipped[0].error, LineItemError::Overflow);
    }

    #[test]
    fn test_promo_total_overflow_skips_row() {
        let input = "Deal,B1,Mug,79228162514264337593543950335\nDeal,B1,Cup,1\nDeal,B1,Mug,79228162514264337593543950335";
        let table = PricedTable::parse(input, Variant::Promo);

        let lines: Vec<usize> = table.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![2]);
        assert_eq!(table.items.len(), 2);
        assert_eq!(table.total, Decimal::MAX);
    }

    #[test]
    fn test_lone_carriage_return_breaks_lines() {
        let table = PricedTable::parse("Widget,A1,10.00,3\rWidget,A1,20.00,2", Variant::Ad);
        assert_eq!(table.items.len(), 2);
        assert_eq!(table.total_display(), "USD 70.00");

        let mixed = "A,x,1,1\r\nbad\rB,y,2,1\n\rC,z,3,1";
        let table = PricedTable::parse(mixed, Variant::Ad);
        assert_eq!(table.total_display(), "USD 6.00");
        let lines: Vec<usize> = table.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![2]);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let item = LineItem::parse(" Widget , A1 , 10 , 3 , note", Variant::Ad).unwrap();
        assert_eq!(item.description(), "Widget");
        assert_eq!(item.amount(), Decimal::new(30, 0));
    }

    #[test]
    fn test_empty_input_has_header_and_total() {
        let table = PricedTable::parse("  \n", Variant::Promo);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.total_display(), "USD 0.00");
        assert!(table.spans().is_empty());
    }

    #[test]
    fn test_merge_groups_skip_header_row() {
        let input = "Ad,A1,1,1\nAd,A1,1,1\nAd,A2,1,1\nOther,A1,1,1";
        let table = PricedTable::parse(input, Variant::Ad);

        let description = table.merge_info.column("description").unwrap();
        assert_eq!(description.values["Ad"], vec![1, 2, 3]);
        assert_eq!(
            table.spans(),
            vec![
                CellSpan {
                    column: 0,
                    rows: RowSpan { first: 1, last: 3 }
                },
                CellSpan {
                    column: 1,
                    rows: RowSpan { first: 1, last: 2 }
                },
            ]
        );
    }

    #[test]
    fn test_promo_merges_amount_column() {
        let input = "Deal,B1,Mug,15\nDeal,B1,Mug,15";
        let table = PricedTable::parse(input, Variant::Promo);
        let columns: Vec<usize> = table.spans().iter().map(|s| s.column).collect();
        assert_eq!(columns, vec![0, 1, 2, 3]);
    }
}
