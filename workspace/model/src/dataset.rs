//! Typed sales dataset and CSV ingestion.
//!
//! Parsing is a schema-validation step: raw tabular bytes go in, a sequence
//! of typed [`SalesRecord`]s comes out, and aggregation never touches column
//! names again. Columns beyond the required seven are ignored here; callers
//! that persist the raw bytes keep them intact on disk.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Header names the input must carry, exactly as written (case-sensitive).
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "OrderID", "Year", "Month", "Region", "Product", "Quantity", "Revenue",
];

/// One row of a sales dataset.
///
/// `order_id` is not unique: repeated rows belong to the same order.
/// Rows are assumed pre-validated beyond the required columns.
#[derive(Clone, Debug, PartialEq)]
pub struct SalesRecord {
    pub order_id: String,
    pub year: i32,
    /// Month label as uploaded, either a name ("Jan") or a 1-12 ordinal.
    pub month: String,
    pub region: String,
    pub product: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}

/// An ordered sequence of sales records, owned by exactly one account.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years present, ascending. Filter choices come from here.
    pub fn distinct_years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct regions present, ascending.
    pub fn distinct_regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Why uploaded bytes could not be turned into a [`Dataset`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not parseable as tabular data.
    #[error("input is not parseable as tabular data: {0}")]
    MalformedFormat(String),

    /// A required field is absent from the header row.
    #[error("required column '{0}' is missing from the header")]
    MissingRequiredColumn(&'static str),
}

/// Calendar position of a month label.
///
/// Accepts a 1-12 ordinal, an English month name or its three-letter
/// abbreviation (case-insensitive). Unknown labels get `None` and sort
/// after the twelve known months.
pub fn month_ordinal(label: &str) -> Option<u32> {
    if let Ok(n) = label.trim().parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = label.trim().to_ascii_lowercase();
    match lower.get(..3)? {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Parse raw tabular bytes into a typed dataset.
///
/// The header must contain every name in [`REQUIRED_COLUMNS`]; extra
/// columns are ignored. Unreadable rows or unparseable numeric fields
/// surface as [`ParseError::MalformedFormat`].
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::MalformedFormat(e.to_string()))?
        .clone();

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or(ParseError::MissingRequiredColumn(name))?;
    }
    let [order_id, year, month, region, product, quantity, revenue] = indices;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ParseError::MalformedFormat(e.to_string()))?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        records.push(SalesRecord {
            order_id: field(order_id).to_string(),
            year: field(year)
                .parse()
                .map_err(|_| malformed_field(row, "Year", field(year)))?,
            month: field(month).to_string(),
            region: field(region).to_string(),
            product: field(product).to_string(),
            quantity: field(quantity)
                .parse()
                .map_err(|_| malformed_field(row, "Quantity", field(quantity)))?,
            revenue: field(revenue)
                .parse()
                .map_err(|_| malformed_field(row, "Revenue", field(revenue)))?,
        });
    }

    debug!(rows = records.len(), "parsed sales dataset");
    Ok(Dataset { records })
}

fn malformed_field(row: usize, column: &str, value: &str) -> ParseError {
    ParseError::MalformedFormat(format!(
        "data row {}: '{}' is not a valid {} value",
        row + 1,
        value,
        column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
OrderID,Year,Month,Region,Product,Quantity,Revenue
1,2023,Jan,East,A,2,100
1,2023,Jan,East,B,1,50
2,2023,Feb,West,A,3,300
";

    #[test]
    fn parses_required_columns() {
        let dataset = parse_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.records[0];
        assert_eq!(first.order_id, "1");
        assert_eq!(first.year, 2023);
        assert_eq!(first.month, "Jan");
        assert_eq!(first.region, "East");
        assert_eq!(first.product, "A");
        assert_eq!(first.quantity, Decimal::from(2));
        assert_eq!(first.revenue, Decimal::from(100));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "\
Channel,OrderID,Year,Month,Region,Product,Quantity,Revenue
web,7,2024,Mar,North,Gadget,1,19.99
";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].order_id, "7");
        assert_eq!(dataset.records[0].revenue, "19.99".parse().unwrap());
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let csv = "OrderID,Year,Month,Region,Product,Quantity\n1,2023,Jan,East,A,2\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        match err {
            ParseError::MissingRequiredColumn(name) => assert_eq!(name, "Revenue"),
            other => panic!("expected MissingRequiredColumn, got {other:?}"),
        }
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let csv = "orderid,Year,Month,Region,Product,Quantity,Revenue\n1,2023,Jan,East,A,2,100\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingRequiredColumn("OrderID")));
    }

    #[test]
    fn unparseable_numeric_field_is_malformed() {
        let csv = "OrderID,Year,Month,Region,Product,Quantity,Revenue\n1,20x3,Jan,East,A,2,100\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        match err {
            ParseError::MalformedFormat(message) => {
                assert!(message.contains("Year"), "unexpected message: {message}")
            }
            other => panic!("expected MalformedFormat, got {other:?}"),
        }
    }

    #[test]
    fn header_only_input_is_an_empty_dataset() {
        let csv = "OrderID,Year,Month,Region,Product,Quantity,Revenue\n";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn distinct_values_are_sorted() {
        let csv = "\
OrderID,Year,Month,Region,Product,Quantity,Revenue
1,2024,Jan,West,A,1,10
2,2022,Feb,East,A,1,10
3,2024,Mar,East,B,1,10
";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.distinct_years(), vec![2022, 2024]);
        assert_eq!(dataset.distinct_regions(), vec!["East", "West"]);
    }

    #[test]
    fn month_ordinal_accepts_names_and_numbers() {
        assert_eq!(month_ordinal("Jan"), Some(1));
        assert_eq!(month_ordinal("january"), Some(1));
        assert_eq!(month_ordinal("December"), Some(12));
        assert_eq!(month_ordinal("9"), Some(9));
        assert_eq!(month_ordinal("12"), Some(12));
        assert_eq!(month_ordinal("0"), None);
        assert_eq!(month_ordinal("13"), None);
        assert_eq!(month_ordinal("Q1"), None);
    }
}
