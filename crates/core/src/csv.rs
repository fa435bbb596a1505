//! CSV import/export for customers and products.
//!
//! Fields containing a comma, quote or newline are wrapped in double quotes
//! with embedded quotes doubled. The first line is always a header; columns
//! are matched by header name, so column order does not matter on import
//! and unknown columns are ignored.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::inventory::{validate_product, validate_reorder_level, validate_sku};
use crate::validation::{
    normalize_optional, validate_email, validate_optional_text, validate_required_text,
    MAX_NAME_LEN, MAX_NOTE_LEN,
};

/// Largest import accepted in one request.
pub const MAX_IMPORT_ROWS: usize = 5000;

/// Columns written by the customer export.
pub const CUSTOMER_EXPORT_HEADERS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone",
    "address",
    "loyalty_points",
    "notes",
];

/// Columns written by the product export.
pub const PRODUCT_EXPORT_HEADERS: &[&str] = &[
    "id",
    "sku",
    "name",
    "description",
    "category",
    "price",
    "cost",
    "stock_quantity",
    "reorder_level",
    "is_active",
];

/// Quote a value if it contains a delimiter, quote or line break.
pub fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Build a CSV document from a header and rows of already-formatted values.
pub fn build(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| escape(h)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Split one CSV line into fields, honouring quotes.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

/// One data line keyed by lower-cased header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// 1-based line number in the source document (the header is line 1).
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl CsvRecord {
    /// Trimmed value of a column, or `None` when missing or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, column: &str) -> Result<Option<T>, CoreError> {
        match self.get(column) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                CoreError::Validation(format!("Invalid {column}: '{raw}'"))
            }),
        }
    }
}

/// A per-line import failure reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvLineError {
    pub line: usize,
    pub message: String,
}

/// Split a document into raw records, keeping line breaks that sit inside
/// quoted fields. Each record carries the 1-based line it starts on.
fn split_records(text: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                // A doubled quote toggles twice and leaves the state unchanged.
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '\n' => {
                line += 1;
                if in_quotes {
                    current.push(ch);
                } else {
                    if current.ends_with('\r') {
                        current.pop();
                    }
                    records.push((start_line, std::mem::take(&mut current)));
                    start_line = line;
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        records.push((start_line, current));
    }
    records
}

/// Parse a CSV document into header-keyed records. Blank lines are skipped.
pub fn parse_records(text: &str) -> Result<Vec<CsvRecord>, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut raw = split_records(text).into_iter();

    let (_, header_line) = raw
        .next()
        .ok_or_else(|| CoreError::Validation("CSV is empty".into()))?;
    let headers: Vec<String> = parse_line(&header_line)
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::Validation("CSV header row is empty".into()));
    }

    let mut records = Vec::new();
    for (line, text) in raw {
        if text.trim().is_empty() {
            continue;
        }
        let values = parse_line(&text);
        let fields = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        records.push(CsvRecord { line, fields });
    }

    if records.len() > MAX_IMPORT_ROWS {
        return Err(CoreError::Validation(format!(
            "CSV may contain at most {MAX_IMPORT_ROWS} rows, got {}",
            records.len()
        )));
    }
    Ok(records)
}

fn require_columns(records: &[CsvRecord], required: &[&str]) -> Result<(), CoreError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !first.fields.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "CSV is missing required column(s): {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// A customer row ready to upsert. Rows with an email update the existing
/// customer with that email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerCsvRow {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CustomerCsvRow {
    pub const REQUIRED_COLUMNS: &'static [&'static str] = &["name"];

    pub fn from_record(record: &CsvRecord) -> Result<Self, CoreError> {
        let name = record.get("name").unwrap_or_default().to_string();
        validate_required_text(&name, "Name", MAX_NAME_LEN)?;
        let email = record.get("email").map(str::to_ascii_lowercase);
        validate_email(email.as_deref())?;
        let phone = normalize_optional(record.get("phone").map(String::from));
        validate_optional_text(phone.as_deref(), "Phone", 50)?;
        let address = normalize_optional(record.get("address").map(String::from));
        validate_optional_text(address.as_deref(), "Address", MAX_NOTE_LEN)?;
        let notes = normalize_optional(record.get("notes").map(String::from));
        validate_optional_text(notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
        Ok(Self {
            name,
            email,
            phone,
            address,
            notes,
        })
    }
}

/// A product row ready to upsert by SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCsvRow {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    /// Applied only when the product is created.
    pub stock_quantity: i32,
    pub reorder_level: i32,
}

impl ProductCsvRow {
    pub const REQUIRED_COLUMNS: &'static [&'static str] = &["sku", "name", "price"];

    pub fn from_record(record: &CsvRecord) -> Result<Self, CoreError> {
        let sku = record.get("sku").unwrap_or_default().to_string();
        validate_sku(&sku)?;
        let name = record.get("name").unwrap_or_default().to_string();
        let description = record.get("description").map(String::from);
        let category = record.get("category").map(String::from);
        validate_optional_text(category.as_deref(), "Category", MAX_NAME_LEN)?;
        let price = record
            .parse::<Decimal>("price")?
            .ok_or_else(|| CoreError::Validation("price is required".into()))?;
        let cost = record.parse::<Decimal>("cost")?.unwrap_or(Decimal::ZERO);
        validate_product(&name, description.as_deref(), price, cost)?;
        let stock_quantity = record.parse::<i32>("stock_quantity")?.unwrap_or(0);
        if stock_quantity < 0 {
            return Err(CoreError::Validation(format!(
                "stock_quantity must be non-negative, got {stock_quantity}"
            )));
        }
        let reorder_level = record.parse::<i32>("reorder_level")?.unwrap_or(0);
        validate_reorder_level(reorder_level)?;
        Ok(Self {
            sku,
            name,
            description,
            category,
            price,
            cost,
            stock_quantity,
            reorder_level,
        })
    }
}

/// Convert every record, separating valid rows from per-line errors.
///
/// A missing required column fails the whole import.
pub fn convert_records<T>(
    records: &[CsvRecord],
    required: &[&str],
    convert: impl Fn(&CsvRecord) -> Result<T, CoreError>,
) -> Result<(Vec<(usize, T)>, Vec<CsvLineError>), CoreError> {
    require_columns(records, required)?;
    let mut rows = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for record in records {
        match convert(record) {
            Ok(row) => rows.push((record.line, row)),
            Err(e) => errors.push(CsvLineError {
                line: record.line,
                message: e.to_string(),
            }),
        }
    }
    Ok((rows, errors))
}
