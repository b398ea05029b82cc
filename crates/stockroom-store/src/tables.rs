//! # Table Codec
//!
//! Maps domain types to CSV rows and back.
//!
//! ## On-Disk Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  data_dir/                                                              │
//! │  ├── products.csv      id,name,description,price,quantity               │
//! │  ├── users.csv         id,username,password_hash,salt,created_at,role   │
//! │  ├── orders.csv        id,username,date,status,total                    │
//! │  ├── order_lines.csv   id,order_id,product_id,quantity,unit_price,total │
//! │  ├── audit.csv         timestamp,username,action,success   (append)     │
//! │  ├── id_watermarks.csv table,highest_removed                            │
//! │  └── commit.journal    present only while a commit is in flight         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The header row must match exactly, or the table is reported as
//!   needing migration. Columns are never guessed.
//! - A missing or empty file is an empty table.
//! - Money is written with two decimals, timestamps as RFC 3339 UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use std::path::Path;
use std::str::FromStr;

use stockroom_core::{
    AuditAction, AuditEntry, IdWatermark, Money, Order, OrderLine, Product, User,
};

use crate::error::{StoreError, StoreResult};

/// Every table file name, used to vet journal entries.
pub const TABLE_FILES: &[&str] = &[
    Product::FILE,
    User::FILE,
    Order::FILE,
    OrderLine::FILE,
    AuditEntry::FILE,
    IdWatermark::FILE,
];

// =============================================================================
// Record Trait
// =============================================================================

/// A type stored as one CSV row of one table.
pub trait Record: Sized {
    /// File name inside the data directory.
    const FILE: &'static str;

    /// Exact header row.
    const HEADER: &'static [&'static str];

    fn to_row(&self) -> Vec<String>;

    /// Parses one row. The error string names the offending field.
    fn from_row(row: &StringRecord) -> Result<Self, String>;
}

// =============================================================================
// Encoding / Decoding
// =============================================================================

/// Decodes a whole table from bytes.
pub fn decode<R: Record>(bytes: &[u8]) -> StoreResult<Vec<R>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header = reader.headers().map_err(|source| StoreError::Csv {
        table: R::FILE,
        source,
    })?;
    if header.iter().ne(R::HEADER.iter().copied()) {
        return Err(StoreError::SchemaMismatch {
            table: R::FILE,
            expected: R::HEADER.join(","),
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| StoreError::Csv {
            table: R::FILE,
            source,
        })?;
        let row = R::from_row(&record).map_err(|reason| StoreError::Corrupt {
            table: R::FILE,
            line: record.position().map_or(0, |p| p.line()),
            reason,
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Encodes a whole table, header included.
pub fn encode<R: Record>(rows: &[R]) -> StoreResult<Vec<u8>> {
    let csv_err = |source| StoreError::Csv {
        table: R::FILE,
        source,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(R::HEADER).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row.to_row()).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv_err(csv::Error::from(e.into_error())))
}

/// Encodes rows without a header, for appending to an existing table.
pub fn encode_rows<R: Record>(rows: &[R]) -> StoreResult<Vec<u8>> {
    let csv_err = |source| StoreError::Csv {
        table: R::FILE,
        source,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row.to_row()).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv_err(csv::Error::from(e.into_error())))
}

/// Reads a table from `dir`. A missing file is an empty table.
pub async fn read_table<R: Record>(dir: &Path) -> StoreResult<Vec<R>> {
    let path = dir.join(R::FILE);
    match tokio::fs::read(&path).await {
        Ok(bytes) => decode(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StoreError::io(&path)(e)),
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

fn field<'a>(row: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, String> {
    row.get(index).ok_or_else(|| format!("missing {name}"))
}

fn parse<T: FromStr>(row: &StringRecord, index: usize, name: &str) -> Result<T, String> {
    let raw = field(row, index, name)?;
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {name}: {raw:?}"))
}

/// Stored amounts are never negative.
fn money(row: &StringRecord, index: usize, name: &str) -> Result<Money, String> {
    let raw = field(row, index, name)?;
    let amount = raw
        .parse::<Money>()
        .map_err(|e| format!("invalid {name} {raw:?}: {e}"))?;
    if amount.is_negative() {
        return Err(format!("negative {name}: {raw:?}"));
    }
    Ok(amount)
}

/// RFC 3339, falling back to `YYYY-MM-DD HH:MM:SS` read as UTC.
fn timestamp(row: &StringRecord, index: usize, name: &str) -> Result<DateTime<Utc>, String> {
    let raw = field(row, index, name)?.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|_| format!("invalid {name}: {raw:?}"))
}

fn flag(row: &StringRecord, index: usize, name: &str) -> Result<bool, String> {
    let raw = field(row, index, name)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("invalid {name}: {raw:?}")),
    }
}

// =============================================================================
// Record Implementations
// =============================================================================

impl Record for Product {
    const FILE: &'static str = "products.csv";
    const HEADER: &'static [&'static str] = &["id", "name", "description", "price", "quantity"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone(),
            self.price.to_string(),
            self.quantity.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(Product {
            id: parse(row, 0, "id")?,
            name: field(row, 1, "name")?.to_string(),
            description: field(row, 2, "description")?.to_string(),
            price: money(row, 3, "price")?,
            quantity: parse(row, 4, "quantity")?,
        })
    }
}

impl Record for User {
    const FILE: &'static str = "users.csv";
    const HEADER: &'static [&'static str] =
        &["id", "username", "password_hash", "salt", "created_at", "role"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.password_hash.clone(),
            self.salt.clone(),
            self.created_at.to_rfc3339(),
            self.role.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(User {
            id: parse(row, 0, "id")?,
            username: field(row, 1, "username")?.to_string(),
            password_hash: field(row, 2, "password_hash")?.to_string(),
            salt: field(row, 3, "salt")?.to_string(),
            created_at: timestamp(row, 4, "created_at")?,
            role: parse(row, 5, "role")?,
        })
    }
}

impl Record for Order {
    const FILE: &'static str = "orders.csv";
    const HEADER: &'static [&'static str] = &["id", "username", "date", "status", "total"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.date.to_rfc3339(),
            self.status.to_string(),
            self.total.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(Order {
            id: parse(row, 0, "id")?,
            username: field(row, 1, "username")?.to_string(),
            date: timestamp(row, 2, "date")?,
            status: parse(row, 3, "status")?,
            total: money(row, 4, "total")?,
        })
    }
}

impl Record for OrderLine {
    const FILE: &'static str = "order_lines.csv";
    const HEADER: &'static [&'static str] =
        &["id", "order_id", "product_id", "quantity", "unit_price", "total"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.order_id.to_string(),
            self.product_id.to_string(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.line_total.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(OrderLine {
            id: parse(row, 0, "id")?,
            order_id: parse(row, 1, "order_id")?,
            product_id: parse(row, 2, "product_id")?,
            quantity: parse(row, 3, "quantity")?,
            unit_price: money(row, 4, "unit_price")?,
            line_total: money(row, 5, "total")?,
        })
    }
}

impl Record for AuditEntry {
    const FILE: &'static str = "audit.csv";
    const HEADER: &'static [&'static str] = &["timestamp", "username", "action", "success"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.username.clone(),
            self.action.to_string(),
            self.success.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(AuditEntry {
            timestamp: timestamp(row, 0, "timestamp")?,
            username: field(row, 1, "username")?.to_string(),
            action: parse::<AuditAction>(row, 2, "action")?,
            success: flag(row, 3, "success")?,
        })
    }
}

impl Record for IdWatermark {
    const FILE: &'static str = "id_watermarks.csv";
    const HEADER: &'static [&'static str] = &["table", "highest_removed"];

    fn to_row(&self) -> Vec<String> {
        vec![self.table.clone(), self.highest_removed.to_string()]
    }

    fn from_row(row: &StringRecord) -> Result<Self, String> {
        Ok(IdWatermark {
            table: field(row, 0, "table")?.trim().to_string(),
            highest_removed: parse(row, 1, "highest_removed")?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
