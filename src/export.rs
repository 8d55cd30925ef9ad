//! CSV export of the inventory transaction ledger.

use std::path::Path;

use serde::Serialize;

use crate::error::ClientError;
use crate::models::InventoryTransaction;

/// Suggested download name.
pub const EXPORT_FILE_NAME: &str = "inventory-transactions.csv";

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Item Name")]
    item_name: &'a str,
    #[serde(rename = "Type")]
    kind: &'a str,
    #[serde(rename = "Adjust")]
    adjust: i64,
    #[serde(rename = "Reason")]
    reason: &'a str,
    #[serde(rename = "Created At")]
    created_at: String,
}

impl<'a> From<&'a InventoryTransaction> for CsvRow<'a> {
    fn from(tx: &'a InventoryTransaction) -> Self {
        Self {
            id: &tx.id,
            item_name: &tx.inventory_item.name,
            kind: tx.kind.as_str(),
            adjust: tx.quantity,
            reason: tx.reason.as_deref().unwrap_or_default(),
            created_at: tx.created_at.format(CREATED_AT_FORMAT).to_string(),
        }
    }
}

fn write_rows<W: std::io::Write>(
    writer: W,
    rows: &[InventoryTransaction],
) -> Result<W, ClientError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    if rows.is_empty() {
        // serialize() only emits the header alongside the first record
        wtr.write_record(["ID", "Item Name", "Type", "Adjust", "Reason", "Created At"])
            .map_err(export_error)?;
    }
    for tx in rows {
        wtr.serialize(CsvRow::from(tx)).map_err(export_error)?;
    }
    wtr.into_inner()
        .map_err(|e| ClientError::Export(e.error().to_string()))
}

fn export_error(e: csv::Error) -> ClientError {
    ClientError::Export(e.to_string())
}

/// Ledger rows as CSV text: one header line, then one line per row.
pub fn transactions_csv(rows: &[InventoryTransaction]) -> Result<String, ClientError> {
    let bytes = write_rows(Vec::new(), rows)?;
    String::from_utf8(bytes).map_err(|e| ClientError::Export(e.to_string()))
}

/// Write the CSV to `path`, replacing any existing file.
pub fn write_transactions_csv(
    rows: &[InventoryTransaction],
    path: &Path,
) -> Result<(), ClientError> {
    let file = std::fs::File::create(path).map_err(|e| ClientError::Export(e.to_string()))?;
    write_rows(file, rows)?;
    tracing::info!(rows = rows.len(), path = %path.display(), "Exported inventory transactions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(
        id: &str,
        kind: &str,
        qty: i64,
        reason: Option<&str>,
        name: &str,
    ) -> InventoryTransaction {
        serde_json::from_value(json!({
            "id": id, "type": kind, "quantity": qty, "reason": reason,
            "createdAt": "2025-11-16T08:05:00Z",
            "inventoryItem": {"id": "i1", "name": name}
        }))
        .unwrap()
    }

    #[test]
    fn three_rows_give_header_plus_three_lines() {
        let rows = vec![
            tx("t1", "in", 40, Some("delivery"), "Saline 0.9%"),
            tx("t2", "out", 4, None, "Saline 0.9%"),
            tx("t3", "adjust", -1, Some("broken vial"), "Insulin"),
        ];
        let csv = transactions_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "ID,Item Name,Type,Adjust,Reason,Created At");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "t1,Saline 0.9%,in,40,delivery,2025-11-16 08:05");
        assert_eq!(lines[2], "t2,Saline 0.9%,out,4,,2025-11-16 08:05");
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        let rows = vec![tx("t9", "out", 2, Some("ward 3, \"urgent\""), "Gauze, sterile")];
        let csv = transactions_csv(&rows).unwrap();
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(
            line,
            r#"t9,"Gauze, sterile",out,2,"ward 3, ""urgent""",2025-11-16 08:05"#
        );
    }

    #[test]
    fn empty_ledger_is_header_only() {
        let csv = transactions_csv(&[]).unwrap();
        assert_eq!(csv, "ID,Item Name,Type,Adjust,Reason,Created At\n");
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        write_transactions_csv(&[tx("t1", "in", 1, None, "Gloves")], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
