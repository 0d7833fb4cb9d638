use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

use crate::data::column::ColumnSpec;
use crate::data::row::{display_text, Row, RowId};

/// Flat keyed record: the engine's import/export currency. The
/// encode/decode side of the boundary is a collaborator's job; the
/// engine only shapes arrays of these.
pub type Record = Map<String, Value>;

/// Project a row forest into flat export records: depth-first row
/// order, one record per row at every level, values taken through the
/// per-column parser when present.
pub fn export_records(rows: &[Row], columns: &[&ColumnSpec]) -> Vec<Record> {
    let mut records = Vec::new();
    collect_records(rows, columns, &mut records);
    records
}

fn collect_records(rows: &[Row], columns: &[&ColumnSpec], out: &mut Vec<Record>) {
    for row in rows {
        let mut record = Record::new();
        for column in columns {
            record.insert(column.data_index.clone(), column.cell_value(row));
        }
        out.push(record);
        collect_records(&row.children, columns, out);
    }
}

/// Build rows from imported flat records. Ids come from an `id` field
/// when present; records without one are numbered by position.
pub fn import_records(records: Vec<Record>) -> Vec<Row> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            let id = match record.remove("id") {
                Some(Value::Number(n)) if n.is_i64() => {
                    RowId::Int(n.as_i64().unwrap_or(index as i64))
                }
                Some(Value::String(s)) => RowId::Text(s),
                Some(other) => RowId::Text(display_text(&other)),
                None => RowId::Int(index as i64 + 1),
            };
            let mut row = Row::new(id);
            row.fields = record;
            row
        })
        .collect()
}

/// External encoder/decoder seam. Implementations own the file format;
/// the engine passes the encoded payload through untouched.
pub trait RecordCodec {
    fn encode(&self, headers: &[String], records: &[Record]) -> Result<String>;
    fn decode(&self, payload: &str) -> Result<Vec<Record>>;
}

/// Default codec over the `csv` crate. Missing fields encode as empty
/// cells; decoded values are strings (type recovery is the host's
/// concern).
#[derive(Debug, Default)]
pub struct CsvCodec;

impl RecordCodec for CsvCodec {
    fn encode(&self, headers: &[String], records: &[Record]) -> Result<String> {
        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(headers)?;
            for record in records {
                let cells: Vec<String> = headers
                    .iter()
                    .map(|h| display_text(record.get(h).unwrap_or(&Value::Null)))
                    .collect();
                writer.write_record(&cells)?;
            }
            writer.flush()?;
        }
        String::from_utf8(buffer).map_err(|e| anyhow!("exported payload is not UTF-8: {}", e))
    }

    fn decode(&self, payload: &str) -> Result<Vec<Record>> {
        let mut reader = csv::Reader::from_reader(payload.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let line = result?;
            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(line.iter()) {
                record.insert(header.clone(), Value::String(cell.to_string()));
            }
            records.push(record);
        }
        Ok(records)
    }
}
