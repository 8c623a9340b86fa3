use std::collections::BTreeMap;

use super::IngestError;
use crate::models::{Dataset, FieldValue, Record};

/// UTF-8 byte-order mark written ahead of every encoded export.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// One decoded export plus the rows rejected during ingestion.
#[derive(Debug, Clone, Default)]
pub struct DecodedSource {
    pub dataset: Dataset,
    /// Rows dropped because they had no `id`.
    pub skipped: usize,
}

/// Decode a CSV export with a header row into records.
///
/// Empty cells become absent fields. Rows without an `id` are skipped with a
/// warning instead of failing the whole file.
pub fn decode_csv(source_key: &str, text: &str) -> Result<DecodedSource, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let csv_err = |error: csv::Error| IngestError::Csv {
        source_key: source_key.to_string(),
        error,
    };

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    let mut skipped = 0;

    for (row, result) in reader.records().enumerate() {
        let row_data = result.map_err(csv_err)?;
        let fields: BTreeMap<String, FieldValue> = columns
            .iter()
            .zip(row_data.iter())
            .filter(|(name, _)| !name.is_empty())
            .filter_map(|(name, cell)| FieldValue::parse_cell(cell).map(|v| (name.clone(), v)))
            .collect();

        match Record::new(fields) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!(source_key, row = row + 2, error = %e, "Skipping row");
            }
        }
    }

    Ok(DecodedSource {
        dataset: Dataset::new(
            columns.into_iter().filter(|c| !c.is_empty()).collect(),
            records,
        ),
        skipped,
    })
}

/// Encode a dataset as CSV: BOM, header row, `,` delimiter, `"` quoting.
///
/// Column order follows `dataset.columns`; fields missing from a record are
/// written as empty cells.
pub fn encode_csv(dataset: &Dataset) -> Result<Vec<u8>, IngestError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(&dataset.columns)?;
    for record in &dataset.records {
        let row: Vec<String> = dataset
            .columns
            .iter()
            .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| IngestError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_typed_cells() {
        let text = "id,title,salary\n1,Аналитик,150000\n2,\"Разработчик, senior\",\n";
        let decoded = decode_csv("vacancies/a.csv", text).unwrap();
        assert_eq!(decoded.dataset.columns, vec!["id", "title", "salary"]);
        assert_eq!(decoded.dataset.len(), 2);
        let second = &decoded.dataset.records[1];
        assert_eq!(second.text("title").as_deref(), Some("Разработчик, senior"));
        assert!(second.get("salary").is_none());
        assert_eq!(
            decoded.dataset.records[0].get("salary"),
            Some(&FieldValue::Text("150000".into()))
        );
    }

    #[test]
    fn untouched_cells_are_written_back_verbatim() {
        let text = "id,salary,code,phone\n007,150000.0,01234,+79991234567\n";
        let decoded = decode_csv("vacancies/a.csv", text).unwrap();
        let bytes = encode_csv(&decoded.dataset).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
        assert_eq!(std::str::from_utf8(&bytes[3..]).unwrap(), text);
        assert_eq!(decoded.dataset.records[0].id(), "007");
    }

    #[test]
    fn skips_rows_without_id() {
        let text = "id,title\n,Без id\n5,Есть id\n";
        let decoded = decode_csv("vacancies/a.csv", text).unwrap();
        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.dataset.records[0].id(), "5");
    }

    #[test]
    fn tolerates_bom_and_short_rows() {
        let text = "\u{feff}id,title,city\n1,QA\n";
        let decoded = decode_csv("vacancies/a.csv", text).unwrap();
        assert_eq!(decoded.dataset.columns[0], "id");
        assert_eq!(decoded.dataset.records[0].text("title").as_deref(), Some("QA"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let decoded = decode_csv("vacancies/a.csv", "id,title\n").unwrap();
        assert!(decoded.dataset.is_empty());
    }

    #[test]
    fn encode_writes_bom_header_and_quotes() {
        let record = Record::from_json(json!({"id": 1, "title": "Аналитик, BI"})).unwrap();
        let dataset = Dataset::new(
            vec!["id".into(), "title".into(), "city".into()],
            vec![record],
        );
        let bytes = encode_csv(&dataset).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text, "id,title,city\n1,\"Аналитик, BI\",\n");
    }

    #[test]
    fn encoded_output_decodes_back() {
        let text = "id,title\n1,\"Say \"\"hi\"\"\"\n";
        let decoded = decode_csv("k", text).unwrap();
        let bytes = encode_csv(&decoded.dataset).unwrap();
        let again = decode_csv("k", std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(again.dataset, decoded.dataset);
    }
}
