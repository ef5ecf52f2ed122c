/// CSVドキュメント生成
///
/// 取得した行（カラム名→値）をCSV文字列に変換する。
/// ヘッダー行はTableExportConfigのラベル、行区切りはCRLF。
use serde_json::Value;
use thiserror::Error;

use super::table_export_config::TableExportConfig;

/// 取得結果の1行（カラム順を保持したマップ）
pub type ExportRow = serde_json::Map<String, Value>;

/// CSV生成のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CsvRenderError {
    #[error("CSV書き込みエラー: {0}")]
    Write(String),
}

impl From<csv::Error> for CsvRenderError {
    fn from(err: csv::Error) -> Self {
        CsvRenderError::Write(err.to_string())
    }
}

/// 行データをCSV文字列に変換する
///
/// - 行が0件の場合は空文字列を返す
/// - field_orderが設定されている場合はその順序のカラムのみを出力する
/// - 設定がない場合は1行目のカラムを出力し、以降の行の余分なカラムは無視する
pub fn render_csv(
    config: Option<&TableExportConfig>,
    rows: &[ExportRow],
) -> Result<String, CsvRenderError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };

    let fields: Vec<&str> = match config {
        Some(config) if !config.field_order().is_empty() => config.field_order().to_vec(),
        _ => first.keys().map(String::as_str).collect(),
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    let header: Vec<&str> = fields
        .iter()
        .map(|field| config.map_or(*field, |c| c.label(field)))
        .collect();
    writer.write_record(&header)?;

    for row in rows {
        let record: Vec<String> = fields
            .iter()
            .map(|field| row.get(*field).map(cell_text).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvRenderError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CsvRenderError::Write(e.to_string()))
}

/// JSON値をCSVセルの文字列に変換
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> ExportRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn test_empty_rows_render_empty_string() {
        let config = TableExportConfig::for_table("users");
        assert_eq!(render_csv(config, &[]).unwrap(), "");
    }

    #[test]
    fn test_field_order_and_labels() {
        let config = TableExportConfig::for_table("manufacturers");
        let rows = vec![row(json!({
            "id": 1,
            "updated_at": "2025-01-01T09:00:00",
            "name": "ACME",
            "code": "M001",
            "status": "有効"
        }))];

        let csv = render_csv(config, &rows).unwrap();

        assert_eq!(
            csv,
            "メーカー名,コード,ステータス,更新日時\r\nACME,M001,有効,2025-01-01T09:00:00\r\n"
        );
    }

    #[test]
    fn test_missing_configured_field_renders_empty() {
        let config = TableExportConfig::for_table("manufacturers");
        let rows = vec![row(json!({"name": "ACME", "status": null}))];

        let csv = render_csv(config, &rows).unwrap();

        assert_eq!(csv.lines().nth(1).unwrap(), "ACME,,,");
    }

    #[test]
    fn test_without_config_uses_first_row_columns() {
        let rows = vec![
            row(json!({"id": 1, "label": "a", "active": true})),
            row(json!({"id": 2, "extra": "ignored", "active": false})),
        ];

        let csv = render_csv(None, &rows).unwrap();

        assert_eq!(csv, "id,label,active\r\n1,a,true\r\n2,,false\r\n");
    }

    #[test]
    fn test_values_needing_quotes() {
        let rows = vec![row(json!({"name": "a,b", "note": "say \"hi\"", "roles": "admin, editor"}))];

        let csv = render_csv(None, &rows).unwrap();

        assert_eq!(
            csv.lines().nth(1).unwrap(),
            r#""a,b","say ""hi""","admin, editor""#
        );
    }

    #[test]
    fn test_nested_values_render_as_json() {
        let rows = vec![row(json!({"meta": {"k": 1}, "tags": [1, 2]}))];

        let csv = render_csv(None, &rows).unwrap();

        assert!(csv.contains(r#""{""k"":1}""#));
        assert!(csv.contains(r#""[1,2]""#));
    }

    #[test]
    fn test_decimal_values() {
        let rows = vec![row(json!({"price": 12.5, "qty": -3}))];

        let csv = render_csv(None, &rows).unwrap();

        assert_eq!(csv.lines().nth(1).unwrap(), "12.5,-3");
    }
}
