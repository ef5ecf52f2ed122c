/// エクスポート結果
///
/// SQSレコードごとの処理結果と、Lambdaの戻り値となるレスポンスを表す。
/// レスポンスは常にstatusCode 200で、bodyに`{"results": [...]}`のJSON文字列を持つ。
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use thiserror::Error;

/// レコード単位のエクスポート失敗
///
/// 表示文字列がそのまま結果の`error`フィールドになる。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    /// メッセージ不正（パース失敗、対象なし、必須環境変数なし）
    #[error("invalid_message: {0}")]
    InvalidMessage(String),
    /// データベース操作の失敗
    #[error("database_error: {0}")]
    Database(String),
    /// それ以外の失敗（アップロード、レンダリングなど）
    #[error("unexpected_error: {0}")]
    Unexpected(String),
}

/// 処理件数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCount {
    Count(usize),
    /// 全件指定（QRエクスポートで`is_all_record`がtrueの場合）
    All,
}

impl Serialize for RecordCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordCount::Count(count) => serializer.serialize_u64(*count as u64),
            RecordCount::All => serializer.serialize_str("all"),
        }
    }
}

/// 結果に含める対象情報（file_type/tableとexported_file_id）
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSubject {
    pub name: String,
    pub exported_file_id: i64,
}

impl ExportSubject {
    pub fn new(name: impl Into<String>, exported_file_id: i64) -> Self {
        Self {
            name: name.into(),
            exported_file_id,
        }
    }
}

/// SQSレコード1件分の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum ExportResult {
    /// アップロードとexported_files更新まで完了
    Exported {
        subject: ExportSubject,
        record_count: RecordCount,
        s3_url: String,
    },
    /// 対象レコードが0件（CSVのみ）
    NoRecords { subject: ExportSubject },
    /// 失敗（メッセージ不正の場合subjectはNone）
    Failed {
        subject: Option<ExportSubject>,
        error: ExportError,
    },
}

impl ExportResult {
    /// 失敗結果を作成
    ///
    /// メッセージ不正の場合は対象情報を含めない。
    pub fn failed(subject: Option<ExportSubject>, error: ExportError) -> Self {
        let subject = match error {
            ExportError::InvalidMessage(_) => None,
            _ => subject,
        };
        ExportResult::Failed { subject, error }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExportResult::Failed { .. })
    }

    /// 結果をJSONに変換
    ///
    /// # 引数
    /// * `subject_key` - 対象名のキー（CSVは`file_type`、QRは`table`）
    pub fn to_json(&self, subject_key: &str) -> Value {
        let mut object = serde_json::Map::new();

        match self {
            ExportResult::Exported {
                subject,
                record_count,
                s3_url,
            } => {
                object.insert(subject_key.to_string(), json!(subject.name));
                object.insert("exported_file_id".to_string(), json!(subject.exported_file_id));
                object.insert("record_count".to_string(), json!(record_count));
                object.insert("s3_url".to_string(), json!(s3_url));
            }
            ExportResult::NoRecords { subject } => {
                object.insert(subject_key.to_string(), json!(subject.name));
                object.insert("exported_file_id".to_string(), json!(subject.exported_file_id));
                object.insert("record_count".to_string(), json!(0));
                object.insert("s3_url".to_string(), Value::Null);
                object.insert("message".to_string(), json!("no_records"));
            }
            ExportResult::Failed { subject, error } => {
                object.insert(
                    subject_key.to_string(),
                    subject.as_ref().map_or(Value::Null, |s| json!(s.name)),
                );
                object.insert(
                    "exported_file_id".to_string(),
                    subject
                        .as_ref()
                        .map_or(Value::Null, |s| json!(s.exported_file_id)),
                );
                object.insert("error".to_string(), json!(error.to_string()));
            }
        }

        Value::Object(object)
    }
}

/// Lambdaレスポンス（SQSバッチ全体の結果）
#[derive(Debug, Clone)]
pub struct ExportResponse {
    subject_key: &'static str,
    results: Vec<ExportResult>,
}

impl ExportResponse {
    /// CSVエクスポート用のレスポンスを作成
    pub fn csv() -> Self {
        Self {
            subject_key: "file_type",
            results: Vec::new(),
        }
    }

    /// QRエクスポート用のレスポンスを作成
    pub fn qr() -> Self {
        Self {
            subject_key: "table",
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ExportResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ExportResult] {
        &self.results
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// `{"results": [...]}`形式のbodyを作成
    pub fn body(&self) -> Value {
        let results: Vec<Value> = self
            .results
            .iter()
            .map(|r| r.to_json(self.subject_key))
            .collect();
        json!({ "results": results })
    }

    /// Lambdaの戻り値に変換（bodyはJSON文字列）
    pub fn into_lambda_response(self) -> Value {
        json!({
            "statusCode": 200,
            "body": self.body().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> ExportSubject {
        ExportSubject::new("users", 42)
    }

    #[test]
    fn test_export_error_display() {
        assert_eq!(
            ExportError::InvalidMessage("x".to_string()).to_string(),
            "invalid_message: x"
        );
        assert_eq!(
            ExportError::Database("timeout".to_string()).to_string(),
            "database_error: timeout"
        );
        assert_eq!(
            ExportError::Unexpected("boom".to_string()).to_string(),
            "unexpected_error: boom"
        );
    }

    #[test]
    fn test_exported_to_json() {
        let result = ExportResult::Exported {
            subject: subject(),
            record_count: RecordCount::Count(3),
            s3_url: "https://example.com/a.csv".to_string(),
        };

        assert_eq!(
            result.to_json("file_type"),
            json!({
                "file_type": "users",
                "exported_file_id": 42,
                "record_count": 3,
                "s3_url": "https://example.com/a.csv"
            })
        );
    }

    #[test]
    fn test_record_count_all_serializes_as_string() {
        let result = ExportResult::Exported {
            subject: subject(),
            record_count: RecordCount::All,
            s3_url: "u".to_string(),
        };

        assert_eq!(result.to_json("table")["record_count"], json!("all"));
        assert_eq!(result.to_json("table")["table"], json!("users"));
    }

    #[test]
    fn test_no_records_to_json() {
        let result = ExportResult::NoRecords { subject: subject() };

        assert_eq!(
            result.to_json("file_type"),
            json!({
                "file_type": "users",
                "exported_file_id": 42,
                "record_count": 0,
                "s3_url": null,
                "message": "no_records"
            })
        );
    }

    #[test]
    fn test_invalid_message_drops_subject() {
        let result = ExportResult::failed(
            Some(subject()),
            ExportError::InvalidMessage("bad".to_string()),
        );

        assert_eq!(
            result.to_json("file_type"),
            json!({
                "file_type": null,
                "exported_file_id": null,
                "error": "invalid_message: bad"
            })
        );
    }

    #[test]
    fn test_database_error_keeps_subject() {
        let result = ExportResult::failed(Some(subject()), ExportError::Database("down".to_string()));

        let value = result.to_json("table");
        assert_eq!(value["table"], json!("users"));
        assert_eq!(value["exported_file_id"], json!(42));
        assert_eq!(value["error"], json!("database_error: down"));
    }

    #[test]
    fn test_response_body_is_json_string() {
        let mut response = ExportResponse::csv();
        response.push(ExportResult::NoRecords { subject: subject() });
        response.push(ExportResult::failed(None, ExportError::Unexpected("x".to_string())));

        assert_eq!(response.failure_count(), 1);

        let lambda_response = response.into_lambda_response();
        assert_eq!(lambda_response["statusCode"], json!(200));

        let body: Value = serde_json::from_str(lambda_response["body"].as_str().unwrap()).unwrap();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["message"], json!("no_records"));
        assert_eq!(results[1]["error"], json!("unexpected_error: x"));
    }

    #[test]
    fn test_empty_response() {
        let response = ExportResponse::qr();
        assert_eq!(response.body(), json!({ "results": [] }));
    }
}
