/// エクスポート要求メッセージ
///
/// SQSメッセージ本文（JSON）をCSV/QRエクスポート要求にパースする。
///
/// CSV:
/// ```json
/// {"file_type": "users", "record_ids": [1, 2, 3], "is_all_record": false, "exported_file_id": 42}
/// ```
///
/// QR（`table`の代わりに`file_type`も受け付ける）:
/// ```json
/// {"table": "users", "record_ids": [1, 2, 3], "is_all_record": false, "exported_file_id": 42}
/// ```
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;

use super::table_name::{TableName, TableNameError};

/// メッセージパースのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MessageError {
    /// SQSレコードに本文がない
    #[error("メッセージ本文がありません")]
    MissingBody,
    /// JSONとして不正、または必須フィールドの欠落
    #[error("メッセージのJSONが不正です: {0}")]
    InvalidJson(String),
    /// テーブル名が不正
    #[error(transparent)]
    InvalidTable(#[from] TableNameError),
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        MessageError::InvalidJson(err.to_string())
    }
}

/// exported_filesテーブルのレコードID
///
/// 数値と数字文字列（例: `"42"`）のどちらでも受け付ける。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExportedFileId(i64);

impl ExportedFileId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for ExportedFileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Ok(Self(id)),
            RawId::Text(text) => text.trim().parse::<i64>().map(Self).map_err(|_| {
                de::Error::custom(format!("exported_file_idが整数ではありません: {}", text))
            }),
        }
    }
}

/// 取得対象レコードの指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelection {
    /// テーブル全件
    All,
    /// ID指定（空の場合は何も選択しない）
    Ids(Vec<i64>),
}

impl RecordSelection {
    /// `record_ids`と`is_all_record`から選択条件を作成
    ///
    /// `is_all_record`がtrueの場合はID指定を無視する。
    pub fn new(record_ids: Vec<i64>, is_all_record: bool) -> Self {
        if is_all_record {
            RecordSelection::All
        } else {
            RecordSelection::Ids(record_ids)
        }
    }

    /// 1件も選択しない条件かどうか
    pub fn selects_nothing(&self) -> bool {
        matches!(self, RecordSelection::Ids(ids) if ids.is_empty())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RecordSelection::All)
    }
}

#[derive(Debug, Deserialize)]
struct RawCsvMessage {
    file_type: String,
    #[serde(default)]
    record_ids: Option<Vec<i64>>,
    #[serde(default)]
    is_all_record: Option<bool>,
    exported_file_id: ExportedFileId,
}

#[derive(Debug, Deserialize)]
struct RawQrMessage {
    #[serde(alias = "file_type")]
    table: String,
    #[serde(default)]
    record_ids: Option<Vec<i64>>,
    #[serde(default)]
    is_all_record: Option<bool>,
    exported_file_id: ExportedFileId,
}

/// CSVエクスポート要求
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExportRequest {
    /// メッセージに含まれていたfile_type（前後の空白を除き、大文字小文字を保持）
    pub file_type: String,
    /// 小文字化・検証済みのテーブル名
    pub table: TableName,
    /// 要求されたレコードID（is_all_record時も元の値を保持）
    pub record_ids: Vec<i64>,
    pub selection: RecordSelection,
    pub exported_file_id: ExportedFileId,
}

impl CsvExportRequest {
    /// SQSメッセージ本文をパース
    pub fn parse(body: Option<&str>) -> Result<Self, MessageError> {
        let body = body.ok_or(MessageError::MissingBody)?;
        let raw: RawCsvMessage = serde_json::from_str(body)?;

        let table = TableName::parse(&raw.file_type)?;
        let record_ids = raw.record_ids.unwrap_or_default();
        let selection = RecordSelection::new(record_ids.clone(), raw.is_all_record.unwrap_or(false));

        Ok(Self {
            file_type: raw.file_type.trim().to_string(),
            table,
            record_ids,
            selection,
            exported_file_id: raw.exported_file_id,
        })
    }
}

/// QRコードPDFエクスポート要求
#[derive(Debug, Clone, PartialEq)]
pub struct QrExportRequest {
    pub table: TableName,
    pub record_ids: Vec<i64>,
    pub selection: RecordSelection,
    pub exported_file_id: ExportedFileId,
}

impl QrExportRequest {
    /// SQSメッセージ本文をパース
    pub fn parse(body: Option<&str>) -> Result<Self, MessageError> {
        let body = body.ok_or(MessageError::MissingBody)?;
        let raw: RawQrMessage = serde_json::from_str(body)?;

        let table = TableName::parse(&raw.table)?;
        let record_ids = raw.record_ids.unwrap_or_default();
        let selection = RecordSelection::new(record_ids.clone(), raw.is_all_record.unwrap_or(false));

        Ok(Self {
            table,
            record_ids,
            selection,
            exported_file_id: raw.exported_file_id,
        })
    }
}
