/// S3オブジェクトキーとQRコードURLの組み立て
use chrono::{DateTime, Utc};

/// キーに埋め込むタイムスタンプの形式（例: 20250101T090000Z）
const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// CSVのS3キーを生成
///
/// 例: `csv_exports/users/42-20250101T090000Z.csv`
pub fn csv_object_key(file_type: &str, exported_file_id: i64, now: DateTime<Utc>) -> String {
    format!(
        "csv_exports/{}/{}-{}.csv",
        file_type,
        exported_file_id,
        now.format(KEY_TIMESTAMP_FORMAT)
    )
}

/// QRコードPDFのS3キーを生成
///
/// 例: `qr_exports/users/42-20250101T090000Z.pdf`
pub fn qr_object_key(table: &str, exported_file_id: i64, now: DateTime<Utc>) -> String {
    format!(
        "qr_exports/{}/{}-{}.pdf",
        table,
        exported_file_id,
        now.format(KEY_TIMESTAMP_FORMAT)
    )
}

/// QRコードに埋め込むURLを生成
///
/// 例: `https://example.com/quick_access/123`
pub fn quick_access_url(front_domain: &str, record_id: i64) -> String {
    format!(
        "{}/quick_access/{}",
        front_domain.trim_end_matches('/'),
        record_id
    )
}

/// QRコードの下に表示するラベル（URLのパス部分）
pub fn quick_access_label(record_id: i64) -> String {
    format!("/quick_access/{}", record_id)
}
