/// エクスポートファイル保存先の設定
///
/// 本番はS3、ローカル開発時は`USE_LOCAL_S3`でファイルシステムに切り替える。
///
/// 環境変数:
/// - USE_LOCAL_S3: `1` / `true` / `yes` でローカル保存（大文字小文字は区別しない）
/// - LOCAL_S3_DIR: ローカル保存先のルート
/// - LOCAL_S3_BASE_URL: ローカル保存時のダウンロードURLのベース（省略時はファイルパス）
/// - EXPORT_CSV_BUCKET: CSVの保存先バケット
/// - EXPORT_QR_BUCKET: QRコードPDFの保存先バケット
/// - LOCAL_S3_BUCKET: ローカル保存時にEXPORT_QR_BUCKETがない場合のバケット名
use std::path::{Path, PathBuf};

use thiserror::Error;

/// CSVハンドラーのローカル保存先デフォルト
pub const CSV_DEFAULT_LOCAL_DIR: &str = "/tmp/local_s3";

/// QRハンドラーのローカル保存先デフォルト
pub const QR_DEFAULT_LOCAL_DIR: &str = "/var/task/.local_s3";

/// ローカル保存時のQRバケット名デフォルト
const DEFAULT_LOCAL_BUCKET: &str = "s3-bucket";

/// 保存先設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageConfigError {
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
}

/// 保存先設定
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    use_local: bool,
    local_dir: PathBuf,
    local_base_url: Option<String>,
}

impl StorageConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 引数
    /// * `default_local_dir` - LOCAL_S3_DIR未設定時の保存先
    pub fn from_env(default_local_dir: &str) -> Self {
        let use_local = std::env::var("USE_LOCAL_S3")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        let local_dir = std::env::var("LOCAL_S3_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(default_local_dir));

        let local_base_url = std::env::var("LOCAL_S3_BASE_URL")
            .ok()
            .filter(|value| !value.is_empty());

        Self {
            use_local,
            local_dir,
            local_base_url,
        }
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(use_local: bool, local_dir: impl Into<PathBuf>, local_base_url: Option<String>) -> Self {
        Self {
            use_local,
            local_dir: local_dir.into(),
            local_base_url,
        }
    }

    pub fn use_local(&self) -> bool {
        self.use_local
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn local_base_url(&self) -> Option<&str> {
        self.local_base_url.as_deref()
    }

    /// CSVの保存先バケット（EXPORT_CSV_BUCKET必須）
    pub fn csv_bucket_from_env(&self) -> Result<String, StorageConfigError> {
        std::env::var("EXPORT_CSV_BUCKET")
            .map_err(|_| StorageConfigError::MissingEnvVar("EXPORT_CSV_BUCKET".to_string()))
    }

    /// QRコードPDFの保存先バケット
    ///
    /// EXPORT_QR_BUCKETが未設定の場合、ローカル保存時のみLOCAL_S3_BUCKETを使う。
    pub fn qr_bucket_from_env(&self) -> Result<String, StorageConfigError> {
        match std::env::var("EXPORT_QR_BUCKET") {
            Ok(bucket) if !bucket.is_empty() => Ok(bucket),
            _ if self.use_local => Ok(std::env::var("LOCAL_S3_BUCKET")
                .unwrap_or_else(|_| DEFAULT_LOCAL_BUCKET.to_string())),
            _ => Err(StorageConfigError::MissingEnvVar(
                "EXPORT_QR_BUCKET".to_string(),
            )),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
