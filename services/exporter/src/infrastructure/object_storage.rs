//! エクスポートファイルの保存先
//!
//! - S3ObjectStorage: S3へのアップロードと署名付きURLの発行
//! - LocalObjectStorage: ローカル開発用。`{root}/{bucket}/{key}` に書き込む
//! - ExportStorage: StorageConfigに従って上記のどちらかを使う

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::{info, warn};

use super::storage_config::StorageConfig;

/// 保存操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// アップロード（書き込み）に失敗
    #[error("アップロードに失敗しました: {0}")]
    UploadFailed(String),
    /// ダウンロードURLの生成に失敗
    #[error("ダウンロードURLの生成に失敗しました: {0}")]
    PresignFailed(String),
}

/// ファイル保存操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// オブジェクトを保存する
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// 保存したオブジェクトのダウンロードURLを生成する
    ///
    /// # 引数
    /// * `expires_in` - URLの有効期間（S3の署名付きURLのみ有効）
    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}

/// AWS S3 SDKを使用した保存先
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: S3Client,
}

impl S3ObjectStorage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(S3Client::new(&config))
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                warn!(bucket = %bucket, key = %key, error = %DisplayErrorContext(&e), "S3 PutObjectエラー");
                StorageError::UploadFailed(DisplayErrorContext(&e).to_string())
            })?;

        info!(bucket = %bucket, key = %key, size = size, "S3アップロード完了");
        Ok(())
    }

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::PresignFailed(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// ローカルファイルシステムを使用した保存先
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    base_url: Option<String>,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let destination = self.object_path(bucket, key);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::UploadFailed(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&destination, body)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", destination.display(), e)))?;

        info!(path = %destination.display(), "ローカル保存完了");
        Ok(())
    }

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        if let Some(base_url) = &self.base_url {
            return Ok(format!(
                "{}/{}/{}",
                base_url.trim_end_matches('/'),
                bucket,
                key
            ));
        }

        std::path::absolute(self.object_path(bucket, key))
            .map(|path| path.display().to_string())
            .map_err(|e| StorageError::PresignFailed(e.to_string()))
    }
}

/// 設定に応じてS3またはローカルに保存する
#[derive(Debug, Clone)]
pub enum ExportStorage {
    S3(S3ObjectStorage),
    Local(LocalObjectStorage),
}

impl ExportStorage {
    pub async fn from_config(config: &StorageConfig) -> Self {
        if config.use_local() {
            info!(local_dir = %config.local_dir().display(), "ローカル保存モード");
            ExportStorage::Local(LocalObjectStorage::new(
                config.local_dir(),
                config.local_base_url().map(str::to_string),
            ))
        } else {
            ExportStorage::S3(S3ObjectStorage::from_config().await)
        }
    }
}

#[async_trait]
impl ObjectStorage for ExportStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        match self {
            ExportStorage::S3(storage) => storage.put_object(bucket, key, body, content_type).await,
            ExportStorage::Local(storage) => storage.put_object(bucket, key, body, content_type).await,
        }
    }

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        match self {
            ExportStorage::S3(storage) => storage.download_url(bucket, key, expires_in).await,
            ExportStorage::Local(storage) => storage.download_url(bucket, key, expires_in).await,
        }
    }
}
