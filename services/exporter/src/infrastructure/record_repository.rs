/// エクスポート対象レコードとexported_filesを扱うリポジトリ
///
/// 本番はPostgreSQL（tokio-postgres）、テストはモック実装を使う。
use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::{debug, warn};

use super::export_queries::ExportQuery;
use super::postgres_config::PostgresConfig;
use crate::domain::ExportRow;

/// アップロード完了を表すexported_files.upload_status
pub const UPLOAD_STATUS_UPLOADED: i32 = 2;

const MARK_EXPORTED_SQL: &str = "UPDATE exported_files \
     SET s3_url = $1::text, upload_status = $2::integer, updated_at = NOW() \
     WHERE id = $3::bigint";

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// データベースへの接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// クエリの実行に失敗
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// 取得結果の変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// エクスポート用データアクセスのトレイト
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// クエリを実行し、各行をカラム順を保ったマップとして取得
    async fn fetch_rows(&self, query: &ExportQuery) -> Result<Vec<ExportRow>, RepositoryError>;

    /// クエリを実行し、1列目をIDとして取得
    async fn fetch_ids(&self, query: &ExportQuery) -> Result<Vec<i64>, RepositoryError>;

    /// exported_filesにダウンロードURLを記録し、アップロード完了状態にする
    async fn mark_exported(
        &self,
        exported_file_id: i64,
        download_url: &str,
    ) -> Result<(), RepositoryError>;
}

/// 任意のSELECTを1行1JSONに変換するラッパー
///
/// カラムの型に依存せず値をJSONとして受け取り、カラム順も保持される。
fn row_to_json_sql(sql: &str) -> String {
    format!("SELECT row_to_json(t)::text AS row FROM ({}) t", sql)
}

/// RecordRepositoryのPostgreSQL実装
///
/// 操作ごとに接続を張り、完了後に破棄する。
#[derive(Debug, Clone)]
pub struct PostgresRecordRepository {
    config: PostgresConfig,
}

impl PostgresRecordRepository {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<tokio_postgres::Client, RepositoryError> {
        let (client, connection) = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        // 接続の駆動はクライアントが破棄されるまで別タスクで行う
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                warn!(error = %err, "PostgreSQL接続エラー");
            }
        });

        Ok(client)
    }

    async fn query(
        &self,
        sql: &str,
        record_ids: Option<&[i64]>,
    ) -> Result<Vec<tokio_postgres::Row>, RepositoryError> {
        let client = self.connect().await?;

        debug!(sql = %sql, id_count = ?record_ids.map(<[i64]>::len), "クエリ実行");

        let result = match record_ids {
            Some(ids) => {
                let ids: Vec<i64> = ids.to_vec();
                client.query(sql, &[&ids]).await
            }
            None => client.query(sql, &[]).await,
        };

        result.map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl RecordRepository for PostgresRecordRepository {
    async fn fetch_rows(&self, query: &ExportQuery) -> Result<Vec<ExportRow>, RepositoryError> {
        let sql = row_to_json_sql(query.sql());
        let rows = self.query(&sql, query.record_ids()).await?;

        rows.iter()
            .map(|row| {
                let text: String = row
                    .try_get(0)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
                serde_json::from_str::<ExportRow>(&text)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))
            })
            .collect()
    }

    async fn fetch_ids(&self, query: &ExportQuery) -> Result<Vec<i64>, RepositoryError> {
        let rows = self.query(query.sql(), query.record_ids()).await?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, i64>(0)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))
            })
            .collect()
    }

    async fn mark_exported(
        &self,
        exported_file_id: i64,
        download_url: &str,
    ) -> Result<(), RepositoryError> {
        let client = self.connect().await?;

        let updated = client
            .execute(
                MARK_EXPORTED_SQL,
                &[&download_url, &UPLOAD_STATUS_UPLOADED, &exported_file_id],
            )
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if updated == 0 {
            warn!(
                exported_file_id = exported_file_id,
                "exported_filesに対象レコードが存在しない"
            );
        }

        Ok(())
    }
}
