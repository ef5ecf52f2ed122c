/// CSVエクスポートハンドラー
///
/// SQSメッセージごとに対象レコードを取得してCSVを生成し、S3に配置して
/// exported_filesを更新する。1件の失敗はバッチ全体を止めず、その件の結果になる。
use std::time::Duration;

use aws_lambda_events::event::sqs::SqsEvent;
use chrono::Utc;
use tracing::{Instrument, info, warn};

use crate::domain::{
    CsvExportRequest, ExportError, ExportResponse, ExportResult, ExportSubject, RecordCount,
    TableExportConfig, csv_object_key, render_csv,
};
use crate::infrastructure::{
    ObjectStorage, RecordRepository, RepositoryError, StorageError, build_query, message_span,
};

/// ダウンロードURLの有効期間（7日）
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

pub(crate) fn database_error(err: RepositoryError) -> ExportError {
    ExportError::Database(err.to_string())
}

pub(crate) fn storage_error(err: StorageError) -> ExportError {
    ExportError::Unexpected(err.to_string())
}

/// CSVエクスポートを処理するハンドラー
pub struct CsvExportHandler<R, S>
where
    R: RecordRepository,
    S: ObjectStorage,
{
    repository: R,
    storage: S,
    /// アップロード先バケット
    bucket: String,
}

impl<R, S> CsvExportHandler<R, S>
where
    R: RecordRepository,
    S: ObjectStorage,
{
    pub fn new(repository: R, storage: S, bucket: impl Into<String>) -> Self {
        Self {
            repository,
            storage,
            bucket: bucket.into(),
        }
    }

    /// SQSイベントの全レコードを順に処理
    pub async fn handle(&self, event: &SqsEvent) -> ExportResponse {
        let mut response = ExportResponse::csv();

        for record in &event.records {
            let result = self
                .process_message(record.body.as_deref())
                .instrument(message_span("csv_export", record.message_id.as_deref()))
                .await;
            response.push(result);
        }

        info!(
            record_count = response.results().len(),
            failure_count = response.failure_count(),
            "CSVエクスポート処理完了"
        );

        response
    }

    async fn process_message(&self, body: Option<&str>) -> ExportResult {
        let request = match CsvExportRequest::parse(body) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "不正なメッセージ");
                return ExportResult::failed(None, ExportError::InvalidMessage(err.to_string()));
            }
        };

        let subject = ExportSubject::new(
            request.file_type.clone(),
            request.exported_file_id.value(),
        );

        match self.export(&request, &subject).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    file_type = %subject.name,
                    exported_file_id = subject.exported_file_id,
                    error = %err,
                    "CSVエクスポート失敗"
                );
                ExportResult::failed(Some(subject), err)
            }
        }
    }

    /// # 処理フロー
    /// 1. テーブルと選択条件からクエリを組み立てて行を取得
    /// 2. CSVを生成（0件なら no_records）
    /// 3. S3にアップロードしてダウンロードURLを発行
    /// 4. exported_filesを更新
    async fn export(
        &self,
        request: &CsvExportRequest,
        subject: &ExportSubject,
    ) -> Result<ExportResult, ExportError> {
        let rows = match build_query(&request.table, &request.selection) {
            Some(query) => self
                .repository
                .fetch_rows(&query)
                .await
                .map_err(database_error)?,
            None => Vec::new(),
        };

        let csv = render_csv(TableExportConfig::for_table(request.table.as_str()), &rows)
            .map_err(|e| ExportError::Unexpected(e.to_string()))?;

        if csv.is_empty() {
            info!(file_type = %subject.name, "エクスポート対象レコードなし");
            return Ok(ExportResult::NoRecords {
                subject: subject.clone(),
            });
        }

        let key = csv_object_key(&request.file_type, subject.exported_file_id, Utc::now());

        self.storage
            .put_object(&self.bucket, &key, csv.into_bytes(), CSV_CONTENT_TYPE)
            .await
            .map_err(storage_error)?;

        let download_url = self
            .storage
            .download_url(&self.bucket, &key, DOWNLOAD_URL_TTL)
            .await
            .map_err(storage_error)?;

        self.repository
            .mark_exported(subject.exported_file_id, &download_url)
            .await
            .map_err(database_error)?;

        info!(
            file_type = %subject.name,
            exported_file_id = subject.exported_file_id,
            row_count = rows.len(),
            key = %key,
            "CSVエクスポート完了"
        );

        Ok(ExportResult::Exported {
            subject: subject.clone(),
            record_count: RecordCount::Count(rows.len()),
            s3_url: download_url,
        })
    }
}
