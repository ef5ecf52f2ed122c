/// QRコードPDFエクスポートハンドラー
///
/// 対象レコードのIDごとにクイックアクセスURLのQRコードを作成し、A4のPDFに並べて
/// S3に配置し、exported_filesを更新する。
use aws_lambda_events::event::sqs::SqsEvent;
use chrono::Utc;
use tracing::{Instrument, info, warn};

use super::csv_export_handler::{DOWNLOAD_URL_TTL, database_error, storage_error};
use crate::domain::{
    ExportError, ExportResponse, ExportResult, ExportSubject, QrExportRequest, RecordCount,
    qr_object_key, quick_access_label, quick_access_url,
};
use crate::infrastructure::{
    ObjectStorage, QrPdfRenderer, QrSheetItem, RecordRepository, build_id_query, message_span,
};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// QRコードPDFエクスポートを処理するハンドラー
pub struct QrExportHandler<R, S>
where
    R: RecordRepository,
    S: ObjectStorage,
{
    repository: R,
    storage: S,
    renderer: QrPdfRenderer,
    bucket: String,
    /// QRコードURLのドメイン（FRONT_DOMAIN）
    front_domain: Option<String>,
}

impl<R, S> QrExportHandler<R, S>
where
    R: RecordRepository,
    S: ObjectStorage,
{
    pub fn new(
        repository: R,
        storage: S,
        renderer: QrPdfRenderer,
        bucket: impl Into<String>,
        front_domain: Option<String>,
    ) -> Self {
        Self {
            repository,
            storage,
            renderer,
            bucket: bucket.into(),
            front_domain,
        }
    }

    /// SQSイベントの全レコードを順に処理
    pub async fn handle(&self, event: &SqsEvent) -> ExportResponse {
        let mut response = ExportResponse::qr();

        for record in &event.records {
            let result = self
                .process_message(record.body.as_deref())
                .instrument(message_span("qr_export", record.message_id.as_deref()))
                .await;
            response.push(result);
        }

        info!(
            record_count = response.results().len(),
            failure_count = response.failure_count(),
            "QRエクスポート処理完了"
        );

        response
    }

    async fn process_message(&self, body: Option<&str>) -> ExportResult {
        let request = match QrExportRequest::parse(body) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "不正なメッセージ");
                return ExportResult::failed(None, ExportError::InvalidMessage(err.to_string()));
            }
        };

        let subject = ExportSubject::new(request.table.as_str(), request.exported_file_id.value());

        match self.export(&request, &subject).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    table = %subject.name,
                    exported_file_id = subject.exported_file_id,
                    error = %err,
                    "QRエクスポート失敗"
                );
                ExportResult::failed(Some(subject), err)
            }
        }
    }

    async fn export(
        &self,
        request: &QrExportRequest,
        subject: &ExportSubject,
    ) -> Result<ExportResult, ExportError> {
        let front_domain = self.front_domain.as_deref().ok_or_else(|| {
            ExportError::InvalidMessage("FRONT_DOMAIN が設定されていません".to_string())
        })?;

        let ids = match build_id_query(&request.table, &request.selection) {
            Some(query) => self
                .repository
                .fetch_ids(&query)
                .await
                .map_err(database_error)?,
            None => Vec::new(),
        };

        if ids.is_empty() {
            return Err(ExportError::InvalidMessage(
                "QRを作成する対象レコードが存在しません".to_string(),
            ));
        }

        let items: Vec<QrSheetItem> = ids
            .iter()
            .map(|&id| QrSheetItem {
                url: quick_access_url(front_domain, id),
                label: quick_access_label(id),
            })
            .collect();

        let pdf = self
            .renderer
            .render(&items)
            .map_err(|e| ExportError::Unexpected(e.to_string()))?;

        let key = qr_object_key(request.table.as_str(), subject.exported_file_id, Utc::now());

        self.storage
            .put_object(&self.bucket, &key, pdf, PDF_CONTENT_TYPE)
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
            table = %subject.name,
            exported_file_id = subject.exported_file_id,
            qr_count = items.len(),
            key = %key,
            "QRエクスポート完了"
        );

        // 件数は要求されたID数（全件指定は"all"）
        let record_count = if request.selection.is_all() {
            RecordCount::All
        } else {
            RecordCount::Count(request.record_ids.len())
        };

        Ok(ExportResult::Exported {
            subject: subject.clone(),
            record_count,
            s3_url: download_url,
        })
    }
}
