/// CSVエクスポートLambda関数
///
/// SQSメッセージに基づいてCSVを生成し、S3に配置してexported_filesを更新する。
/// Lambda関数としても、ローカルスクリプトとしても実行可能。
///
/// # 環境変数
/// - EXPORT_CSV_BUCKET: アップロード先バケット（必須）
/// - DB_HOST / DB_PORT / DB_NAME / DB_USER / DB_PASSWORD: PostgreSQL接続情報
/// - USE_LOCAL_S3 / LOCAL_S3_DIR / LOCAL_S3_BASE_URL: ローカル保存の設定
/// - SQS_PAYLOAD: ローカル実行時のメッセージ本文（省略時は既定のメッセージ）
///
/// # ローカル実行
/// ```bash
/// export USE_LOCAL_S3=true
/// export SQS_PAYLOAD='{"file_type":"products","record_ids":[1,2],"exported_file_id":10}'
/// cargo run --bin csv_export
/// ```
use aws_lambda_events::event::sqs::SqsEvent;
use exporter::application::CsvExportHandler;
use exporter::infrastructure::{
    CSV_DEFAULT_LOCAL_DIR, ExportStorage, PostgresConfig, PostgresRecordRepository,
    StorageConfig, init_logging,
};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{error, info};

type Handler = CsvExportHandler<PostgresRecordRepository, ExportStorage>;

/// SQS_PAYLOAD未設定時のメッセージ本文
const DEFAULT_LOCAL_PAYLOAD: &str =
    r#"{"file_type":"users","record_ids":[1,2,3],"is_all_record":false,"exported_file_id":6}"#;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda環境かどうかを判定
    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        info!("Lambda関数として起動");
        lambda_runtime::run(service_fn(handler)).await?;
    } else {
        info!("ローカルスクリプトとして起動");
        run_local().await?;
    }

    Ok(())
}

/// Lambda関数のメインハンドラー
async fn handler(event: LambdaEvent<SqsEvent>) -> Result<Value, Error> {
    let event = event.payload;

    info!(record_count = event.records.len(), "SQSイベントを受信");

    process(&event).await
}

/// ローカル実行用関数
async fn run_local() -> Result<(), Error> {
    let payload = std::env::var("SQS_PAYLOAD")
        .ok()
        .filter(|payload| !payload.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCAL_PAYLOAD.to_string());

    let event: SqsEvent = serde_json::from_value(json!({ "Records": [{ "body": payload }] }))?;
    let response = process(&event).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// CsvExportHandlerの静的インスタンス
///
/// Lambda warm start時に設定とS3クライアントを再利用する。
/// 初期化に失敗した場合は保持せず、次の呼び出しで再度読み込む。
static HANDLER: OnceCell<Handler> = OnceCell::const_new();

/// CsvExportHandlerを取得（初期化されていなければ設定を読み込んで作成）
///
/// バケットやDB接続情報が欠けている場合はエラーを返し、レコードは処理しない。
async fn get_handler() -> Result<&'static Handler, Error> {
    HANDLER
        .get_or_try_init(|| async {
            let storage_config = StorageConfig::from_env(CSV_DEFAULT_LOCAL_DIR);
            let bucket = storage_config
                .csv_bucket_from_env()
                .inspect_err(|e| error!(error = %e, "保存先バケット設定読み込み失敗"))?;

            let postgres_config = PostgresConfig::from_env()
                .inspect_err(|e| error!(error = %e, "PostgreSQL設定読み込み失敗"))?;

            Ok::<_, Error>(CsvExportHandler::new(
                PostgresRecordRepository::new(postgres_config),
                ExportStorage::from_config(&storage_config).await,
                bucket,
            ))
        })
        .await
}

/// イベントを処理してLambdaの応答を返す
async fn process(event: &SqsEvent) -> Result<Value, Error> {
    let handler = get_handler().await?;
    Ok(handler.handle(event).await.into_lambda_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_is_built_once_after_config_is_available() {
        // 環境変数を書き換えるテストはこのバイナリにこれだけ
        unsafe {
            std::env::remove_var("EXPORT_CSV_BUCKET");
            std::env::set_var("USE_LOCAL_S3", "true");
            std::env::set_var("LOCAL_S3_DIR", std::env::temp_dir());
            std::env::set_var("DB_HOST", "localhost");
            std::env::set_var("DB_NAME", "app");
            std::env::set_var("DB_USER", "app");
            std::env::set_var("DB_PASSWORD", "secret");
        }

        // 設定不足のエラーは保持されない
        assert!(get_handler().await.is_err());

        unsafe { std::env::set_var("EXPORT_CSV_BUCKET", "csv-bucket") };
        let first = get_handler().await.unwrap();

        unsafe { std::env::set_var("EXPORT_CSV_BUCKET", "other-bucket") };
        let second = get_handler().await.unwrap();

        assert!(std::ptr::eq(first, second));
    }
}
