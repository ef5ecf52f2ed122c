/// 疎通確認用Lambda関数
///
/// 入力に関わらず固定の応答（statusCode 200、`{"message":"Hello!!"}`）を返す。
use exporter::application::hello_response;
use exporter::infrastructure::init_logging;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        info!("Lambda関数として起動");
        lambda_runtime::run(service_fn(handler)).await?;
    } else {
        info!("ローカルスクリプトとして起動");
        println!("{}", serde_json::to_string_pretty(&hello_response())?);
    }

    Ok(())
}

async fn handler(_event: LambdaEvent<Value>) -> Result<Value, Error> {
    Ok(hello_response())
}
