//! エクスポートLambdaのログ設定
//!
//! CloudWatch Logsで検索しやすいよう、イベントのフィールドをフラットにしたJSONで出力する。
//! SQSメッセージ1件分の処理は`message_span`の中で行い、その間のログには
//! `span.function`と`span.message_id`が付く。

use std::sync::Once;

use tracing::{Span, Subscriber, info_span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// `RUST_LOG`未設定時のフィルター
const DEFAULT_FILTER: &str = "info";

/// ログサブスクライバーを初期化する（標準出力へJSON）
///
/// 複数回呼び出しても最初の呼び出しのみ初期化を実行する。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = json_subscriber(env_filter, std::io::stdout).try_init();
    });
}

fn json_subscriber<W>(env_filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false);

    tracing_subscriber::registry().with(env_filter).with(json_layer)
}

/// SQSメッセージ1件分の処理スパン
///
/// # 引数
/// * `function` - 処理しているLambda関数（`csv_export` / `qr_export`）
/// * `message_id` - SQSのメッセージID（ないときは`-`）
pub fn message_span(function: &'static str, message_id: Option<&str>) -> Span {
    info_span!(
        "sqs_message",
        function = function,
        message_id = message_id.unwrap_or("-")
    )
}
