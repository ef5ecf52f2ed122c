//! devenvのログ設定
//!
//! 開発者が端末で読むため、JSONではなくコンパクトな形式で標準エラーに出力する。
//! RUST_LOG環境変数でログレベルを制御（デフォルト: info）

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
