// アプリケーション層モジュール
pub mod csv_export_handler;
pub mod hello_handler;
pub mod qr_export_handler;

// 再エクスポート
pub use csv_export_handler::CsvExportHandler;
pub use hello_handler::hello_response;
pub use qr_export_handler::QrExportHandler;
