// Domain layer modules
pub mod csv_document;
pub mod export_request;
pub mod export_result;
pub mod object_key;
pub mod qr_layout;
pub mod table_export_config;
pub mod table_name;

// Re-exports
pub use csv_document::{CsvRenderError, ExportRow, render_csv};
pub use export_request::{
    CsvExportRequest, ExportedFileId, MessageError, QrExportRequest, RecordSelection,
};
pub use export_result::{ExportError, ExportResponse, ExportResult, ExportSubject, RecordCount};
pub use object_key::{csv_object_key, qr_object_key, quick_access_label, quick_access_url};
pub use qr_layout::{LogoBox, QrPlacement, QrSheetLayout};
pub use table_export_config::TableExportConfig;
pub use table_name::{TableName, TableNameError};
