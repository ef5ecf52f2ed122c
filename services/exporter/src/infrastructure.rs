// Infrastructure layer modules
pub mod export_queries;
pub mod logging;
pub mod object_storage;
pub mod postgres_config;
pub mod qr_config;
pub mod qr_pdf;
pub mod record_repository;
pub mod storage_config;

// Re-exports
pub use export_queries::{ExportQuery, build_id_query, build_query};
pub use logging::{init_logging, message_span};
pub use object_storage::{
    ExportStorage, LocalObjectStorage, ObjectStorage, S3ObjectStorage, StorageError,
};
pub use postgres_config::{PostgresConfig, PostgresConfigError};
pub use qr_config::{QrConfigError, QrSettings};
pub use qr_pdf::{QrPdfError, QrPdfRenderer, QrSheetItem};
pub use record_repository::{PostgresRecordRepository, RecordRepository, RepositoryError};
pub use storage_config::{
    CSV_DEFAULT_LOCAL_DIR, QR_DEFAULT_LOCAL_DIR, StorageConfig, StorageConfigError,
};
