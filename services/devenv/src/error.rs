//! devenvのエラー型
//!
//! 各ステップのエラーをまとめ、終了コードに対応付ける。

use thiserror::Error;

use crate::config::ConfigError;
use crate::env_file::EnvFileError;
use crate::launch::LaunchError;
use crate::vendor::VendorError;

#[derive(Debug, Error)]
pub enum DevenvError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    EnvFile(#[from] EnvFileError),
    #[error(transparent)]
    Vendor(#[from] VendorError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("環境変数ファイルに不足しているキーがあります: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

impl DevenvError {
    /// プロセスの終了コード
    pub fn exit_code(&self) -> u8 {
        match self {
            DevenvError::Config(_) => 2,
            DevenvError::EnvFile(_) | DevenvError::MissingKeys(_) => 3,
            DevenvError::Vendor(_) => 4,
            DevenvError::Launch(_) => 5,
        }
    }
}
