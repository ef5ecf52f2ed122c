/// QRコードPDFの描画設定
///
/// 環境変数:
/// - QR_LOGO_PATH: QRコード中央に重ねるロゴ画像（省略時 assets/qr_logo.png）
/// - QR_LOGO_RATIO: QRコード幅に対するロゴ幅の比率（省略時 0.25、0以下ならロゴなし）
/// - QR_COLS_PER_ROW: 1行あたりのQRコード数（省略時 4、4〜8以外はレイアウト側で4）
use std::path::{Path, PathBuf};

use thiserror::Error;

const DEFAULT_LOGO_PATH: &str = "assets/qr_logo.png";
const DEFAULT_LOGO_RATIO: f32 = 0.25;
const DEFAULT_COLS_PER_ROW: i64 = 4;

/// QR設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QrConfigError {
    #[error("環境変数の値が不正です: {0}={1}")]
    InvalidValue(String, String),
}

/// QRコードPDFの描画設定
#[derive(Debug, Clone, PartialEq)]
pub struct QrSettings {
    logo_path: PathBuf,
    logo_ratio: f32,
    cols_per_row: i64,
}

impl QrSettings {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, QrConfigError> {
        let logo_path = std::env::var("QR_LOGO_PATH")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGO_PATH));

        let logo_ratio = parse_env("QR_LOGO_RATIO", DEFAULT_LOGO_RATIO)?;
        let cols_per_row = parse_env("QR_COLS_PER_ROW", DEFAULT_COLS_PER_ROW)?;

        Ok(Self {
            logo_path,
            logo_ratio,
            cols_per_row,
        })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(logo_path: impl Into<PathBuf>, logo_ratio: f32, cols_per_row: i64) -> Self {
        Self {
            logo_path: logo_path.into(),
            logo_ratio,
            cols_per_row,
        }
    }

    pub fn logo_path(&self) -> &Path {
        &self.logo_path
    }

    pub fn logo_ratio(&self) -> f32 {
        self.logo_ratio
    }

    pub fn cols_per_row(&self) -> i64 {
        self.cols_per_row
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, QrConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| QrConfigError::InvalidValue(name.to_string(), value)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QrSheetLayout;
    use serial_test::serial;

    unsafe fn cleanup() {
        unsafe {
            std::env::remove_var("QR_LOGO_PATH");
            std::env::remove_var("QR_LOGO_RATIO");
            std::env::remove_var("QR_COLS_PER_ROW");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        unsafe { cleanup() };

        let settings = QrSettings::from_env().unwrap();

        assert_eq!(settings.logo_path(), Path::new("assets/qr_logo.png"));
        assert_eq!(settings.logo_ratio(), 0.25);
        assert_eq!(settings.cols_per_row(), 4);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        unsafe {
            cleanup();
            std::env::set_var("QR_LOGO_PATH", "/opt/logo.png");
            std::env::set_var("QR_LOGO_RATIO", "0.3");
            std::env::set_var("QR_COLS_PER_ROW", "6");
        }

        let settings = QrSettings::from_env().unwrap();

        assert_eq!(settings.logo_path(), Path::new("/opt/logo.png"));
        assert_eq!(settings.logo_ratio(), 0.3);
        assert_eq!(settings.cols_per_row(), 6);

        unsafe { cleanup() };
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_cols() {
        unsafe {
            cleanup();
            std::env::set_var("QR_COLS_PER_ROW", "many");
        }

        assert_eq!(
            QrSettings::from_env(),
            Err(QrConfigError::InvalidValue(
                "QR_COLS_PER_ROW".to_string(),
                "many".to_string()
            ))
        );

        unsafe { cleanup() };
    }

    #[test]
    #[serial]
    fn test_from_env_out_of_range_values_are_kept() {
        // 範囲の補正はレイアウトと描画で行う
        unsafe {
            cleanup();
            std::env::set_var("QR_LOGO_RATIO", "1.5");
            std::env::set_var("QR_COLS_PER_ROW", "-1");
        }

        let settings = QrSettings::from_env().unwrap();

        assert_eq!(settings.logo_ratio(), 1.5);
        assert_eq!(settings.cols_per_row(), -1);
        assert_eq!(QrSheetLayout::new(settings.cols_per_row()).cols(), 4);

        unsafe { cleanup() };
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_ratio() {
        unsafe {
            cleanup();
            std::env::set_var("QR_LOGO_RATIO", "quarter");
        }

        assert!(matches!(
            QrSettings::from_env(),
            Err(QrConfigError::InvalidValue(name, _)) if name == "QR_LOGO_RATIO"
        ));

        unsafe { cleanup() };
    }
}
