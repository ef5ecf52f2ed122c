//! 開発環境の設定（devenv.toml）
//!
//! ```toml
//! [paths]
//! env_template = "env.sample"
//! env_file = ".env"
//! manifest = "Cargo.lock"
//! vendor_dir = "vendor"
//! handler_dir = "services/exporter/src/bin"
//! compose_file = "docker-compose.yml"
//!
//! [launch]
//! service = "lambda"
//! entrypoint = "csv_export.rs"
//! ```
//!
//! 相対パスは設定ファイルのあるディレクトリを基準に解決する。
//! 省略した項目は上記の既定値になる。

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// 設定読み込みのエラー型
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません: {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("設定ファイルの形式が不正です: {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("entrypointが不正です: {0:?}")]
    InvalidEntrypoint(String),
}

/// devenv.toml全体
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevenvConfig {
    pub paths: PathsConfig,
    pub launch: LaunchConfig,
}

/// `[paths]`テーブル
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// 環境変数ファイルのテンプレート
    pub env_template: PathBuf,
    /// コンテナに渡す環境変数ファイル
    pub env_file: PathBuf,
    /// 依存パッケージの一覧
    pub manifest: PathBuf,
    /// 依存パッケージの配置先
    pub vendor_dir: PathBuf,
    /// ハンドラーのソースファイルがあるディレクトリ
    pub handler_dir: PathBuf,
    pub compose_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            env_template: PathBuf::from("env.sample"),
            env_file: PathBuf::from(".env"),
            manifest: PathBuf::from("Cargo.lock"),
            vendor_dir: PathBuf::from("vendor"),
            handler_dir: PathBuf::from("services/exporter/src/bin"),
            compose_file: PathBuf::from("docker-compose.yml"),
        }
    }
}

/// `[launch]`テーブル
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    /// docker composeのサービス名
    pub service: String,
    /// 実行するハンドラーのファイル名（例: `csv_export.rs`、拡張子は省略可）
    pub entrypoint: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            service: "lambda".to_string(),
            entrypoint: "hello.rs".to_string(),
        }
    }
}

impl LaunchConfig {
    /// entrypointに対応するバイナリ名
    pub fn binary_name(&self) -> Result<&str, ConfigError> {
        let name = self.entrypoint.trim();
        let name = name.strip_suffix(".rs").unwrap_or(name);

        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ConfigError::InvalidEntrypoint(self.entrypoint.clone()));
        }

        Ok(name)
    }
}

impl DevenvConfig {
    /// TOML文字列から設定を作成
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// 設定ファイルを読み込む（ファイルがない場合は既定値）
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "設定ファイルがないため既定値を使用");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// 設定とプロジェクトルートを組み合わせた、解決済みのパス
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    config: DevenvConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: DevenvConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// 設定ファイルを読み込み、そのディレクトリ（絶対パス）をルートとする
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let config = DevenvConfig::load(config_path)?;
        let root = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // 子プロセスは作業ディレクトリをルートにして起動するため絶対パスにする
        let root = std::path::absolute(root).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn launch(&self) -> &LaunchConfig {
        &self.config.launch
    }

    pub fn env_template(&self) -> PathBuf {
        self.root.join(&self.config.paths.env_template)
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(&self.config.paths.env_file)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(&self.config.paths.manifest)
    }

    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.vendor_dir)
    }

    pub fn handler_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.handler_dir)
    }

    pub fn compose_file(&self) -> PathBuf {
        self.root.join(&self.config.paths.compose_file)
    }

    /// entrypointのソースファイル
    pub fn entrypoint_file(&self) -> Result<PathBuf, ConfigError> {
        let binary = self.config.launch.binary_name()?;
        Ok(self.handler_dir().join(format!("{}.rs", binary)))
    }
}
