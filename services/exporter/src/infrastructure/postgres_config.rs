/// PostgreSQL接続設定
///
/// bizcloud-map-apiのデータベースへの接続情報を環境変数から読み込む。
use std::time::Duration;

use thiserror::Error;

/// デフォルトのポート番号
const DEFAULT_PORT: u16 = 5432;

/// 接続タイムアウト
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PostgresConfigError {
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
    #[error("環境変数の値が不正です: {0}={1}")]
    InvalidValue(String, String),
}

/// PostgreSQL接続設定
///
/// 以下の環境変数から読み込む:
/// - DB_HOST: ホスト名
/// - DB_PORT: ポート番号（省略時5432）
/// - DB_NAME: データベース名
/// - DB_USER: ユーザー名
/// - DB_PASSWORD: パスワード
#[derive(Clone)]
pub struct PostgresConfig {
    host: String,
    port: u16,
    database: String,
    user: String,
    password: String,
    connect_timeout: Duration,
}

// パスワードをログに出さない
impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl PostgresConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, PostgresConfigError> {
        let host = required_env("DB_HOST")?;

        let port = match std::env::var("DB_PORT") {
            Ok(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| PostgresConfigError::InvalidValue("DB_PORT".to_string(), value))?,
            Err(_) => DEFAULT_PORT,
        };

        let database = required_env("DB_NAME")?;
        let user = required_env("DB_USER")?;
        let password = required_env("DB_PASSWORD")?;

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// tokio-postgresの接続設定に変換
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .connect_timeout(self.connect_timeout)
            .application_name("bizcloud-exporter");
        config
    }
}

fn required_env(name: &str) -> Result<String, PostgresConfigError> {
    std::env::var(name).map_err(|_| PostgresConfigError::MissingEnvVar(name.to_string()))
}
