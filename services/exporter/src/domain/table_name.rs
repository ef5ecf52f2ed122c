/// エクスポート対象テーブル名
///
/// SQSメッセージの`file_type`/`table`はSQL文に埋め込まれるため、
/// PostgreSQLの識別子として安全な文字だけを受け付ける。
use std::fmt;

use thiserror::Error;

/// PostgreSQL識別子の最大長（NAMEDATALEN - 1）
const MAX_IDENTIFIER_LEN: usize = 63;

/// テーブル名のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableNameError {
    /// 空文字列
    #[error("テーブル名が空です")]
    Empty,
    /// 識別子の最大長を超えている
    #[error("テーブル名が長すぎます: {0}")]
    TooLong(String),
    /// 英小文字・数字・アンダースコア以外を含む
    #[error("テーブル名に使用できない文字が含まれています: {0}")]
    InvalidCharacter(String),
}

/// 検証済みのテーブル名（小文字）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// 文字列を小文字化してテーブル名として検証する
    ///
    /// `[a-z_][a-z0-9_]*` に一致しない場合はエラー。
    pub fn parse(value: &str) -> Result<Self, TableNameError> {
        let name = value.trim().to_ascii_lowercase();

        if name.is_empty() {
            return Err(TableNameError::Empty);
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(TableNameError::TooLong(name));
        }

        let mut chars = name.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !head_ok || !tail_ok {
            return Err(TableNameError::InvalidCharacter(value.to_string()));
        }

        Ok(Self(name))
    }

    /// テーブル名を文字列として取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
