//! 環境変数ファイル（dotenv形式）
//!
//! 書式の解釈はdotenvyに任せる。docker composeの`env_file`と同様に、
//! 値を持たないキーだけの行（ホストの環境変数を引き継ぐ）も受け付ける。

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// 環境変数ファイル操作のエラー型
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("テンプレートが見つかりません: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("環境変数ファイルが見つかりません: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{}: KEY=VALUE形式ではありません: {content}", .path.display())]
    InvalidLine { path: PathBuf, content: String },
    #[error("ファイル操作に失敗しました: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 読み込んだ環境変数（ファイル内の順序を保持）
///
/// 値を持たないキーは`None`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvFile {
    entries: Vec<(String, Option<String>)>,
}

impl EnvFile {
    /// 文字列をパースする
    ///
    /// # 引数
    /// * `path` - エラーメッセージに含めるファイルパス
    pub fn parse(content: &str, path: &Path) -> Result<Self, EnvFileError> {
        Self::collect(dotenvy::from_read_iter(content.as_bytes()), path)
    }

    /// ファイルを読み込む
    pub fn load(path: &Path) -> Result<Self, EnvFileError> {
        let iter = dotenvy::from_path_iter(path).map_err(|err| dotenv_error(path, err))?;
        Self::collect(iter, path)
    }

    fn collect<R: Read>(iter: dotenvy::Iter<R>, path: &Path) -> Result<Self, EnvFileError> {
        let mut entries = Vec::new();

        for item in iter {
            match item {
                Ok((key, value)) => entries.push((key, Some(value))),
                Err(dotenvy::Error::LineParse(line, _)) => match bare_key(&line) {
                    Some(key) => entries.push((key.to_string(), None)),
                    None => {
                        return Err(EnvFileError::InvalidLine {
                            path: path.to_path_buf(),
                            content: line,
                        });
                    }
                },
                Err(err) => return Err(dotenv_error(path, err)),
            }
        }

        Ok(Self { entries })
    }

    /// 値を返す（同じキーが複数ある場合は後勝ち、値なしのキーはNone）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn keys(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

fn dotenv_error(path: &Path, err: dotenvy::Error) -> EnvFileError {
    match err {
        dotenvy::Error::Io(source) if source.kind() == std::io::ErrorKind::NotFound => {
            EnvFileError::NotFound(path.to_path_buf())
        }
        dotenvy::Error::Io(source) => EnvFileError::Io {
            path: path.to_path_buf(),
            source,
        },
        dotenvy::Error::LineParse(content, _) => EnvFileError::InvalidLine {
            path: path.to_path_buf(),
            content,
        },
        other => EnvFileError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(other.to_string()),
        },
    }
}

/// `KEY`または`export KEY`だけの行ならキーを返す
fn bare_key(line: &str) -> Option<&str> {
    let line = line.trim();
    let line = line.strip_prefix("export ").unwrap_or(line);
    let key = line.split_once('#').map_or(line, |(key, _)| key).trim();

    let mut chars = key.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(key)
}

/// テンプレートからの作成結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Created,
    Overwritten,
    /// 既存ファイルをそのまま残した
    Kept,
}

/// テンプレートをそのままコピーして環境変数ファイルを作成
///
/// 既存のファイルは`force`がない限り上書きしない。内容の検証やマージは行わない。
pub fn materialize(
    template: &Path,
    target: &Path,
    force: bool,
) -> Result<Materialized, EnvFileError> {
    if !template.is_file() {
        return Err(EnvFileError::TemplateNotFound(template.to_path_buf()));
    }

    let existed = target.exists();
    if existed && !force {
        info!(path = %target.display(), "環境変数ファイルが既に存在するため作成しない");
        return Ok(Materialized::Kept);
    }

    std::fs::copy(template, target).map_err(|source| EnvFileError::Io {
        path: target.to_path_buf(),
        source,
    })?;

    info!(
        template = %template.display(),
        path = %target.display(),
        "環境変数ファイルを作成"
    );

    Ok(if existed {
        Materialized::Overwritten
    } else {
        Materialized::Created
    })
}

/// テンプレートと環境変数ファイルのキーの差分
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDiff {
    /// テンプレートにあって環境変数ファイルにないキー
    pub missing: Vec<String>,
    /// 環境変数ファイルにだけあるキー
    pub extra: Vec<String>,
}

impl KeyDiff {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn compare_keys(template: &EnvFile, active: &EnvFile) -> KeyDiff {
    let expected = template.keys();
    let actual = active.keys();

    KeyDiff {
        missing: expected.difference(&actual).map(|k| k.to_string()).collect(),
        extra: actual.difference(&expected).map(|k| k.to_string()).collect(),
    }
}
