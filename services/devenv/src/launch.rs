//! ハンドラーのコンテナ起動
//!
//! devenv.tomlの`launch.entrypoint`で選んだハンドラーを
//! `docker compose run --rm <service> <binary>`で1回だけ実行する。
//! 起動前にentrypoint、環境変数ファイル、vendorディレクトリを確認し、
//! どれかが欠けていればコンテナを起動しない。
//! 確認した環境変数ファイルは`DEVENV_ENV_FILE`でdocker-compose.ymlの`env_file`に渡す。

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, Project};
use crate::process::{CommandSpec, ProcessError, ProcessRunner};
use crate::vendor::{self, VendorError};

/// docker-compose.ymlの`env_file`に展開される変数
pub const ENV_FILE_VAR: &str = "DEVENV_ENV_FILE";

/// 起動のエラー型
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("entrypointのファイルが見つかりません: {}", .0.display())]
    EntrypointNotFound(PathBuf),
    #[error("環境変数ファイルがありません（devenv env init を実行してください）: {}", .0.display())]
    EnvFileMissing(PathBuf),
    #[error("依存パッケージが揃っていません（devenv vendor を実行してください）: {0}")]
    Vendor(#[from] VendorError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// 起動前の確認を通過した実行計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub binary: String,
    pub command: CommandSpec,
}

/// 起動前の確認を行い、実行するコマンドを組み立てる
pub fn preflight(project: &Project) -> Result<LaunchPlan, LaunchError> {
    let entrypoint = project.entrypoint_file()?;
    if !entrypoint.is_file() {
        return Err(LaunchError::EntrypointNotFound(entrypoint));
    }

    let env_file = project.env_file();
    if !env_file.is_file() {
        return Err(LaunchError::EnvFileMissing(env_file));
    }

    vendor::verify_project(project)?;

    let binary = project.launch().binary_name()?.to_string();
    let command = CommandSpec::new("docker")
        .arg("compose")
        .arg("-f")
        .arg(project.compose_file().display().to_string())
        .arg("run")
        .arg("--rm")
        .arg(project.launch().service.clone())
        .arg(binary.clone())
        .env(ENV_FILE_VAR, env_file.display().to_string())
        .current_dir(project.root());

    Ok(LaunchPlan { binary, command })
}

/// ハンドラーを起動し、コンテナの終了コードを返す
pub fn launch(runner: &dyn ProcessRunner, project: &Project) -> Result<i32, LaunchError> {
    let plan = preflight(project)?;

    info!(
        binary = %plan.binary,
        service = %project.launch().service,
        command = %plan.command.display(),
        "ハンドラーを起動"
    );

    let exit_code = runner.run(&plan.command)?;

    info!(binary = %plan.binary, exit_code = exit_code, "ハンドラー終了");
    Ok(exit_code)
}
