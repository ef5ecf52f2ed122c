//! エクスポートLambdaのローカル開発環境ブートストラップCLI
//!
//! 本バイナリは以下のコマンドを提供する:
//! - 依存パッケージのvendoring (devenv vendor)
//! - 環境変数ファイルの作成と確認 (devenv env init / devenv env check)
//! - 設定したハンドラーのコンテナ起動 (devenv launch)
//! - 上記を順に実行 (devenv bootstrap)

mod config;
mod env_file;
mod error;
mod launch;
mod logging;
mod process;
mod vendor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use config::Project;
use env_file::{EnvFile, Materialized};
use error::DevenvError;
use logging::init_logging;
use process::{ProcessRunner, SystemProcessRunner};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "devenv")]
#[command(about = "エクスポートLambdaのローカル開発環境を準備してハンドラーを起動する")]
struct Cli {
    /// 設定ファイル（相対パスはこのファイルのディレクトリを基準に解決）
    #[arg(long, short = 'c', global = true, default_value = "devenv.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// 環境変数ファイルの操作
    Env {
        #[command(subcommand)]
        action: EnvCommand,
    },
    /// Cargo.lockの依存パッケージをvendorディレクトリに配置
    Vendor,
    /// devenv.tomlのentrypointで指定したハンドラーをコンテナで起動
    Launch,
    /// vendor、env init、launchを順に実行
    Bootstrap,
}

#[derive(Subcommand, Debug, PartialEq)]
enum EnvCommand {
    /// テンプレートから環境変数ファイルを作成
    Init {
        /// 既存のファイルを上書きする
        #[arg(long)]
        force: bool,
    },
    /// テンプレートと環境変数ファイルのキーを比較
    Check,
}

fn main() -> ExitCode {
    // ログを初期化
    init_logging();

    let cli = Cli::parse();

    match run(cli, &SystemProcessRunner) {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "devenvの実行に失敗");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli, runner: &dyn ProcessRunner) -> Result<ExitCode, DevenvError> {
    let project = Project::load(&cli.config)?;

    match cli.command {
        Command::Env {
            action: EnvCommand::Init { force },
        } => {
            init_env(&project, force)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Env {
            action: EnvCommand::Check,
        } => {
            check_env(&project)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Vendor => {
            vendor::vendor(runner, &project)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Launch => launch_handler(runner, &project),
        Command::Bootstrap => {
            vendor::vendor(runner, &project)?;
            init_env(&project, false)?;
            launch_handler(runner, &project)
        }
    }
}

fn init_env(project: &Project, force: bool) -> Result<(), DevenvError> {
    let target = project.env_file();
    let outcome = env_file::materialize(&project.env_template(), &target, force)?;

    if outcome == Materialized::Kept {
        info!(
            path = %target.display(),
            "既存の環境変数ファイルを使用（上書きする場合は --force）"
        );
    }
    Ok(())
}

fn check_env(project: &Project) -> Result<(), DevenvError> {
    let template = EnvFile::load(&project.env_template())?;
    let active = EnvFile::load(&project.env_file())?;
    let diff = env_file::compare_keys(&template, &active);

    for key in &diff.extra {
        warn!(key = %key, "テンプレートにないキー");
    }
    for key in template.keys() {
        if active.get(key) == Some("") {
            warn!(key = %key, "値が空のキー");
        }
    }

    if !diff.is_complete() {
        return Err(DevenvError::MissingKeys(diff.missing));
    }

    info!(key_count = template.keys().len(), "環境変数ファイルのキーはテンプレートと一致");
    Ok(())
}

fn launch_handler(runner: &dyn ProcessRunner, project: &Project) -> Result<ExitCode, DevenvError> {
    let code = launch::launch(runner, project)?;
    Ok(container_exit_code(code))
}

/// コンテナの終了コードをそのままCLIの終了コードにする
fn container_exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandSpec;
    use crate::process::tests::MockProcessRunner;
    use crate::vendor::tests::{LOCKFILE, populate_vendor};
    use std::path::Path;

    const ENV_SAMPLE: &str = "DB_HOST=db\nDB_PORT=5432\nEXPORT_CSV_BUCKET=local-bucket\n";

    fn write_project(root: &Path, entrypoint: &str) -> PathBuf {
        let bin_dir = root.join("services/exporter/src/bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        for handler in ["hello.rs", "csv_export.rs"] {
            std::fs::write(bin_dir.join(handler), "fn main() {}\n").unwrap();
        }
        std::fs::write(root.join("Cargo.lock"), LOCKFILE).unwrap();
        std::fs::write(root.join("env.sample"), ENV_SAMPLE).unwrap();

        let config = root.join("devenv.toml");
        std::fs::write(
            &config,
            format!("[launch]\nentrypoint = \"{}\"\n", entrypoint),
        )
        .unwrap();
        config
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("devenv").chain(args.iter().copied())).unwrap()
    }

    /// cargo vendorの実行時にvendorディレクトリを作るモック
    fn vendoring_runner(root: &Path, exit_code: i32) -> MockProcessRunner {
        let vendor_dir = root.join("vendor");
        MockProcessRunner::with_hook(exit_code, move |command: &CommandSpec| {
            if command.program() == "cargo" {
                populate_vendor(&vendor_dir);
            }
        })
    }

    #[test]
    fn test_parse_cli() {
        assert_eq!(
            cli(&["env", "init", "--force"]).command,
            Command::Env {
                action: EnvCommand::Init { force: true }
            }
        );
        assert_eq!(cli(&["launch"]).config, PathBuf::from("devenv.toml"));
        assert_eq!(
            cli(&["--config", "conf/devenv.toml", "vendor"]).config,
            PathBuf::from("conf/devenv.toml")
        );
        assert!(Cli::try_parse_from(["devenv", "start"]).is_err());
    }

    #[test]
    fn test_env_init_creates_env_with_template_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), "hello.rs");
        let config = config.display().to_string();

        run(cli(&["-c", &config, "env", "init"]), &MockProcessRunner::new(0)).unwrap();

        let template = EnvFile::load(&dir.path().join("env.sample")).unwrap();
        let active = EnvFile::load(&dir.path().join(".env")).unwrap();
        assert_eq!(template.keys(), active.keys());

        run(cli(&["-c", &config, "env", "check"]), &MockProcessRunner::new(0)).unwrap();
    }

    #[test]
    fn test_env_check_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), "hello.rs").display().to_string();
        std::fs::write(dir.path().join(".env"), "DB_HOST=db\n").unwrap();

        let result = run(cli(&["-c", &config, "env", "check"]), &MockProcessRunner::new(0));

        match result {
            Err(DevenvError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["DB_PORT".to_string(), "EXPORT_CSV_BUCKET".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_launch_without_vendor_fails_before_container() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), "csv_export.rs").display().to_string();
        std::fs::write(dir.path().join(".env"), ENV_SAMPLE).unwrap();
        let runner = MockProcessRunner::new(0);

        let result = run(cli(&["-c", &config, "launch"]), &runner);

        assert!(matches!(result, Err(DevenvError::Launch(_))));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_bootstrap_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), "csv_export.rs").display().to_string();
        let runner = vendoring_runner(dir.path(), 0);

        let code = run(cli(&["-c", &config, "bootstrap"]), &runner).unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join(".env").is_file());

        let programs: Vec<String> = runner
            .commands()
            .iter()
            .map(|c| c.program().to_string())
            .collect();
        assert_eq!(programs, vec!["cargo", "docker"]);
        assert_eq!(
            runner.commands()[1].args().last().map(String::as_str),
            Some("csv_export")
        );
    }

    #[test]
    fn test_bootstrap_stops_when_vendoring_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), "hello.rs").display().to_string();
        let runner = MockProcessRunner::new(101);

        let result = run(cli(&["-c", &config, "bootstrap"]), &runner);

        assert!(matches!(result, Err(DevenvError::Vendor(_))));
        assert!(!dir.path().join(".env").exists());
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_container_exit_code() {
        assert_eq!(container_exit_code(0), ExitCode::SUCCESS);
        assert_eq!(container_exit_code(3), ExitCode::from(3));
        assert_eq!(container_exit_code(-1), ExitCode::FAILURE);
    }
}
