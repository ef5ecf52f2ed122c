//! 外部コマンドの実行
//!
//! cargoやdocker composeの呼び出しをProcessRunnerトレイトで抽象化し、
//! テストではモックに差し替える。

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// コマンド実行のエラー型
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("コマンドを起動できません: {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// シグナルなどで終了コードなしに終了した
    #[error("コマンドが異常終了しました: {0}")]
    Terminated(String),
}

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 子プロセスに追加で渡す環境変数
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// ログ表示用のコマンドライン
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// コマンド実行トレイト
pub trait ProcessRunner {
    /// コマンドを実行して終了を待ち、終了コードを返す
    fn run(&self, command: &CommandSpec) -> Result<i32, ProcessError>;
}

/// 標準入出力を引き継いで子プロセスを実行する
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<i32, ProcessError> {
        debug!(command = %command.display(), "コマンド実行");

        let mut process = Command::new(command.program());
        process.args(command.args());
        for (key, value) in command.envs() {
            process.env(key, value);
        }
        if let Some(dir) = command.working_dir() {
            process.current_dir(dir);
        }

        let status = process.status().map_err(|source| ProcessError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

        status
            .code()
            .ok_or_else(|| ProcessError::Terminated(command.display()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_command_display() {
        let command = CommandSpec::new("cargo")
            .arg("vendor")
            .arg("--locked")
            .current_dir("/work");

        assert_eq!(command.display(), "cargo vendor --locked");
        assert_eq!(command.working_dir(), Some(Path::new("/work")));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_envs() {
        let exit = SystemProcessRunner
            .run(
                &CommandSpec::new("sh")
                    .arg("-c")
                    .arg("test \"$DEVENV_TEST_VALUE\" = expected")
                    .env("DEVENV_TEST_VALUE", "expected"),
            )
            .unwrap();
        assert_eq!(exit, 0);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let result = SystemProcessRunner.run(&CommandSpec::new("definitely-not-a-real-program-xyz"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_exit_code() {
        let exit = SystemProcessRunner
            .run(&CommandSpec::new("sh").arg("-c").arg("exit 3"))
            .unwrap();
        assert_eq!(exit, 3);
    }

    // ==================== モック ====================

    type Hook = Box<dyn Fn(&CommandSpec)>;

    /// 実行されたコマンドを記録するモック
    pub struct MockProcessRunner {
        commands: RefCell<Vec<CommandSpec>>,
        exit_code: i32,
        /// 実行時の副作用（cargo vendorの出力を模擬するなど）
        hook: Option<Hook>,
    }

    impl MockProcessRunner {
        pub fn new(exit_code: i32) -> Self {
            Self {
                commands: RefCell::new(Vec::new()),
                exit_code,
                hook: None,
            }
        }

        pub fn with_hook(exit_code: i32, hook: impl Fn(&CommandSpec) + 'static) -> Self {
            Self {
                hook: Some(Box::new(hook)),
                ..Self::new(exit_code)
            }
        }

        pub fn commands(&self) -> Vec<CommandSpec> {
            self.commands.borrow().clone()
        }
    }

    impl ProcessRunner for MockProcessRunner {
        fn run(&self, command: &CommandSpec) -> Result<i32, ProcessError> {
            self.commands.borrow_mut().push(command.clone());
            if let Some(hook) = &self.hook {
                hook(command);
            }
            Ok(self.exit_code)
        }
    }
}
