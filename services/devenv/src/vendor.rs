//! 依存パッケージのvendoring
//!
//! Cargo.lockに記載されたレジストリのパッケージを`cargo vendor --locked`で
//! vendorディレクトリに配置し、全パッケージが揃っていることを確認する。
//! ワークスペース内のパッケージ（sourceなし）は対象外。

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Project;
use crate::process::{CommandSpec, ProcessError, ProcessRunner};

/// vendoringのエラー型
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("マニフェストが見つかりません: {}", .0.display())]
    ManifestNotFound(std::path::PathBuf),
    #[error("マニフェストを読み込めません: {0}")]
    ManifestRead(String),
    #[error("マニフェストの形式が不正です: {0}")]
    ManifestParse(String),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("cargo vendorが失敗しました（終了コード: {0}）")]
    CommandFailed(i32),
    #[error("vendorディレクトリがありません: {}", .0.display())]
    VendorDirMissing(std::path::PathBuf),
    #[error("vendorディレクトリに不足しているパッケージがあります: {}", .0.join(", "))]
    PackagesMissing(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

/// Cargo.lockの`[[package]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl LockedPackage {
    pub fn is_registry(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|source| source.starts_with("registry+"))
    }

    /// `cargo vendor`が作るディレクトリに配置されているか
    ///
    /// 同名パッケージが1バージョンなら`<name>`、複数なら`<name>-<version>`になる。
    /// `<name>`は別バージョンの可能性があるため、Cargo.tomlのversionと照合する。
    fn vendored_in(&self, vendor_dir: &Path) -> bool {
        if vendor_dir
            .join(format!("{}-{}", self.name, self.version))
            .is_dir()
        {
            return true;
        }

        vendored_version(&vendor_dir.join(&self.name)).as_deref() == Some(self.version.as_str())
    }

    fn label(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

#[derive(Debug, Deserialize)]
struct VendoredManifest {
    package: VendoredPackage,
}

#[derive(Debug, Deserialize)]
struct VendoredPackage {
    version: String,
}

/// vendor済みパッケージのCargo.tomlからバージョンを読む
fn vendored_version(package_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(package_dir.join("Cargo.toml")).ok()?;
    toml::from_str::<VendoredManifest>(&content)
        .ok()
        .map(|manifest| manifest.package.version)
}

/// マニフェストからvendor対象のパッケージを取得
pub fn parse_manifest(content: &str) -> Result<Vec<LockedPackage>, VendorError> {
    let lockfile: Lockfile =
        toml::from_str(content).map_err(|e| VendorError::ManifestParse(e.message().to_string()))?;

    Ok(lockfile
        .package
        .into_iter()
        .filter(LockedPackage::is_registry)
        .collect())
}

pub fn read_manifest(path: &Path) -> Result<Vec<LockedPackage>, VendorError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VendorError::ManifestNotFound(path.to_path_buf())
        } else {
            VendorError::ManifestRead(format!("{}: {}", path.display(), e))
        }
    })?;
    parse_manifest(&content)
}

/// vendorディレクトリに全パッケージが揃っているか確認
pub fn verify(vendor_dir: &Path, packages: &[LockedPackage]) -> Result<(), VendorError> {
    if !vendor_dir.is_dir() {
        return Err(VendorError::VendorDirMissing(vendor_dir.to_path_buf()));
    }

    let missing: Vec<String> = packages
        .iter()
        .filter(|package| !package.vendored_in(vendor_dir))
        .map(LockedPackage::label)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(VendorError::PackagesMissing(missing))
    }
}

/// マニフェストを読み込んでvendorディレクトリを確認
pub fn verify_project(project: &Project) -> Result<usize, VendorError> {
    let packages = read_manifest(&project.manifest())?;
    verify(&project.vendor_dir(), &packages)?;
    Ok(packages.len())
}

/// 依存パッケージをvendorディレクトリに配置する
///
/// # 処理フロー
/// 1. マニフェストを読み込む（なければ何もせずエラー）
/// 2. `cargo vendor --locked <vendor_dir>`を実行
/// 3. 全パッケージが配置されたことを確認
///
/// # 戻り値
/// 配置したパッケージ数
pub fn vendor(runner: &dyn ProcessRunner, project: &Project) -> Result<usize, VendorError> {
    let manifest = project.manifest();
    let packages = read_manifest(&manifest)?;
    let vendor_dir = project.vendor_dir();

    info!(
        manifest = %manifest.display(),
        package_count = packages.len(),
        vendor_dir = %vendor_dir.display(),
        "依存パッケージのvendoringを開始"
    );

    let command = CommandSpec::new("cargo")
        .arg("vendor")
        .arg("--locked")
        .arg(vendor_dir.display().to_string())
        .current_dir(project.root());

    let exit_code = runner.run(&command)?;
    if exit_code != 0 {
        warn!(exit_code = exit_code, "cargo vendorが失敗");
        return Err(VendorError::CommandFailed(exit_code));
    }

    verify(&vendor_dir, &packages)?;

    info!(package_count = packages.len(), "vendoring完了");
    Ok(packages.len())
}
