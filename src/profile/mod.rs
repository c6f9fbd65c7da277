use self::credentials::AWSCredentials;
use self::select::{selection_profile_name, CURRENT_MARK};
use self::switcher::ActivationError;
use crate::utils;
use crate::utils::prompt::{Prompter, StringWriter};
use prettytable::{cell, format, row, Table};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
pub mod credentials;
pub mod select;
pub mod switcher;

pub const CREDENTIAL_FILE_NAME: &str = "credentials";
/// 現在利用中の認証情報を保持するセクション名
pub const DEFAULT_PROFILE: &str = "default";
pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";

/// 対象の`credentials`ファイルのパス
/// 指定がない場合は`~/.aws/credentials`
pub fn credential_path(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(p),
        None => Ok(utils::file::aws_file_path(CREDENTIAL_FILE_NAME)?),
    }
}

/// 利用するプロファイルを選択し、`[default]`に設定する
pub fn use_profile(
    path: &Path,
    profile: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompter = Prompter::new();
    // Ctrl+Cのハンドラーを登録
    prompter.flush();

    // credentialsファイル読み込み
    let mut credentials = read_credential(path)?;

    // 対象のプロファイル名
    let name = match selection_profile_name(&credentials, profile, &prompter)? {
        Some(name) => name,
        None => return Ok(()),
    };

    // 既に選択中の場合も書き込みは行う (内容は変わらない)
    let current = match credentials.activate(&name, |data| utils::file::write(path, data)) {
        Ok(current) => current,
        Err(err) => {
            error!(profile = %name, "failed to switch default profile: {}", err);
            if let ActivationError::Io(_) = err {
                reload_after_failed_write(&mut credentials, path);
            }
            return Err(err.into());
        }
    };

    prompter.success(format!("Switched [default] to `{}`", current).as_str());
    Ok(())
}

/// 書き込み失敗時はディスクの状態が不明なため読み直してログに残す
/// 読み直しにも失敗した場合はログのみとし、書き込みのエラーを優先する
fn reload_after_failed_write(credentials: &mut AWSCredentials, path: &Path) {
    match utils::file::read_to_string(path) {
        Ok(raw) => {
            credentials.reload(&raw);
            warn!(
                current = ?credentials.current_profile(),
                "credentials reloaded after failed write"
            );
        }
        Err(err) => warn!("failed to reload credentials after failed write: {}", err),
    }
}

/// 登録されているプロファイルの一覧を表示する
pub fn list(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let prompter = Prompter::new();

    // credentialsファイル読み込み
    let credentials = read_credential(path)?;
    let current = credentials.current_profile();

    // 表示するためのテーブル
    let mut table = Table::new();
    table.set_titles(row![
        cell!(""),
        cell!("NAME"),
        cell!("ACCESS KEY"),
        cell!("STATUS")
    ]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for name in credentials.list_profiles() {
        let cred = match credentials.profile(&name) {
            Some(cred) => cred,
            None => continue,
        };
        let used = if current == Some(name.as_str()) {
            CURRENT_MARK
        } else {
            ""
        };
        let status = if credentials.is_selectable(&name) {
            "ok".to_string()
        } else {
            cred.validation_error
                .as_ref()
                .map(|err| err.to_string())
                .unwrap_or_default()
        };

        table.add_row(row![
            cell!(used),
            cell!(name),
            cell!(cred.masked_access_key()),
            cell!(status),
        ]);
    }

    // コンソールに出力
    let mut writer = StringWriter::new();
    table.print(&mut writer)?;
    prompter.standard(writer.trimmed());

    Ok(())
}

/// 現在`[default]`と一致しているプロファイルを表示する
pub fn current(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let prompter = Prompter::new();

    let credentials = read_credential(path)?;
    match credentials.current_profile() {
        Some(name) => prompter.keyvalue("Current profile", name),
        None => prompter.error("No profile matches the [default] section."),
    }

    Ok(())
}

/// `credentials`ファイル読み込み
pub fn read_credential(path: &Path) -> Result<AWSCredentials, Box<dyn std::error::Error>> {
    let credentials = utils::file::read::<AWSCredentials>(path)?;
    debug!(
        profiles = credentials.profiles.len(),
        current = ?credentials.current_profile(),
        "credentials loaded"
    );
    Ok(credentials)
}
