use std::io;

use thiserror::Error;
use tracing::info;

use super::credentials::{
    read_block, section_name, AWSCredentials, BlockError, Credential, KeyField,
};
use super::DEFAULT_PROFILE;

/// `[default]`の切り替え時のエラー
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("profile `{0}` does not exist")]
    ProfileNotFound(String),
    #[error("profile `{name}` cannot be used: {reason}")]
    ProfileInvalid { name: String, reason: BlockError },
    #[error("[default] section is missing from the credentials file")]
    DefaultSectionMissing,
    #[error("[default] section is malformed: {0}")]
    DefaultSectionMalformed(BlockError),
    #[error("failed to write credentials: {0}")]
    Io(#[from] io::Error),
}

impl AWSCredentials {
    /// 指定のプロファイルのキーを`[default]`に設定し、`persist`で書き込む
    ///
    /// 書き込みに成功した場合のみ`lines`と現在のプロファイルを更新する.
    /// 失敗した場合はディスクの状態が不明なため、呼び出し側で再読み込みすること.
    pub fn activate<F>(&mut self, name: &str, persist: F) -> Result<String, ActivationError>
    where
        F: FnOnce(&str) -> io::Result<()>,
    {
        let cred = self
            .profiles
            .get(name)
            .ok_or_else(|| ActivationError::ProfileNotFound(name.to_string()))?;
        // 不正なプロファイルはdefaultにしない
        if let Some(reason) = &cred.validation_error {
            return Err(ActivationError::ProfileInvalid {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        let access_key_id = cred.access_key_id.clone();
        let secret_access_key = cred.secret_access_key.clone();

        let header = self
            .lines
            .iter()
            .position(|line| section_name(line) == Some(DEFAULT_PROFILE))
            .ok_or(ActivationError::DefaultSectionMissing)?;
        // 行の並び順はファイルのまま維持するため、キー名から書き換え先を判定する
        let block =
            read_block(&self.lines, header).map_err(ActivationError::DefaultSectionMalformed)?;

        let mut lines = self.lines.clone();
        replace_line(
            &mut lines[block.access_line],
            KeyField::AccessKeyId.format(&access_key_id),
        );
        replace_line(
            &mut lines[block.secret_line],
            KeyField::SecretAccessKey.format(&secret_access_key),
        );

        persist(&lines.join("\n"))?;

        self.lines = lines;
        self.default = Some(Credential {
            name: DEFAULT_PROFILE.to_string(),
            access_key_id,
            secret_access_key,
            validation_error: None,
            header_line: header,
        });
        self.current = Some(name.to_string());
        info!(profile = %name, "default profile switched");

        Ok(name.to_string())
    }
}

/// 行を置き換える. 元の行が`\r\n`で終わっていた場合は`\r`を残す
fn replace_line(line: &mut String, mut new_line: String) {
    if line.ends_with('\r') {
        new_line.push('\r');
    }
    *line = new_line;
}
