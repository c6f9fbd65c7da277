use std::{collections::HashMap, fmt::Display};

use thiserror::Error;
use tracing::{debug, warn};

use super::{ACCESS_KEY_ID, DEFAULT_PROFILE, SECRET_ACCESS_KEY};
use crate::utils::AWSFileManager;

/// プロファイルのブロックが不正な場合の理由
/// ファイル全体の読み込みは止めず、該当プロファイルのみ選択不可にする
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("incomplete credential block")]
    Incomplete,
    #[error("unrecognized key lines")]
    Unrecognized,
    #[error("missing {0} line")]
    Missing(&'static str),
    #[error("malformed key line")]
    Malformed,
}

/// ヘッダー直後の2行に入るキーの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    AccessKeyId,
    SecretAccessKey,
}

impl KeyField {
    /// ファイル上のキー名
    pub fn marker(&self) -> &'static str {
        match self {
            KeyField::AccessKeyId => ACCESS_KEY_ID,
            KeyField::SecretAccessKey => SECRET_ACCESS_KEY,
        }
    }

    /// 行に含まれるキー名から種別を判定
    pub fn detect(line: &str) -> Option<KeyField> {
        if line.contains(ACCESS_KEY_ID) {
            Some(KeyField::AccessKeyId)
        } else if line.contains(SECRET_ACCESS_KEY) {
            Some(KeyField::SecretAccessKey)
        } else {
            None
        }
    }

    /// `key = value`形式の行を生成
    pub fn format(&self, value: &str) -> String {
        format!("{} = {}", self.marker(), value)
    }
}

/// セクションヘッダーであればプロファイル名を返却
///
/// 前後の空白を除いた行に`[`とその後ろに`]`が含まれる場合をヘッダーとみなす.
/// 名称は括弧の内側をそのまま利用する (大文字小文字や空白の正規化はしない)
pub fn section_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let open = trimmed.find('[')?;
    let close = open + 1 + trimmed[open + 1..].find(']')?;
    Some(&trimmed[open + 1..close])
}

/// ヘッダー直後の2行から取り出したキー情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBlock {
    pub access_line: usize,
    pub secret_line: usize,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// `header`の位置にあるセクションのキー情報を取得
pub fn read_block(lines: &[String], header: usize) -> Result<KeyBlock, BlockError> {
    let first = header + 1;
    let second = header + 2;
    if second >= lines.len() {
        return Err(BlockError::Incomplete);
    }

    // 2行の並び順は問わない
    let (access_line, secret_line) = match (
        KeyField::detect(&lines[first]),
        KeyField::detect(&lines[second]),
    ) {
        (None, None) => return Err(BlockError::Unrecognized),
        (Some(KeyField::AccessKeyId), Some(KeyField::SecretAccessKey)) => (first, second),
        (Some(KeyField::SecretAccessKey), Some(KeyField::AccessKeyId)) => (second, first),
        (Some(KeyField::AccessKeyId), _) | (_, Some(KeyField::AccessKeyId)) => {
            return Err(BlockError::Missing(SECRET_ACCESS_KEY))
        }
        _ => return Err(BlockError::Missing(ACCESS_KEY_ID)),
    };

    Ok(KeyBlock {
        access_line,
        secret_line,
        access_key_id: key_value(&lines[access_line])?,
        secret_access_key: key_value(&lines[secret_line])?,
    })
}

/// 最初の`=`以降を値として取り出す
fn key_value(line: &str) -> Result<String, BlockError> {
    line.split_once('=')
        .map(|(_, value)| value.trim().to_string())
        .ok_or(BlockError::Malformed)
}

/// Credentialファイルの1セクション分の情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub validation_error: Option<BlockError>,
    // ヘッダーの行番号 (0始まり)
    pub header_line: usize,
}

impl Credential {
    /// ヘッダー位置からCredentialを生成
    /// ブロックが不正な場合はキーを空のままにしてエラーを保持する
    fn from_block(name: String, header_line: usize, lines: &[String]) -> Self {
        match read_block(lines, header_line) {
            Ok(block) => Credential {
                name,
                access_key_id: block.access_key_id,
                secret_access_key: block.secret_access_key,
                validation_error: None,
                header_line,
            },
            Err(err) => Credential {
                name,
                validation_error: Some(err),
                header_line,
                ..Default::default()
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error.is_none()
    }

    /// キーの組み合わせが一致するか
    /// 空の値は一致とみなさない
    pub fn same_keys(&self, other: &Credential) -> bool {
        self.is_valid()
            && other.is_valid()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && self.access_key_id == other.access_key_id
            && self.secret_access_key == other.secret_access_key
    }

    /// 一覧表示用にアクセスキーの末尾4文字以外を伏せる
    pub fn masked_access_key(&self) -> String {
        let chars = self.access_key_id.chars().collect::<Vec<char>>();
        if chars.len() <= 4 {
            return self.access_key_id.clone();
        }
        let tail = chars[chars.len() - 4..].iter().collect::<String>();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.validation_error {
            Some(err) => write!(f, "name: {}, invalid: {}", self.name, err),
            None => write!(
                f,
                "name: {}, access_key_id: {}",
                self.name,
                self.masked_access_key()
            ),
        }
    }
}

/// AWS Credentialファイル情報
///
/// `lines`がファイル書き込み時の正となる. `[default]`を書き換える際も
/// このバッファを行単位で置き換え、そのまま結合して出力する.
///
/// `activate`は`&mut self`を取るため、同一インスタンスへの切り替えは
/// 呼び出し側で直列化される.
#[derive(Debug, Clone)]
pub struct AWSCredentials {
    pub lines: Vec<String>,
    // `[default]`を除いたプロファイル
    pub profiles: HashMap<String, Credential>,
    pub default: Option<Credential>,
    pub current: Option<String>,
}

impl AWSCredentials {
    /// ファイルの内容から生成
    pub fn load(raw: &str) -> Self {
        // 改行コードは`\r`を行末に残したまま保持し、書き込み時にそのまま戻す
        let lines = raw.split('\n').map(String::from).collect::<Vec<String>>();

        let mut profiles = HashMap::<String, Credential>::new();
        let mut default: Option<Credential> = None;
        for (i, line) in lines.iter().enumerate() {
            let name = match section_name(line) {
                Some(name) => name,
                None => continue,
            };

            let cred = Credential::from_block(name.to_string(), i, &lines);
            match &cred.validation_error {
                Some(err) => warn!(
                    profile = %cred.name,
                    line = cred.header_line + 1,
                    "invalid credential block: {}",
                    err
                ),
                None => debug!(line = cred.header_line + 1, "credential block loaded: {}", cred),
            }

            // 同名のセクションが複数ある場合は先に現れたものを採用
            if name == DEFAULT_PROFILE {
                if default.is_some() {
                    warn!(line = i + 1, "duplicate [default] section ignored");
                    continue;
                }
                default = Some(cred);
            } else if profiles.contains_key(name) {
                warn!(profile = %name, line = i + 1, "duplicate profile section ignored");
            } else {
                profiles.insert(cred.name.clone(), cred);
            }
        }

        let mut credentials = AWSCredentials {
            lines,
            profiles,
            default,
            current: None,
        };
        credentials.current = credentials.resolve_current();
        credentials
    }

    /// ファイルの内容から再構築
    pub fn reload(&mut self, raw: &str) {
        *self = Self::load(raw);
    }

    /// `[default]`とキーが一致するプロファイルを探す
    ///
    /// 複数一致した場合は名称の昇順で最初のものを採用する
    fn resolve_current(&self) -> Option<String> {
        let default = self.default.as_ref()?;
        self.list_profiles()
            .into_iter()
            .find(|name| self.profiles[name].same_keys(default))
    }

    /// 選択用のプロファイル名一覧 (昇順)
    pub fn list_profiles(&self) -> Vec<String> {
        let mut names = self.profiles.keys().cloned().collect::<Vec<String>>();
        names.sort();
        names
    }

    /// 指定の名称のプロファイルを選択できるか確認
    pub fn is_selectable(&self, name: &str) -> bool {
        self.profiles
            .get(name)
            .map(|cred| cred.is_valid())
            .unwrap_or(false)
    }

    pub fn profile(&self, name: &str) -> Option<&Credential> {
        self.profiles.get(name)
    }

    /// 現在`[default]`と一致しているプロファイル名
    pub fn current_profile(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl AWSFileManager for AWSCredentials {
    fn new(raw: &str) -> Self {
        Self::load(raw)
    }

    /// ファイル出力用に行を結合
    fn to_file(&self) -> String {
        self.lines.join("\n")
    }
}
