use std::io;

use super::credentials::AWSCredentials;
use crate::utils::prompt::Prompter;

/// 現在のプロファイルに付ける印
pub const CURRENT_MARK: &str = "*";

/// メニューに表示するラベルを生成
/// 現在のプロファイルには印を付け、選択できないものは理由を添える
pub fn menu_labels(credentials: &AWSCredentials) -> Vec<String> {
    let current = credentials.current_profile();
    credentials
        .list_profiles()
        .iter()
        .map(|name| {
            let mark = if current == Some(name.as_str()) {
                CURRENT_MARK
            } else {
                " "
            };
            match credentials
                .profile(name)
                .and_then(|cred| cred.validation_error.as_ref())
            {
                Some(err) => format!("{} {} ({})", mark, name, err),
                None => format!("{} {}", mark, name),
            }
        })
        .collect::<Vec<String>>()
}

/// プロファイルのリストから選択、または指定の名称をそのまま返却する
/// 存在確認は切り替え処理側で行う
/// 選択がキャンセルされた場合は`None`
pub fn selection_profile_name(
    credentials: &AWSCredentials,
    profile: Option<String>,
    prompter: &Prompter,
) -> io::Result<Option<String>> {
    if profile.is_some() {
        return Ok(profile);
    }

    let selections = credentials.list_profiles();
    // 0件の場合はメッセージを表示して終了
    if selections.is_empty() {
        prompter.error("No profile is registered in the credentials file.");
        return Ok(None);
    }

    // 現在のプロファイルを初期選択にする
    let default = credentials
        .current_profile()
        .and_then(|current| selections.iter().position(|name| name == current))
        .unwrap_or(0);

    let selected = prompter.select_prompt(
        &menu_labels(credentials),
        default,
        "Please select the profile you want to use",
    )?;
    Ok(selected.map(|index| selections[index].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::credentials::tests::FIXTURE;

    #[test]
    fn test_menu_labels_mark_current() {
        let credentials = AWSCredentials::load(FIXTURE);
        assert_eq!(menu_labels(&credentials), vec!["  personal", "* work"]);
    }

    #[test]
    fn test_menu_labels_show_invalid_reason() {
        let raw = format!("{}[broken]", FIXTURE);
        let credentials = AWSCredentials::load(&raw);
        assert_eq!(
            menu_labels(&credentials),
            vec![
                "  broken (incomplete credential block)",
                "  personal",
                "* work"
            ]
        );
    }

    #[test]
    fn test_selection_with_explicit_profile_skips_menu() {
        let credentials = AWSCredentials::load(FIXTURE);
        let prompter = Prompter::new();
        let name = selection_profile_name(&credentials, Some("personal".to_string()), &prompter);
        assert_eq!(name.unwrap(), Some("personal".to_string()));
    }

    #[test]
    fn test_selection_without_profiles() {
        let credentials = AWSCredentials::load("");
        let prompter = Prompter::new();
        assert_eq!(
            selection_profile_name(&credentials, None, &prompter).unwrap(),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_selection_menu_without_terminal_is_error() {
        use dialoguer::console::Term;

        let credentials = AWSCredentials::load(FIXTURE);
        let term = Term::read_write_pair(
            tempfile::tempfile().unwrap(),
            tempfile::tempfile().unwrap(),
        );
        let prompter = Prompter::with_term(term);
        assert!(selection_profile_name(&credentials, None, &prompter).is_err());
    }
}
