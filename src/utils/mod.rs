pub mod file;
pub mod prompt;

/// AWSの`credentials`ファイル用のトレイト
///
/// ファイルの内容をそのまま受け取り、書き込み時は同じ形式の文字列を返却する
pub trait AWSFileManager {
    fn new(raw: &str) -> Self;

    fn to_file(&self) -> String;
}
