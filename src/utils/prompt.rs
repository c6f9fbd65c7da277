use dialoguer::{
    console::{style, Style, Term},
    theme::ColorfulTheme,
    Select,
};
use std::{
    io::{self, Write},
    str,
};

/// ターミナルへの出力と選択メニューの表示
pub struct Prompter {
    pub term: Term,
}

impl Prompter {
    pub fn new() -> Prompter {
        Prompter::with_term(Term::stderr())
    }

    pub fn with_term(term: Term) -> Prompter {
        Prompter { term }
    }

    pub fn flush(&self) {
        let term = self.term.clone();
        // Ctrl+Cを検知してターミナルのカーソルを戻す
        let _ = ctrlc::set_handler(move || {
            let _ = term.show_cursor();
            let _ = term.flush();
        });
    }

    /// 選択用のプロンプトを表示
    /// キャンセルされた場合は`None`、端末が使えない場合はエラー
    pub fn select_prompt(
        &self,
        selections: &[String],
        default: usize,
        msg: &str,
    ) -> io::Result<Option<usize>> {
        // 端末でない場合はキー入力を受け取れず選択が終わらない
        if !self.term.is_term() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "the profile menu needs a terminal; pass --profile instead",
            ));
        }
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(msg)
            .default(default)
            .items(selections)
            .interact_on_opt(&self.term)
    }

    fn write_line(&self, line: &str) {
        let _ = self.term.write_line(line);
    }

    /// 通常の文字列を表示
    pub fn standard(&self, msg: &str) {
        self.write_line(msg);
    }

    /// キーバリュー形式で表示
    pub fn keyvalue(&self, key: &str, value: &str) {
        let style = Style::new().for_stderr().blue();
        self.write_line(&format!("{}: {}", key, style.apply_to(value)));
    }

    /// 成功時の文字列を表示
    pub fn success(&self, msg: &str) {
        let prefix = style("✔".to_string()).for_stderr().green();
        self.write_line(&format!("{} {}", prefix, msg));
    }

    /// エラーの文字列を表示
    pub fn error(&self, msg: &str) {
        let prefix = style("✘".to_string()).for_stderr().red();
        let style = Style::new().for_stderr().red();
        self.write_line(&format!("{} {}", prefix, style.apply_to(msg)));
    }
}

/// prettytableの出力を行単位で受け取るためのバッファ
pub struct StringWriter {
    string: String,
}

impl StringWriter {
    pub fn new() -> StringWriter {
        StringWriter {
            string: String::new(),
        }
    }

    /// 末尾の空行を除いた出力
    pub fn trimmed(&self) -> &str {
        self.string.trim_end_matches('\n')
    }
}

impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let string = str::from_utf8(data).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Cannot decode utf8 string : {}", e),
            )
        })?;
        self.string.push_str(string);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
