use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing_subscriber::EnvFilter;

mod profile;
mod utils;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    // サブコマンド
    #[clap(subcommand)]
    sub: Option<CliSubCommand>,

    /// Path of the shared credentials file (default: ~/.aws/credentials)
    #[clap(short, long, global = true, env = "AWS_SHARED_CREDENTIALS_FILE")]
    credentials: Option<PathBuf>,

    // サブコマンドなしでプロファイルを切り替えるための任意オプション
    /// Profile to set as [default]
    #[clap(short, long)]
    profile: Option<String>,
}

// サブコマンドに対する処理
#[derive(Subcommand, Debug)]
enum CliSubCommand {
    /// Select the profile to set as [default]
    Use {
        /// Profile to be used
        #[clap(short, long)]
        profile: Option<String>,
    },
    /// List profiles from credentials
    Ls {},
    /// Show the profile currently set as [default]
    Current {},
}

fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = profile::credential_path(args.credentials)?;

    // サブコマンドが指定されていない場合はプロファイルの切り替えを行う
    match args.sub {
        Some(CliSubCommand::Use { profile }) => profile::use_profile(&path, profile),
        Some(CliSubCommand::Ls {}) => profile::list(&path),
        Some(CliSubCommand::Current {}) => profile::current(&path),
        None => profile::use_profile(&path, args.profile),
    }
}

fn main() {
    // ログ出力は`RUST_LOG`で変更可能. 表示を崩さないように標準エラーへ出力
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 引数を取得
    let args = Cli::parse();

    if let Err(err) = run(args) {
        utils::prompt::Prompter::new().error(err.to_string().as_str());
        exit(1);
    }
}
