use std::{
    ffi::OsString,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use super::AWSFileManager;

/// AWSのファイルを格納するディレクトリ名
pub const AWS_DIR_NAME: &str = ".aws";

/// ファイル読み込み時のエラー
#[derive(Debug, Error)]
pub enum FileError {
    #[error("could not determine the home directory")]
    NoHomeDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },
}

/// `~/.aws/<file_name>`のパスを取得
pub fn aws_file_path(file_name: &str) -> Result<PathBuf, FileError> {
    dirs::home_dir()
        .map(|home| home.join(AWS_DIR_NAME).join(file_name))
        .ok_or(FileError::NoHomeDir)
}

/// ファイルの内容を文字列で取得
pub fn read_to_string(path: &Path) -> Result<String, FileError> {
    let bytes = fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "file loaded");
    Ok(raw)
}

/// ファイルを読み込み、`T`として返却
pub fn read<T: AWSFileManager>(path: &Path) -> Result<T, FileError> {
    Ok(T::new(&read_to_string(path)?))
}

/// ファイル書き込み
///
/// 同じディレクトリの一時ファイルに書き込んでから置き換えるため、
/// 途中で失敗しても元のファイルは壊れない. 既存ファイルの権限は引き継ぐ.
/// シンボリックリンクの場合はリンク先を書き換え、リンク自体は残す.
pub fn write(path: &Path, data: &str) -> io::Result<()> {
    let target = resolve_link(path)?;
    let file_name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file path", target.display()),
        )
    })?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = target.with_file_name(tmp_name);

    let result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        if let Ok(meta) = fs::metadata(&target) {
            file.set_permissions(meta.permissions())?;
        }
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    debug!(
        path = %path.display(),
        target = %target.display(),
        ok = result.is_ok(),
        "file written"
    );
    result
}

/// シンボリックリンクであればリンク先の実体のパスを返却
fn resolve_link(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::credentials::AWSCredentials;
    use tempfile::tempdir;

    const CONTENT: &str = "[default]
aws_access_key_id = AAA
aws_secret_access_key = SSS
[work]
aws_access_key_id = AAA
aws_secret_access_key = SSS
";

    #[test]
    fn test_read_credentials() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("credentials");
        fs::write(&path, CONTENT).unwrap();

        let credentials = read::<AWSCredentials>(&path).unwrap();
        assert_eq!(credentials.current_profile(), Some("work"));
        assert_eq!(credentials.to_file(), CONTENT);
    }

    #[test]
    fn test_read_missing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing");

        let result = read::<AWSCredentials>(&path);
        assert!(matches!(result, Err(FileError::Read { .. })));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("credentials");
        fs::write(&path, [0x5b, 0xff, 0xfe, 0x5d]).unwrap();

        let result = read::<AWSCredentials>(&path);
        assert!(matches!(result, Err(FileError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_write_replaces_file_without_leftovers() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("credentials");
        fs::write(&path, "old").unwrap();

        write(&path, CONTENT).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), CONTENT);
        let entries = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("credentials");

        assert!(write(&path, CONTENT).is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let path = temp.path().join("credentials");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write(&path, CONTENT).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink_updates_target() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let real = temp.path().join("real_credentials");
        let link = temp.path().join("credentials");
        fs::write(&real, "old").unwrap();
        symlink(&real, &link).unwrap();

        write(&link, CONTENT).unwrap();

        assert!(fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), CONTENT);
        assert_eq!(fs::read_to_string(&link).unwrap(), CONTENT);
        // 一時ファイルは残らない
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_aws_file_path() {
        if let Ok(path) = aws_file_path("credentials") {
            assert!(path.ends_with(".aws/credentials"));
        }
    }
}
