use thiserror::Error;
use std::path::{Path, PathBuf};

/// 自定义错误类型
///
/// 错误分级约定：
/// - 文件级错误（StructuralMismatch / StaleTranslationSet）使该文件的操作整体失败，
///   其他文件不受影响
/// - 条目级错误（EncodingError / FieldOverflow）采用 fail-fast 策略：
///   应用在写盘之前中止，原文件保持原样
#[derive(Error, Debug)]
pub enum GameTextError {
    #[error("Structural mismatch in {file} at offset {offset}: {reason}")]
    StructuralMismatch {
        file: String,
        offset: usize,
        reason: String,
    },

    #[error("Stale translation set for {file}: {detail}")]
    StaleTranslationSet { file: String, detail: String },

    #[error("Encoding error at {anchor}: text cannot be represented as {encoding}")]
    EncodingError {
        anchor: String,
        encoding: &'static str,
    },

    #[error("Field overflow at {anchor}: {actual} bytes exceed field width {width}")]
    FieldOverflow {
        anchor: String,
        width: usize,
        actual: usize,
    },

    #[error("Translation provider failure: {0}")]
    ProviderFailure(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Invalid anchor id: {0}")]
    InvalidAnchor(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 创建文件备份
///
/// 备份策略：
/// - 首次备份写入 `<原文件名>.bak`，之后永不覆盖（保留最初的原始版本）
/// - `.bak` 已存在时，后续备份使用带时间戳的 `<原文件名>.<时间戳>.bak`
pub fn create_backup(file_path: &Path) -> Result<PathBuf, GameTextError> {
    if !file_path.exists() {
        return Err(GameTextError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在",
        )));
    }

    let primary = backup_path_for(file_path, None);
    let backup_path = if primary.exists() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
        backup_path_for(file_path, Some(&timestamp))
    } else {
        primary
    };

    std::fs::copy(file_path, &backup_path).map_err(GameTextError::IoError)?;

    Ok(backup_path)
}

/// 拼接备份文件路径
fn backup_path_for(file_path: &Path, timestamp: Option<&str>) -> PathBuf {
    let mut name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match timestamp {
        Some(ts) => name.push_str(&format!(".{}.bak", ts)),
        None => name.push_str(".bak"),
    }
    file_path.with_file_name(name)
}

/// 原子替换目标文件
///
/// 先把完整内容写入同目录下的临时文件，再 rename 覆盖目标，
/// 中途崩溃不会留下半写状态的目标文件。
pub fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), GameTextError> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tmp_name.push_str(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, bytes)?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(GameTextError::IoError(e));
    }

    Ok(())
}
