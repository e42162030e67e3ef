//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as resolving paths relative to a suite file and writing exports atomically.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如相对于套件文件解析路径以及原子地写入导出文件。

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolves a user-supplied path: expands `~` and environment variables, and
/// joins relative paths onto `base_dir`.
///
/// # Arguments
/// * `raw` - Path as written in the suite file
/// * `base_dir` - Directory relative paths are resolved against
pub fn resolve_path(raw: &str, base_dir: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base_dir.join(path))
    }
}

/// Writes `contents` to `path` through a temporary file in the same directory,
/// so readers never observe a half-written file. Parent directories are created.
///
/// 通过同目录下的临时文件将 `contents` 写入 `path`，
/// 读者不会看到写了一半的文件。会自动创建父目录。
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = parent_dir(path);
    if !parent.exists() {
        fs::create_dir_all(&parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut temp = tempfile::Builder::new()
        .prefix(".matrix_harness_")
        .tempfile_in(&parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    temp.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("Failed to move export into place: {}", path.display()))?;
    Ok(())
}

/// Directory containing `path`, or `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
