//! Common Utilities Module
//!
//! 通用工具函数集合：扩展名处理、命令行路径参数、命令字符串格式化。

use std::borrow::Cow;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════
// 文件路径工具 (Path helpers)
// ═══════════════════════════════════════════════════════════════

/// 安全地获取文件扩展名（小写）
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::get_extension_lowercase;
///
/// assert_eq!(get_extension_lowercase(Path::new("test.JPG")), "jpg");
/// assert_eq!(get_extension_lowercase(Path::new("noext")), "");
/// ```
pub fn get_extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// 检查文件扩展名是否在给定列表中（不区分大小写）
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::has_extension;
///
/// let extensions = &["jpg", "png", "gif"];
/// assert!(has_extension(Path::new("photo.JPG"), extensions));
/// assert!(!has_extension(Path::new("scan.bmp"), extensions));
/// ```
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = get_extension_lowercase(path);
    !ext.is_empty() && extensions.contains(&ext.as_str())
}

/// Path with its extension removed (`photos/a.png` → `photos/a`).
pub fn base_name(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Sibling path sharing the base name, with `ext` appended.
/// Only the last extension is replaced: `v1.2.png` → `v1.2.webp`.
pub fn sibling_with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = base_name(path).into_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Sanitizes a file path for command-line usage.
///
/// `magick` and `ffmpeg` do not honour `--`, so a relative path starting with
/// '-' gets a `./` prefix to keep it from being parsed as a flag.
pub fn safe_path_arg(path: &Path) -> Cow<'_, str> {
    let s = path.to_string_lossy();
    if s.starts_with('-') {
        Cow::Owned(format!("./{}", s))
    } else {
        s
    }
}

/// 格式化命令字符串（用于日志）
pub fn format_command_string(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}
