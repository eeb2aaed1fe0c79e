//! Output formats produced next to every source image.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    Jxl,
    Avif,
    Webp,
}

impl TargetFormat {
    /// Every target, in the order they are produced.
    pub const ALL: [TargetFormat; 3] = [TargetFormat::Jxl, TargetFormat::Avif, TargetFormat::Webp];

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jxl => "jxl",
            TargetFormat::Avif => "avif",
            TargetFormat::Webp => "webp",
        }
    }

    /// `photos/a.png` → `photos/a.<ext>`
    pub fn output_path(self, input: &Path) -> PathBuf {
        shared_utils::sibling_with_extension(input, self.extension())
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
