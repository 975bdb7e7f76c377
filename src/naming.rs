//! Display names and export filenames.
//!
//! Every item gets a display name from its source file: the filename with its
//! last extension removed. Items are never renamed individually; the only
//! rename is a batch-wide prefix that switches export names to numbered ones:
//!
//! | Prefix | Item 3, display name `IMG_0042`, WebP |
//! |---|---|
//! | `""` or whitespace | `IMG_0042.webp` |
//! | `"holiday-"` | `holiday-3.webp` |

use crate::imaging::OutputFormat;
use std::collections::HashSet;
use std::path::Path;

/// Display name for a source path: the file name minus its last extension.
///
/// - `"/a/IMG_0042.JPG"` → `"IMG_0042"`
/// - `"archive.tar.png"` → `"archive.tar"`
/// - `"README"` → `"README"`
///
/// A name that would come out empty (`".png"`) keeps its full file name.
pub fn display_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) if dot + 1 < file_name.len() => file_name[..dot].to_string(),
        Some(_) => file_name,
    }
}

/// Export filename for the item at 0-based `index`.
///
/// With a non-blank prefix the name is `{prefix}{index + 1}.{ext}`,
/// otherwise `{display_name}.{ext}`. Surrounding whitespace is trimmed off
/// the prefix.
pub fn export_filename(
    prefix: &str,
    index: usize,
    display_name: &str,
    format: OutputFormat,
) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        format!("{}.{}", display_name, format.extension())
    } else {
        format!("{}{}.{}", prefix, index + 1, format.extension())
    }
}

/// Make `name` unique within `taken` by inserting `-2`, `-3`, ... before the
/// extension, then record it.
pub fn dedupe_filename(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot..]),
        None => (name.as_str(), ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
