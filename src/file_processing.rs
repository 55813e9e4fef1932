use anyhow::Context;

/// Extensions (lowercase, without the dot) the tool knows how to tag.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Result of walking the photos directory.
#[derive(Debug, Default)]
pub struct PhotoScan {
    /// Supported photos, sorted by path.
    pub photos: Vec<std::path::PathBuf>,
    /// Count of skipped files per lowercase extension, `""` for none.
    pub unsupported: std::collections::BTreeMap<String, usize>,
}

/// Checks that the photos directory exists and is a directory.
///
/// # Arguments
/// * `path` - Directory to check.
///
/// # Returns
/// * `anyhow::Result<()>` - Ok if the path is a usable directory.
pub fn check_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Photos directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Photos path is not a directory: {}", path.display());
    }
    Ok(())
}

fn extension_of(path: &std::path::Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Recursively collects the photos under `dir`.
///
/// Files with a `.jpg`/`.jpeg` extension (any case) are kept; everything else
/// is only counted by extension.
///
/// # Arguments
/// * `dir` - Root of the photo tree.
///
/// # Returns
/// * `anyhow::Result<PhotoScan>` - Photos found plus counts of skipped extensions.
pub fn collect_photos<P: AsRef<std::path::Path>>(dir: P) -> anyhow::Result<PhotoScan> {
    let mut scan = PhotoScan::default();
    let mut pending = vec![dir.as_ref().to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {}", current.display()))?;

        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read entry in {}", current.display()))?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            let extension = extension_of(&path);
            if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                scan.photos.push(path);
            } else {
                let key = if extension.is_empty() {
                    String::new()
                } else {
                    format!(".{}", extension)
                };
                *scan.unsupported.entry(key).or_insert(0) += 1;
            }
        }
    }

    scan.photos.sort();
    Ok(scan)
}

/// Path of the backup written for `path`: the file name with `.bak` appended.
pub fn backup_path<P: AsRef<std::path::Path>>(path: P) -> std::path::PathBuf {
    let mut name = path.as_ref().as_os_str().to_os_string();
    name.push(".bak");
    std::path::PathBuf::from(name)
}

/// Copies `path` to `<path>.bak`, overwriting an older backup.
///
/// # Returns
/// * `anyhow::Result<PathBuf>` - Location of the backup.
pub fn backup_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<std::path::PathBuf> {
    let source = path.as_ref();
    let destination = backup_path(source);
    std::fs::copy(source, &destination).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    Ok(destination)
}
