// stepscore-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Write content to a file atomically using a temporary file.
///
/// The temp file lives in the target's directory so the final rename never
/// crosses filesystems. Readers see either the old file or the complete new
/// one, never a half-written table.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Serializes `data` as pretty JSON and writes it atomically.
pub fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| InfrastructureError::ConfigError(format!("Serialization: {}", e)))?;
    atomic_write(path, content)
}
