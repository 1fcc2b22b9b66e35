// src/process/write.rs
use serde::Serialize;
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::error::TransformError;

/// Serialize `value` as compact JSON and move it over `path` in one rename.
///
/// The temporary file lives beside `path`, so a failed write leaves any
/// previous output untouched. A replaced file keeps its permissions; a new
/// one gets the umask default like any plainly created file. Returns the
/// number of bytes written.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
) -> Result<u64, TransformError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |e: io::Error| TransformError::io(path, e);

    let mut builder = tempfile::Builder::new();
    builder.prefix(".csvdag-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // masked by the umask at creation, unlike the 0600 default
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(io_err)?;
    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), existing.permissions()).map_err(io_err)?;
    }
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut w, value).map_err(|e| io_err(e.into()))?;
        w.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    let bytes = tmp.as_file().metadata().map_err(io_err)?.len();

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(bytes)
}
