use std::env;
use std::path::{Path, PathBuf};
use urlencoding::decode;

/// Normalise the input path handed over by a host. Hosts may pass a
/// `file://` URI or a path relative to their own working directory; bap gets
/// an absolute path either way. Paths that do not exist are made absolute
/// but otherwise left alone.
pub fn normalize_input_path(source_path: &str) -> PathBuf {
    let mut path_str = source_path.trim().to_string();

    if let Some(rest) = path_str.strip_prefix("file://") {
        let decoded = decode(rest).map(|d| d.into_owned()).unwrap_or_else(|_| rest.to_string());
        path_str = decoded;

        // file:///C:/... leaves /C:/... behind on Windows
        if cfg!(windows) && path_str.starts_with('/') && path_str.chars().nth(2) == Some(':') {
            path_str.remove(0);
        }
    }

    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().unwrap_or_default().join(path)
    };

    // dunce keeps Windows paths free of the \\?\ prefix, which bap cannot open
    dunce::canonicalize(&absolute).unwrap_or(absolute)
}
