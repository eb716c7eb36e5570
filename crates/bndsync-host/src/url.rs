use std::path::Path;

use url::Url;

use crate::HostError;

/// Whether `path` names an archive that is mounted as a `jar:` root.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
}

/// URL under which `path` is registered as a library/content root.
///
/// Archives become `jar:file:///…!/` so entries inside them can be appended
/// (`…!/OSGI-OPT/src`); everything else is a plain `file:` URL.
pub fn root_url(path: &Path) -> Result<String, HostError> {
    let url = Url::from_file_path(path).map_err(|()| HostError::InvalidPath {
        path: path.to_path_buf(),
    })?;
    if is_archive(path) {
        Ok(format!("jar:{url}!/"))
    } else {
        Ok(url.to_string())
    }
}
