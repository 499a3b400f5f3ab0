//! The signed-in session, kept on disk between runs.

use std::{fs, io, path::Path};

use engine::Session;

use crate::GatewayError;

fn io_error(path: &Path, err: io::Error) -> GatewayError {
    GatewayError::SessionFile(format!("{}: {err}", path.display()))
}

/// Read a stored session. A missing or unreadable file means signed out.
pub fn load(path: &Path) -> Result<Option<Session>, GatewayError> {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!("ignoring unreadable session file {}: {err}", path.display());
                Ok(None)
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path, err)),
    }
}

/// Write `session`, or remove the file when signed out.
pub fn store(path: &Path, session: Option<&Session>) -> Result<(), GatewayError> {
    let Some(session) = session else {
        return match fs::remove_file(path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(io_error(path, err)),
            _ => Ok(()),
        };
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| io_error(path, err))?;
    }
    let payload = serde_json::to_string_pretty(session)
        .map_err(|err| GatewayError::SessionFile(err.to_string()))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, payload).map_err(|err| io_error(path, err))?;
    fs::rename(&tmp, path).map_err(|err| io_error(path, err))?;
    Ok(())
}
