//! Auth token storage.
//!
//! The token is a single plain text credential. Setting it always
//! overwrites the previous value; nothing ever removes it.

use crate::error::MfError;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;
use tracing::debug;

/// Persists and retrieves the active auth token.
pub trait TokenStore: Send + Sync {
    /// Return the stored token, or [`MfError::NoToken`] when unset.
    fn get(&self) -> Result<String, MfError>;

    /// Store `token`, replacing any previous value.
    fn set(&self, token: &str) -> Result<(), MfError>;
}

/// Trim a token and reject empty values.
fn normalize(token: &str) -> Result<&str, MfError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(MfError::InvalidToken("token must not be empty".to_string()));
    }
    if token.contains(char::is_whitespace) {
        return Err(MfError::InvalidToken(
            "token must not contain whitespace".to_string(),
        ));
    }
    Ok(token)
}

/// Token stored in a plain text file inside the config directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<String, MfError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(MfError::NoToken),
            Err(e) => {
                return Err(MfError::TokenStorage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let token = contents.trim();
        if token.is_empty() {
            return Err(MfError::NoToken);
        }
        Ok(token.to_string())
    }

    fn set(&self, token: &str) -> Result<(), MfError> {
        let token = normalize(token)?;
        let storage_err = |e: std::io::Error| {
            MfError::TokenStorage(format!("failed to write {}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        // Written to a sibling file, then renamed over the token.
        let tmp = self.path.with_extension("tmp");
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let written = options.open(&tmp).and_then(|mut file| {
            std::io::Write::write_all(&mut file, token.as_bytes())?;
            file.sync_all()?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
            }
            Ok(())
        });
        if let Err(e) = written.and_then(|()| std::fs::rename(&tmp, &self.path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(storage_err(e));
        }
        debug!("Token written to {}", self.path.display());
        Ok(())
    }
}

/// In-memory token store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

#[cfg(test)]
impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<String, MfError> {
        self.token
            .lock()
            .map_err(|_| MfError::TokenStorage("token lock poisoned".to_string()))?
            .clone()
            .ok_or(MfError::NoToken)
    }

    fn set(&self, token: &str) -> Result<(), MfError> {
        let token = normalize(token)?;
        *self
            .token
            .lock()
            .map_err(|_| MfError::TokenStorage("token lock poisoned".to_string()))? =
            Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileTokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("mindflow").join("token"));
        (dir, store)
    }

    #[test]
    fn test_file_store_starts_unset() {
        let (_dir, store) = temp_store();
        assert!(matches!(store.get(), Err(MfError::NoToken)));
    }

    #[test]
    fn test_file_store_last_set_wins() {
        let (_dir, store) = temp_store();
        store.set("TOKEN1").unwrap();
        store.set("TOKEN2").unwrap();
        assert_eq!(store.get().unwrap(), "TOKEN2");
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "TOKEN2");
    }

    #[test]
    fn test_file_store_trims_token() {
        let (_dir, store) = temp_store();
        store.set("  abc.def.ghi\n").unwrap();
        assert_eq!(store.get().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_empty_token_rejected_and_previous_kept() {
        let (_dir, store) = temp_store();
        store.set("TOKEN1").unwrap();
        assert!(matches!(store.set("   "), Err(MfError::InvalidToken(_))));
        assert_eq!(store.get().unwrap(), "TOKEN1");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.set("secret").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_set_tightens_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "OLD").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.set("NEW").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get().unwrap(), "NEW");
    }

    #[test]
    fn test_set_leaves_no_temporary_file() {
        let (_dir, store) = temp_store();
        store.set("TOKEN1").unwrap();
        store.set("TOKEN2").unwrap();
        let names: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("token")]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::default();
        assert!(matches!(store.get(), Err(MfError::NoToken)));
        store.set("TOKEN1").unwrap();
        store.set("TOKEN2").unwrap();
        assert_eq!(store.get().unwrap(), "TOKEN2");
    }
}
