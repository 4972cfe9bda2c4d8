use serde::{Deserialize, Serialize};

/// The credentials needed to act as a logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    /// Opaque token handed out by signup or login.
    pub token: String,
}

impl Session {
    pub fn new<U: ToString, T: ToString>(username: U, token: T) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use self::store::SessionStore;

#[cfg(not(target_arch = "wasm32"))]
mod store {
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use log::debug;

    use super::Session;
    use crate::error::{Result, SnoozeError};

    /// Persists a [`Session`] as json inside a directory.
    #[derive(Debug, Clone, Eq, PartialEq)]
    pub struct SessionStore {
        dir: PathBuf,
    }

    impl SessionStore {
        pub const FILE_NAME: &'static str = "session.json";

        pub fn new<T: AsRef<Path>>(dir: T) -> Self {
            Self {
                dir: dir.as_ref().to_path_buf(),
            }
        }

        pub fn path(&self) -> PathBuf {
            self.dir.join(Self::FILE_NAME)
        }

        /// The stored session, `None` if nothing was saved yet.
        pub async fn load(&self) -> Result<Option<Session>> {
            let content = match tokio::fs::read(self.path()).await {
                Ok(content) => content,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(error) => return Err(SnoozeError::SessionStore { error }),
            };
            let session = serde_json::from_slice(&content)
                .map_err(|error| SnoozeError::SessionFormat { error })?;
            Ok(Some(session))
        }

        /// Replace the stored session.
        pub async fn save(&self, session: &Session) -> Result<()> {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|error| SnoozeError::SessionStore { error })?;
            let json = serde_json::to_vec_pretty(session)
                .map_err(|error| SnoozeError::SessionFormat { error })?;
            tokio::fs::write(self.path(), json)
                .await
                .map_err(|error| SnoozeError::SessionStore { error })?;
            debug!("stored session of {} in {:?}", session.username, self.dir);
            Ok(())
        }

        /// Forget the stored session.
        pub async fn clear(&self) -> Result<()> {
            match tokio::fs::remove_file(self.path()).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(SnoozeError::SessionStore { error }),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn save_load_clear() {
            let dir = tempfile::tempdir().unwrap();
            let store = SessionStore::new(dir.path().join("nested"));

            assert_eq!(store.load().await.unwrap(), None);
            store.clear().await.unwrap();

            let session = Session::new("jane", "secret-token");
            store.save(&session).await.unwrap();
            assert_eq!(store.load().await.unwrap(), Some(session));

            store.clear().await.unwrap();
            assert_eq!(store.load().await.unwrap(), None);
        }

        #[tokio::test]
        async fn malformed_file() {
            let dir = tempfile::tempdir().unwrap();
            let store = SessionStore::new(dir.path());
            tokio::fs::write(store.path(), b"token=abc").await.unwrap();

            assert!(matches!(
                store.load().await,
                Err(SnoozeError::SessionFormat { .. })
            ));
        }
    }
}
