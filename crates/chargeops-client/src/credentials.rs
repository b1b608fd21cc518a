//! Session credential providers
//!
//! The client never reads ambient state; it asks an injected
//! [`CredentialProvider`] for the bearer token on every request.

use crate::error::ClientResult;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, Secret, SecretString};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of the session bearer token
pub trait CredentialProvider: Send + Sync {
    /// Current token, if logged in
    fn bearer(&self) -> Option<SecretString>;

    /// Store a token after login
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    fn set(&self, token: SecretString) -> ClientResult<()>;

    /// Forget the token
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be removed.
    fn clear(&self) -> ClientResult<()>;
}

/// Token held only for the life of the process
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentials {
    /// Create an empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider already holding a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(Secret::new(token.into()))),
        }
    }
}

impl CredentialProvider for MemoryCredentials {
    fn bearer(&self) -> Option<SecretString> {
        self.token.read().clone()
    }

    fn set(&self, token: SecretString) -> ClientResult<()> {
        *self.token.write() = Some(token);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token persisted in a file between runs
///
/// The file is read once on creation and rewritten on every [`set`]. On unix
/// it is created with mode `0600`.
///
/// [`set`]: CredentialProvider::set
#[derive(Debug)]
pub struct FileCredentials {
    path: PathBuf,
    cached: RwLock<Option<SecretString>>,
}

impl FileCredentials {
    /// Open the token file, which need not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let cached = match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| Secret::new(token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), present = cached.is_some(), "Opened token file");
        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }

    /// Location of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(token.as_bytes())?;
        file.sync_all()
    }
}

impl CredentialProvider for FileCredentials {
    fn bearer(&self) -> Option<SecretString> {
        self.cached.read().clone()
    }

    fn set(&self, token: SecretString) -> ClientResult<()> {
        self.write_file(token.expose_secret())?;
        *self.cached.write() = Some(token);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *self.cached.write() = None;
        Ok(())
    }
}
