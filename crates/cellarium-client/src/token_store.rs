// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the access/refresh token pair.
//!
//! Tokens are opaque strings. The store never inspects them; it only keeps
//! the two of them consistent. Partial saves write the supplied field and
//! leave the other one alone, which is what a token refresh relies on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cellarium_core::CellarError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Storage key for the access token.
pub const ACCESS_KEY: &str = "cellarium_access";
/// Storage key for the refresh token.
pub const REFRESH_KEY: &str = "cellarium_refresh";

/// The stored credentials. Either field may be absent.
#[derive(Debug, Default)]
pub struct TokenPair {
    pub access: Option<SecretString>,
    pub refresh: Option<SecretString>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(SecretString::from(access.into())),
            refresh: Some(SecretString::from(refresh.into())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

impl Clone for TokenPair {
    fn clone(&self) -> Self {
        Self {
            access: copy_secret(self.access.as_ref()),
            refresh: copy_secret(self.refresh.as_ref()),
        }
    }
}

/// A partial write. `None` fields are left untouched by [`TokenStore::save`].
#[derive(Debug, Default)]
pub struct TokenUpdate {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenUpdate {
    pub fn access(token: impl Into<String>) -> Self {
        Self {
            access: Some(token.into()),
            refresh: None,
        }
    }

    pub fn both(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }
}

#[derive(Debug)]
enum Backend {
    Memory,
    File(PathBuf),
}

/// On-disk layout: one JSON object holding both keys.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(rename = "cellarium_access", skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(rename = "cellarium_refresh", skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

/// Thread-safe token storage with an in-memory or JSON file backend.
///
/// The pair lives behind one mutex. File writes happen while the lock is
/// held and go through a temp file plus rename, so neither concurrent
/// readers nor a crash can observe half of an update.
#[derive(Debug)]
pub struct TokenStore {
    backend: Backend,
    pair: Mutex<TokenPair>,
}

impl TokenStore {
    /// A store that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            pair: Mutex::new(TokenPair::default()),
        }
    }

    /// Opens (or prepares to create) the token file at `path`.
    ///
    /// A missing or malformed file is an empty store, and the next save
    /// rewrites it. An unreadable one is a [`CellarError::Storage`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CellarError> {
        let path = path.into();
        let stored = read_file(&path)?;
        debug!(
            path = %path.display(),
            has_access = stored.access.is_some(),
            has_refresh = stored.refresh.is_some(),
            "token store opened"
        );
        Ok(Self {
            backend: Backend::File(path),
            pair: Mutex::new(TokenPair {
                access: stored.access.map(SecretString::from),
                refresh: stored.refresh.map(SecretString::from),
            }),
        })
    }

    /// Snapshot of the stored pair.
    pub fn load(&self) -> TokenPair {
        self.lock().clone()
    }

    pub fn access_token(&self) -> Option<SecretString> {
        copy_secret(self.lock().access.as_ref())
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        copy_secret(self.lock().refresh.as_ref())
    }

    /// True when an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.lock().access.is_some()
    }

    /// Writes the supplied fields. Empty strings count as not supplied.
    ///
    /// The in-memory pair is only replaced once the file write succeeded.
    pub fn save(&self, update: TokenUpdate) -> Result<(), CellarError> {
        let mut pair = self.lock();
        let mut next = pair.clone();
        if let Some(access) = update.access.filter(|t| !t.is_empty()) {
            next.access = Some(SecretString::from(access));
        }
        if let Some(refresh) = update.refresh.filter(|t| !t.is_empty()) {
            next.refresh = Some(SecretString::from(refresh));
        }

        if let Backend::File(path) = &self.backend {
            write_file(path, &next)?;
        }
        *pair = next;
        Ok(())
    }

    /// Removes both tokens.
    pub fn clear(&self) -> Result<(), CellarError> {
        let mut pair = self.lock();
        if let Backend::File(path) = &self.backend {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error(e)),
            }
        }
        *pair = TokenPair::default();
        Ok(())
    }

    /// The backing file, if this store persists to disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenPair> {
        // A panic while holding the lock cannot leave the pair half-written.
        self.pair.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn copy_secret(secret: Option<&SecretString>) -> Option<SecretString> {
    secret.map(|s| SecretString::from(s.expose_secret().to_owned()))
}

fn storage_error(err: impl std::error::Error + Send + Sync + 'static) -> CellarError {
    CellarError::Storage {
        source: Box::new(err),
    }
}

fn read_file(path: &Path) -> Result<StoredTokens, CellarError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoredTokens::default()),
        Err(e) => return Err(storage_error(e)),
    };
    if content.trim().is_empty() {
        return Ok(StoredTokens::default());
    }
    match serde_json::from_str(&content) {
        Ok(stored) => Ok(stored),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed token file");
            Ok(StoredTokens::default())
        }
    }
}

fn write_file(path: &Path, pair: &TokenPair) -> Result<(), CellarError> {
    let stored = StoredTokens {
        access: pair.access.as_ref().map(|s| s.expose_secret().to_owned()),
        refresh: pair.refresh.as_ref().map(|s| s.expose_secret().to_owned()),
    };
    let json = serde_json::to_vec_pretty(&stored).map_err(storage_error)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(storage_error)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(storage_error)?;
    restrict_permissions(&tmp)?;
    fs::rename(&tmp, path).map_err(storage_error)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CellarError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(storage_error)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CellarError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn exposed(secret: Option<SecretString>) -> Option<String> {
        secret.map(|s| s.expose_secret().to_owned())
    }

    #[test]
    fn partial_save_keeps_refresh() {
        let store = TokenStore::in_memory();
        store.save(TokenUpdate::both("a1", "r1")).unwrap();
        store.save(TokenUpdate::access("a2")).unwrap();
        assert_eq!(exposed(store.access_token()).as_deref(), Some("a2"));
        assert_eq!(exposed(store.refresh_token()).as_deref(), Some("r1"));
    }

    #[test]
    fn empty_strings_are_not_written() {
        let store = TokenStore::in_memory();
        store.save(TokenUpdate::both("a1", "r1")).unwrap();
        store.save(TokenUpdate::both("", "")).unwrap();
        assert_eq!(exposed(store.access_token()).as_deref(), Some("a1"));
        assert_eq!(exposed(store.refresh_token()).as_deref(), Some("r1"));
    }

    #[test]
    fn clear_removes_both() {
        let store = TokenStore::in_memory();
        store.save(TokenUpdate::both("a", "r")).unwrap();
        assert!(store.is_authenticated());
        store.clear().unwrap();
        assert!(store.load().is_empty());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn file_round_trip_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let store = TokenStore::open(&path).unwrap();
        assert!(store.load().is_empty());
        store.save(TokenUpdate::both("acc", "ref")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[ACCESS_KEY], "acc");
        assert_eq!(raw[REFRESH_KEY], "ref");

        let reopened = TokenStore::open(&path).unwrap();
        assert_eq!(exposed(reopened.refresh_token()).as_deref(), Some("ref"));
    }

    #[test]
    fn clear_deletes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = TokenStore::open(&path).unwrap();
        store.save(TokenUpdate::both("a", "r")).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();
    }

    #[test]
    fn malformed_file_opens_empty_and_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{not json").unwrap();

        let store = TokenStore::open(&path).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.load().is_empty());

        store.save(TokenUpdate::both("a1", "r1")).unwrap();
        let reopened = TokenStore::open(&path).unwrap();
        assert_eq!(exposed(reopened.access_token()).as_deref(), Some("a1"));
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = TokenStore::open(&path).unwrap();
        store.save(TokenUpdate::access("a")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    proptest! {
        #[test]
        fn saving_access_only_never_touches_refresh(
            access in "[A-Za-z0-9._-]{1,40}",
            refresh in "[A-Za-z0-9._-]{1,40}",
            next_access in "[A-Za-z0-9._-]{0,40}",
        ) {
            let store = TokenStore::in_memory();
            store.save(TokenUpdate::both(access.clone(), refresh.clone())).unwrap();
            store.save(TokenUpdate::access(next_access.clone())).unwrap();

            let pair = store.load();
            prop_assert_eq!(exposed(pair.refresh), Some(refresh));
            let expected_access = if next_access.is_empty() { access } else { next_access };
            prop_assert_eq!(exposed(pair.access), Some(expected_access));
        }
    }
}
