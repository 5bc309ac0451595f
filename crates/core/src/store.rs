//! Persistent tale store.
//!
//! Tales are stored as JSON documents in a sharded directory structure:
//!
//! ```text
//! tales/
//!   <s1>/
//!     <s2>/
//!       <32hex-id>/
//!         tale.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the tale id.
//!
//! ## Atomicity
//!
//! All mutations run behind a single store-level mutex, so read-modify-write
//! sequences (like toggling a like) cannot interleave and lose updates.
//! Documents are written to a temporary file and renamed into place, so a
//! concurrent lock-free read observes either the old or the new document,
//! never a torn one.
//!
//! ## Pure data operations
//!
//! This module contains **only** data operations. Ownership and visibility
//! rules live in [`crate::service`]; HTTP concerns live in `api-rest`.

use crate::config::FableConfig;
use crate::error::{TaleError, TaleResult};
use crate::tale::{Tale, TaleId};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Document filename inside each tale directory.
const TALE_FILE_NAME: &str = "tale.json";

/// File-backed tale store.
///
/// Cheap to clone; clones share the same mutation lock.
#[derive(Clone, Debug)]
pub struct TaleStore {
    cfg: Arc<FableConfig>,
    mutation: Arc<Mutex<()>>,
}

impl TaleStore {
    /// Creates a store over the configured data directory.
    pub fn new(cfg: Arc<FableConfig>) -> Self {
        Self {
            cfg,
            mutation: Arc::new(Mutex::new(())),
        }
    }

    fn tale_dir(&self, id: &TaleId) -> PathBuf {
        id.sharded_dir(&self.cfg.tales_dir())
    }

    fn tale_file(&self, id: &TaleId) -> PathBuf {
        self.tale_dir(id).join(TALE_FILE_NAME)
    }

    /// Persists a freshly created tale.
    ///
    /// Guards against id collisions (or pre-existing directories from
    /// external interference): an existing directory for the id is an error
    /// rather than a silent overwrite.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::TaleDirCreation` if the sharded directory cannot
    /// be allocated, and the usual serialization/write errors otherwise.
    pub fn insert(&self, tale: &Tale) -> TaleResult<()> {
        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = self.tale_dir(&tale.id);
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).map_err(TaleError::StorageDirCreation)?;
        }
        // create_dir (not create_dir_all) so an existing id surfaces as an error.
        fs::create_dir(&dir).map_err(TaleError::TaleDirCreation)?;

        self.write_document(tale)
    }

    /// Loads a tale by id.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if no document exists for the id.
    pub fn load(&self, id: &TaleId) -> TaleResult<Tale> {
        let path = self.tale_file(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(TaleError::NotFound),
            Err(e) => return Err(TaleError::FileRead(e)),
        };
        serde_json::from_str(&contents).map_err(TaleError::Deserialization)
    }

    /// Applies `mutate` to the stored document under the mutation lock.
    ///
    /// The load, closure, timestamp bump, and write form one atomic unit with
    /// respect to every other mutation on this store. The closure's return
    /// value is handed back alongside the updated tale.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if no document exists for the id, or
    /// whatever error the closure itself produces (in which case nothing is
    /// written).
    pub fn mutate<T>(
        &self,
        id: &TaleId,
        mutate: impl FnOnce(&mut Tale) -> TaleResult<T>,
    ) -> TaleResult<(Tale, T)> {
        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);

        let mut tale = self.load(id)?;
        let outcome = mutate(&mut tale)?;
        tale.updated_at = chrono::Utc::now();
        self.write_document(&tale)?;
        Ok((tale, outcome))
    }

    /// Removes a tale permanently, if `check` approves of the stored document.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if no document exists, the `check`
    /// error if it rejects (nothing is removed), or `TaleError::DirRemove`
    /// if deleting the directory fails.
    pub fn remove_if(
        &self,
        id: &TaleId,
        check: impl FnOnce(&Tale) -> TaleResult<()>,
    ) -> TaleResult<()> {
        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);

        let tale = self.load(id)?;
        check(&tale)?;
        fs::remove_dir_all(self.tale_dir(id)).map_err(TaleError::DirRemove)
    }

    /// Lists all stored tales, in no particular order.
    ///
    /// Traverses the sharded directory structure and reads every `tale.json`.
    /// Individual documents that cannot be parsed are logged as warnings and
    /// skipped; a missing tales directory yields an empty list.
    pub fn list(&self) -> Vec<Tale> {
        let tales_dir = self.cfg.tales_dir();

        let mut tales = Vec::new();

        let s1_iter = match fs::read_dir(&tales_dir) {
            Ok(it) => it,
            Err(_) => return tales,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    if !id_path.is_dir() {
                        continue;
                    }

                    let doc_path = id_path.join(TALE_FILE_NAME);
                    if !doc_path.is_file() {
                        continue;
                    }

                    match fs::read_to_string(&doc_path) {
                        Ok(contents) => match serde_json::from_str::<Tale>(&contents) {
                            Ok(tale) => tales.push(tale),
                            Err(e) => {
                                tracing::warn!(
                                    "failed to parse tale document: {} - {}",
                                    doc_path.display(),
                                    e
                                );
                            }
                        },
                        Err(e) => {
                            tracing::warn!(
                                "failed to read tale document: {} - {}",
                                doc_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        tales
    }

    // Write via temp file + rename so lock-free readers never see a torn
    // document.
    fn write_document(&self, tale: &Tale) -> TaleResult<()> {
        let json = serde_json::to_string_pretty(tale).map_err(TaleError::Serialization)?;
        let path = self.tale_file(&tale.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(TaleError::FileWrite)?;
        fs::rename(&tmp, &path).map_err(TaleError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TALES_DIR_NAME;
    use crate::tale::{AgeRange, Topic, UserId};
    use chrono::Utc;
    use fable_types::TaleTitle;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn test_store(data_dir: &std::path::Path) -> TaleStore {
        let cfg = FableConfig::new(data_dir.to_path_buf(), None).expect("config should build");
        TaleStore::new(Arc::new(cfg))
    }

    fn sample_tale(author: &str) -> Tale {
        let now = Utc::now();
        Tale {
            id: TaleId::generate(),
            title: TaleTitle::new("The Moonlit Garden").unwrap(),
            content: "In a garden at the edge of town...".into(),
            age_range: AgeRange::EarlyReader,
            topic: Topic::Nature,
            author: UserId::new(author).unwrap(),
            is_public: false,
            liked_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_then_load_round_trips() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        let loaded = store.load(&tale.id).expect("load should succeed");
        assert_eq!(loaded.id, tale.id);
        assert_eq!(loaded.title.as_str(), "The Moonlit Garden");
        assert_eq!(loaded.author.as_str(), "user-a");
        assert!(!loaded.is_public);
    }

    #[test]
    fn test_insert_creates_sharded_layout() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        let id = tale.id.as_str();
        let doc = temp_dir
            .path()
            .join(TALES_DIR_NAME)
            .join(&id[0..2])
            .join(&id[2..4])
            .join(id)
            .join("tale.json");
        assert!(doc.is_file(), "document should live in the sharded path");
    }

    #[test]
    fn test_insert_rejects_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("first insert should succeed");

        let err = store
            .insert(&tale)
            .expect_err("second insert with the same id should fail");
        assert!(matches!(err, TaleError::TaleDirCreation(_)));
    }

    #[test]
    fn test_load_missing_returns_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let err = store
            .load(&TaleId::generate())
            .expect_err("loading an absent tale should fail");
        assert!(matches!(err, TaleError::NotFound));
    }

    #[test]
    fn test_mutate_persists_and_bumps_updated_at() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        let original_updated_at = tale.updated_at;
        store.insert(&tale).expect("insert should succeed");

        let (updated, ()) = store
            .mutate(&tale.id, |t| {
                t.is_public = true;
                Ok(())
            })
            .expect("mutate should succeed");

        assert!(updated.is_public);
        assert!(
            updated.updated_at >= original_updated_at,
            "updated_at should be bumped"
        );

        let reloaded = store.load(&tale.id).expect("load should succeed");
        assert!(reloaded.is_public, "mutation should be persisted");
    }

    #[test]
    fn test_mutate_error_leaves_document_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        let err = store
            .mutate(&tale.id, |t| {
                t.is_public = true;
                Err::<(), _>(TaleError::Forbidden)
            })
            .expect_err("mutate should surface the closure error");
        assert!(matches!(err, TaleError::Forbidden));

        let reloaded = store.load(&tale.id).expect("load should succeed");
        assert!(!reloaded.is_public, "failed mutation must not be written");
    }

    #[test]
    fn test_remove_if_deletes_permanently() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        store
            .remove_if(&tale.id, |_| Ok(()))
            .expect("remove should succeed");

        let err = store
            .load(&tale.id)
            .expect_err("removed tale should be gone");
        assert!(matches!(err, TaleError::NotFound));
    }

    #[test]
    fn test_remove_if_check_rejection_keeps_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        let err = store
            .remove_if(&tale.id, |_| Err(TaleError::Forbidden))
            .expect_err("rejected check should surface");
        assert!(matches!(err, TaleError::Forbidden));

        store
            .load(&tale.id)
            .expect("document should still exist after rejected removal");
    }

    #[test]
    fn test_list_returns_empty_for_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        assert!(store.list().is_empty());
    }

    #[test]
    fn test_list_skips_corrupt_documents() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        // Plant a corrupt document alongside the valid one.
        let bogus_id = TaleId::generate();
        let bogus_dir = bogus_id.sharded_dir(&temp_dir.path().join(TALES_DIR_NAME));
        fs::create_dir_all(&bogus_dir).expect("should create directory");
        fs::write(bogus_dir.join("tale.json"), "{not json").expect("should write bogus doc");

        let tales = store.list();
        assert_eq!(tales.len(), 1, "corrupt document should be skipped");
        assert_eq!(tales[0].id, tale.id);
    }

    #[test]
    fn test_concurrent_toggles_do_not_lose_updates() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let tale = sample_tale("user-a");
        store.insert(&tale).expect("insert should succeed");

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let id = tale.id.clone();
            handles.push(std::thread::spawn(move || {
                let user = UserId::new(format!("liker-{i}")).unwrap();
                store
                    .mutate(&id, |t| {
                        t.liked_by.insert(user);
                        Ok(())
                    })
                    .expect("mutate should succeed");
            }));
        }
        for handle in handles {
            handle.join().expect("thread should finish");
        }

        let tale = store.load(&tale.id).expect("load should succeed");
        assert_eq!(tale.likes(), 8, "no like may be lost under concurrency");
    }
}
