//! Tale lifecycle operations.
//!
//! [`TaleService`] sits between the HTTP surface and the [`TaleStore`],
//! enforcing the two rules that gate every operation:
//!
//! - **ownership** — only the author may update or delete a tale;
//! - **visibility** — a private tale can only be read or liked by its
//!   author; a public tale is readable and likeable by anyone.
//!
//! Mutations delegate to the store's locked read-modify-write primitives, so
//! concurrent like-toggles on the same tale cannot lose updates.

use crate::config::FableConfig;
use crate::error::{TaleError, TaleResult};
use crate::store::TaleStore;
use crate::tale::{AgeRange, Tale, TaleId, Topic, UserId};
use chrono::Utc;
use fable_types::{NonEmptyText, TaleTitle};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Unvalidated fields for creating a tale.
///
/// Enum fields arrive as wire strings; [`TaleService::create`] validates
/// membership and rejects unknown values.
#[derive(Debug, Clone)]
pub struct TaleDraft {
    pub title: String,
    pub content: String,
    pub age_range: String,
    pub topic: String,
    /// Defaults to false: new tales start private.
    pub is_public: bool,
}

/// Partial update for an existing tale. Absent fields are left untouched;
/// present fields are validated with the same rules as create.
#[derive(Debug, Clone, Default)]
pub struct TalePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub age_range: Option<String>,
    pub topic: Option<String>,
    pub is_public: Option<bool>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Whether the requester likes the tale after the toggle.
    pub liked: bool,
    /// Like count after the toggle.
    pub likes: u64,
}

/// Service for tale lifecycle operations.
#[derive(Clone, Debug)]
pub struct TaleService {
    store: TaleStore,
}

impl TaleService {
    /// Creates a service over the configured data directory.
    pub fn new(cfg: Arc<FableConfig>) -> Self {
        Self {
            store: TaleStore::new(cfg),
        }
    }

    /// Creates a new tale owned by `author`.
    ///
    /// Validates the title (non-empty, bounded length), content (non-empty)
    /// and enum membership of `age_range`/`topic` before persisting.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::InvalidInput` for any field violation, or a
    /// storage error if persisting fails.
    pub fn create(&self, author: UserId, draft: TaleDraft) -> TaleResult<Tale> {
        let title = TaleTitle::new(&draft.title)
            .map_err(|e| TaleError::InvalidInput(format!("title: {e}")))?;
        let content = NonEmptyText::new(&draft.content)
            .map_err(|e| TaleError::InvalidInput(format!("content: {e}")))?;
        let age_range: AgeRange = draft.age_range.parse()?;
        let topic: Topic = draft.topic.parse()?;

        let now = Utc::now();
        let tale = Tale {
            id: TaleId::generate(),
            title,
            content: content.into_string(),
            age_range,
            topic,
            author,
            is_public: draft.is_public,
            liked_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&tale)?;
        Ok(tale)
    }

    /// All public tales, newest first.
    pub fn list_public(&self) -> Vec<Tale> {
        let mut tales: Vec<Tale> = self
            .store
            .list()
            .into_iter()
            .filter(|tale| tale.is_public)
            .collect();
        tales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tales
    }

    /// All tales owned by `author`, newest first.
    pub fn list_for_author(&self, author: &UserId) -> Vec<Tale> {
        let mut tales: Vec<Tale> = self
            .store
            .list()
            .into_iter()
            .filter(|tale| tale.is_authored_by(author))
            .collect();
        tales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tales
    }

    /// Fetches a tale, enforcing visibility.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if absent, `TaleError::Forbidden` if
    /// private and `requester` is not the author (anonymous requesters never
    /// see private tales).
    pub fn get(&self, id: &TaleId, requester: Option<&UserId>) -> TaleResult<Tale> {
        let tale = self.store.load(id)?;
        if !tale.is_visible_to(requester) {
            return Err(TaleError::Forbidden);
        }
        Ok(tale)
    }

    /// Applies a patch to a tale owned by `requester`.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if absent, `TaleError::Forbidden` if
    /// `requester` is not the author, or `TaleError::InvalidInput` if any
    /// patched field fails validation (in which case nothing changes).
    pub fn update(&self, id: &TaleId, requester: &UserId, patch: TalePatch) -> TaleResult<Tale> {
        let (tale, ()) = self.store.mutate(id, |tale| {
            if !tale.is_authored_by(requester) {
                return Err(TaleError::Forbidden);
            }

            if let Some(title) = &patch.title {
                tale.title = TaleTitle::new(title)
                    .map_err(|e| TaleError::InvalidInput(format!("title: {e}")))?;
            }
            if let Some(content) = &patch.content {
                tale.content = NonEmptyText::new(content)
                    .map_err(|e| TaleError::InvalidInput(format!("content: {e}")))?
                    .into_string();
            }
            if let Some(age_range) = &patch.age_range {
                tale.age_range = age_range.parse()?;
            }
            if let Some(topic) = &patch.topic {
                tale.topic = topic.parse()?;
            }
            if let Some(is_public) = patch.is_public {
                tale.is_public = is_public;
            }

            Ok(())
        })?;
        Ok(tale)
    }

    /// Deletes a tale owned by `requester` permanently.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if absent or `TaleError::Forbidden` if
    /// `requester` is not the author.
    pub fn delete(&self, id: &TaleId, requester: &UserId) -> TaleResult<()> {
        self.store.remove_if(id, |tale| {
            if !tale.is_authored_by(requester) {
                return Err(TaleError::Forbidden);
            }
            Ok(())
        })
    }

    /// Toggles `requester`'s like on a tale.
    ///
    /// One operation, not separate like/unlike endpoints: membership in the
    /// tale's `liked_by` set flips, and the returned count is derived from
    /// the set after the flip. Runs under the store's mutation lock, so
    /// concurrent toggles by different users cannot lose updates.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::NotFound` if absent, `TaleError::Forbidden` if
    /// the tale is private and `requester` is not its author.
    pub fn toggle_like(&self, id: &TaleId, requester: &UserId) -> TaleResult<LikeOutcome> {
        let (tale, liked) = self.store.mutate(id, |tale| {
            if !tale.is_visible_to(Some(requester)) {
                return Err(TaleError::Forbidden);
            }
            if tale.liked_by.remove(requester) {
                Ok(false)
            } else {
                tale.liked_by.insert(requester.clone());
                Ok(true)
            }
        })?;
        Ok(LikeOutcome {
            liked,
            likes: tale.likes(),
        })
    }

    /// Whether `requester` currently likes the tale.
    ///
    /// # Errors
    ///
    /// Same visibility rules as [`TaleService::get`].
    pub fn like_status(&self, id: &TaleId, requester: &UserId) -> TaleResult<bool> {
        let tale = self.get(id, Some(requester))?;
        Ok(tale.is_liked_by(requester))
    }
}
