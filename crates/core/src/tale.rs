//! Tale domain model.
//!
//! This module defines the Tale document and its validated building blocks:
//!
//! - [`TaleId`] — canonical storage identifier (32 lowercase hex characters,
//!   the same value as `Uuid::new_v4().simple()`), with the sharded-path
//!   derivation used by the store.
//! - [`UserId`] — opaque identity reference; ownership checks compare these
//!   for equality and never interpret their content.
//! - [`AgeRange`] / [`Topic`] — the closed vocabularies a Tale must use.
//! - [`Tale`] — the stored document itself.
//!
//! The like count is never stored: it is always derived from the `liked_by`
//! set, so `likes == |liked_by|` cannot be violated by construction.

use crate::error::{TaleError, TaleResult};
use chrono::{DateTime, Utc};
use fable_types::TaleTitle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Canonical tale identifier: 32 lowercase hexadecimal characters, no hyphens.
///
/// Externally supplied identifiers (path parameters) must already be in
/// canonical form; use [`TaleId::parse`] to validate them. Tales are stored
/// under sharded directories derived from the identifier:
/// `<base>/<id[0..2]>/<id[2..4]>/<id>/`, which keeps per-directory fan-out
/// small.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TaleId(String);

impl TaleId {
    /// Generates a fresh random identifier in canonical form.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Validates an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::InvalidInput` if the input is not exactly 32
    /// lowercase hex characters.
    pub fn parse(input: &str) -> TaleResult<Self> {
        let ok = input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !ok {
            return Err(TaleError::InvalidInput(format!(
                "invalid tale id: {input:?} (expected 32 lowercase hex characters)"
            )));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the sharded directory for this identifier under `base`.
    pub fn sharded_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.0[0..2]).join(&self.0[2..4]).join(&self.0)
    }
}

impl std::fmt::Display for TaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TaleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TaleId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque user identity reference.
///
/// The backend does not interpret identities; it only compares them for
/// equality when enforcing ownership and when toggling like membership.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId`, rejecting empty or whitespace-only input.
    pub fn new(input: impl AsRef<str>) -> TaleResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TaleError::InvalidInput("user id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target age band for a tale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "3-5")]
    Preschool,
    #[serde(rename = "6-8")]
    EarlyReader,
    #[serde(rename = "9-12")]
    MiddleGrade,
    #[serde(rename = "13+")]
    Teen,
}

impl AgeRange {
    /// All accepted wire values, in ascending age order.
    pub const ALL: [AgeRange; 4] = [
        AgeRange::Preschool,
        AgeRange::EarlyReader,
        AgeRange::MiddleGrade,
        AgeRange::Teen,
    ];

    /// The wire form of this band.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::Preschool => "3-5",
            AgeRange::EarlyReader => "6-8",
            AgeRange::MiddleGrade => "9-12",
            AgeRange::Teen => "13+",
        }
    }

    /// A readable phrase for prompt composition (e.g. "3 to 5 year olds").
    pub fn audience(&self) -> &'static str {
        match self {
            AgeRange::Preschool => "3 to 5 year olds",
            AgeRange::EarlyReader => "6 to 8 year olds",
            AgeRange::MiddleGrade => "9 to 12 year olds",
            AgeRange::Teen => "teenagers aged 13 and up",
        }
    }

    /// Rough story length guidance per band, used by the generator prompt.
    pub fn length_guidance(&self) -> &'static str {
        match self {
            AgeRange::Preschool => "very short, around 150 words, with simple vocabulary",
            AgeRange::EarlyReader => "short, around 300 words, with easy vocabulary",
            AgeRange::MiddleGrade => "around 500 words",
            AgeRange::Teen => "around 800 words",
        }
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgeRange {
    type Err = TaleError;

    fn from_str(s: &str) -> TaleResult<Self> {
        Self::ALL
            .iter()
            .find(|band| band.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let accepted: Vec<&str> = Self::ALL.iter().map(|b| b.as_str()).collect();
                TaleError::InvalidInput(format!(
                    "unknown age range {s:?} (accepted: {})",
                    accepted.join(", ")
                ))
            })
    }
}

/// Story category for a tale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Adventure,
    Animals,
    Fantasy,
    Friendship,
    Space,
    Nature,
    Mystery,
    Sports,
    Bedtime,
}

impl Topic {
    /// All accepted wire values.
    pub const ALL: [Topic; 9] = [
        Topic::Adventure,
        Topic::Animals,
        Topic::Fantasy,
        Topic::Friendship,
        Topic::Space,
        Topic::Nature,
        Topic::Mystery,
        Topic::Sports,
        Topic::Bedtime,
    ];

    /// The wire form of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Adventure => "adventure",
            Topic::Animals => "animals",
            Topic::Fantasy => "fantasy",
            Topic::Friendship => "friendship",
            Topic::Space => "space",
            Topic::Nature => "nature",
            Topic::Mystery => "mystery",
            Topic::Sports => "sports",
            Topic::Bedtime => "bedtime",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Topic {
    type Err = TaleError;

    fn from_str(s: &str) -> TaleResult<Self> {
        Self::ALL
            .iter()
            .find(|topic| topic.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let accepted: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                TaleError::InvalidInput(format!(
                    "unknown topic {s:?} (accepted: {})",
                    accepted.join(", ")
                ))
            })
    }
}

/// A stored tale document.
///
/// Serialized as `tale.json` inside the tale's sharded directory. The
/// `author` field is immutable after creation and `liked_by` holds the
/// distinct identities that currently like the tale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tale {
    pub id: TaleId,
    pub title: TaleTitle,
    pub content: String,
    pub age_range: AgeRange,
    pub topic: Topic,
    pub author: UserId,
    pub is_public: bool,
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tale {
    /// Current like count, derived from the membership set.
    pub fn likes(&self) -> u64 {
        self.liked_by.len() as u64
    }

    /// Whether `user` currently likes this tale.
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.liked_by.contains(user)
    }

    /// Whether `user` is the tale's author.
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.author == user
    }

    /// Whether `requester` may read this tale (public, or its author).
    pub fn is_visible_to(&self, requester: Option<&UserId>) -> bool {
        self.is_public || requester.is_some_and(|user| self.is_authored_by(user))
    }
}
