//! # Fable Core
//!
//! Core business logic for the Fable children's-story backend.
//!
//! This crate contains pure data operations and the tale lifecycle:
//! - Tale creation, listing, update, deletion and like accounting over a
//!   sharded JSON document store
//! - Ownership and visibility enforcement
//! - The narrative-generator client (external text-generation collaborator)
//!
//! **No API concerns**: HTTP servers, request/response DTOs, and requester
//! extraction belong in `api-rest` and `api-shared`.

pub mod config;
pub mod error;
pub mod generator;
pub mod service;
pub mod store;
pub mod tale;

pub use config::{FableConfig, GeneratorConfig};
pub use error::{TaleError, TaleResult};
pub use generator::{GeneratedTale, NarrativeClient, StoryPrompt};
pub use service::{LikeOutcome, TaleDraft, TalePatch, TaleService};
pub use store::TaleStore;
pub use tale::{AgeRange, Tale, TaleId, Topic, UserId};
