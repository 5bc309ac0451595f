//! Request and response bodies for the REST surface.
//!
//! Wire field names are camelCase (the shape the story app's clients
//! already speak); conversion to and from the core domain types happens
//! here so handlers stay thin.

use fable_core::{Tale, TaleDraft, TalePatch};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A tale as returned to clients. `likes` is derived from `likedBy`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaleBody {
    pub id: String,
    pub title: String,
    pub content: String,
    pub age_range: String,
    pub topic: String,
    pub author: String,
    pub is_public: bool,
    pub likes: u64,
    pub liked_by: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Tale> for TaleBody {
    fn from(tale: &Tale) -> Self {
        Self {
            id: tale.id.to_string(),
            title: tale.title.as_str().to_owned(),
            content: tale.content.clone(),
            age_range: tale.age_range.as_str().to_owned(),
            topic: tale.topic.as_str().to_owned(),
            author: tale.author.to_string(),
            is_public: tale.is_public,
            likes: tale.likes(),
            liked_by: tale.liked_by.iter().map(|u| u.to_string()).collect(),
            created_at: tale.created_at.to_rfc3339(),
            updated_at: tale.updated_at.to_rfc3339(),
        }
    }
}

/// Body for `POST /tales`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaleReq {
    pub title: String,
    pub content: String,
    pub age_range: String,
    pub topic: String,
    /// Omitted means private.
    #[serde(default)]
    pub is_public: bool,
}

impl From<CreateTaleReq> for TaleDraft {
    fn from(req: CreateTaleReq) -> Self {
        TaleDraft {
            title: req.title,
            content: req.content,
            age_range: req.age_range,
            topic: req.topic,
            is_public: req.is_public,
        }
    }
}

/// Body for `PATCH /tales/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaleReq {
    pub title: Option<String>,
    pub content: Option<String>,
    pub age_range: Option<String>,
    pub topic: Option<String>,
    pub is_public: Option<bool>,
}

impl From<UpdateTaleReq> for TalePatch {
    fn from(req: UpdateTaleReq) -> Self {
        TalePatch {
            title: req.title,
            content: req.content,
            age_range: req.age_range,
            topic: req.topic,
            is_public: req.is_public,
        }
    }
}

/// Body for `POST /tales/generate`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTaleReq {
    pub age_range: String,
    pub topic: String,
    pub main_character: Option<String>,
    pub setting: Option<String>,
    pub additional_details: Option<String>,
}

/// A generated story offered to the user; not yet saved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTaleBody {
    pub title: String,
    pub content: String,
    pub age_range: String,
    pub topic: String,
}

/// Envelope for a single tale.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaleRes {
    pub success: bool,
    pub tale: TaleBody,
}

/// Envelope for a tale listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaleListRes {
    pub success: bool,
    pub count: usize,
    pub tales: Vec<TaleBody>,
}

/// Envelope for a generated story.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedTaleRes {
    pub success: bool,
    pub tale: GeneratedTaleBody,
}

/// Envelope for a deletion.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteTaleRes {
    pub success: bool,
    pub message: String,
}

/// Envelope for a like toggle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeRes {
    pub success: bool,
    pub liked: bool,
    pub likes: u64,
}

/// Envelope for a like-status query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeStatusRes {
    pub success: bool,
    pub liked: bool,
}

/// Error envelope, used for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_req_wire_format_is_camel_case() {
        let req: CreateTaleReq = serde_json::from_str(
            r#"{
                "title": "The Comet Kite",
                "content": "Mira built a kite...",
                "ageRange": "6-8",
                "topic": "space",
                "isPublic": true
            }"#,
        )
        .expect("camelCase body should deserialize");
        assert_eq!(req.age_range, "6-8");
        assert!(req.is_public);
    }

    #[test]
    fn test_create_req_is_public_defaults_false() {
        let req: CreateTaleReq = serde_json::from_str(
            r#"{"title":"t","content":"c","ageRange":"3-5","topic":"bedtime"}"#,
        )
        .expect("body without isPublic should deserialize");
        assert!(!req.is_public);
    }

    #[test]
    fn test_update_req_supports_partial_bodies() {
        let req: UpdateTaleReq =
            serde_json::from_str(r#"{"isPublic":true}"#).expect("partial body should deserialize");
        assert_eq!(req.is_public, Some(true));
        assert!(req.title.is_none());
        assert!(req.topic.is_none());
    }
}
