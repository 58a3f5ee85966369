//! Chat message wire types for the OpenAI completions API.
//!
//! The request body mixes two content shapes: system messages carry a plain
//! string, while the user message carries an array of typed parts (here a
//! single `image_url` part holding the page as a base64 data URI). The
//! untagged [`MessageContent`] enum serialises both shapes without a wrapper
//! field, matching the API exactly.
//!
//! Ordering is a hard invariant the model depends on: system messages must
//! precede the user image message, and the optional format-continuity system
//! message must sit between the base instruction and the image.

use serde::Serialize;

/// One turn in the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Conversation role. Only `system` and `user` are ever sent by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Message content: a plain string or an array of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One element of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

/// Image reference, as `{"url": "data:image/png;base64,..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    /// A system message with plain text content.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message whose sole content is a base64-encoded PNG.
    ///
    /// No text part accompanies the image; the page carries all the content.
    pub fn user_image(base64_png: &str) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/png;base64,{base64_png}"),
                },
            }]),
        }
    }
}
