//! # page2md
//!
//! Convert a rendered PDF page image to Markdown with an OpenAI vision model.
//!
//! ## Why this crate?
//!
//! Traditional PDF-to-text tools (pdftotext, pdf-extract) fail on complex
//! layouts — multi-column text, tables, and figures come out garbled or out
//! of reading order. A vision model reads the rendered page as a human
//! would. This crate is the network half of that pipeline: given a page
//! image on disk, it builds the chat-completions request, performs exactly
//! one HTTP round trip, and maps the response into Markdown plus token
//! counts. Rasterisation, page iteration, and retry policy belong to the
//! caller.
//!
//! ## Call Flow
//!
//! ```text
//! completion(image, maintain_format, prior_page, model, params)
//!  │
//!  ├─ 1. Validate  merge caller overrides over the default sampling params
//!  ├─ 2. Messages  system prompt [+ prior-page context] + base64 page image
//!  ├─ 3. Request   one POST to {base_url}/chat/completions
//!  └─ 4. Parse     choices[0].message.content + usage token counts
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use page2md::CompletionClient;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), page2md::CompletionError> {
//!     // Key resolved from the OPENAI_API_KEY environment variable
//!     let client = CompletionClient::new(None)?;
//!
//!     let mut prior = String::new();
//!     for page in ["page-1.png", "page-2.png"] {
//!         let result = client
//!             .completion(Path::new(page), true, &prior, None, None)
//!             .await?;
//!         eprintln!("tokens: {} in / {} out", result.input_tokens, result.output_tokens);
//!         prior = result.content.clone();
//!         println!("{}", result.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`CompletionError`] variant; nothing is retried or
//! logged-and-swallowed inside the library. See [`error`] for the taxonomy.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod encode;
pub mod error;
pub mod message;
pub mod params;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{CompletionClient, CompletionResponse, API_KEY_ENV_VAR, DEFAULT_MODEL};
pub use encode::encode_image_to_base64;
pub use error::CompletionError;
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
pub use params::{LlmParams, ALLOWED_PARAM_KEYS};
