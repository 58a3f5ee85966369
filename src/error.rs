//! Error types for the page2md library.
//!
//! The taxonomy mirrors the phases of a completion call:
//!
//! * Construction — [`CompletionError::MissingApiKey`]: no credential could
//!   be resolved, so no client exists and no network call is ever attempted.
//! * Validation — [`CompletionError::InvalidParams`]: the caller passed an
//!   unrecognised sampling-parameter key; the error lists every bad key, not
//!   just the first, so one round of fixing suffices.
//! * Request — everything else: file I/O on the page image, the transport,
//!   a non-200 status, or a 200 whose body is missing expected fields.
//!
//! Request-phase errors reaching [`crate::client::CompletionClient::completion`]
//! are wrapped in [`CompletionError::RequestFailed`] with the cause preserved
//! as `source`; validation and construction errors propagate unwrapped since
//! they are already classified. Nothing is logged-and-swallowed inside the
//! library — every failure surfaces to the caller, who owns retry policy.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the page2md library.
#[derive(Debug, Error)]
pub enum CompletionError {
    // ── Construction errors ───────────────────────────────────────────────
    /// No API key was supplied and the environment variable is unset or empty.
    #[error(
        "No OpenAI API key found.\n\
         Pass one to CompletionClient::new or set the OPENAI_API_KEY environment variable."
    )]
    MissingApiKey,

    // ── Validation errors ─────────────────────────────────────────────────
    /// The caller supplied sampling-parameter keys outside the allowed set.
    ///
    /// `keys` is a comma-joined, sorted list of every offending key.
    #[error("Invalid LLM parameters: {keys}")]
    InvalidParams { keys: String },

    // ── Request errors ────────────────────────────────────────────────────
    /// The page image could not be read from disk.
    #[error("Failed to read page image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("Transport error calling the completions API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-200 status. Carries the full response
    /// body so rate-limit and auth failures are diagnosable from the error
    /// alone.
    #[error("Completions API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// The API answered 200 but the body was missing an expected field.
    #[error("Malformed completions API response: {detail}")]
    MalformedResponse { detail: String },

    /// Wrapper applied by `completion` around any request-phase failure.
    #[error("OpenAI completion error: {0}")]
    RequestFailed(#[source] Box<CompletionError>),
}
