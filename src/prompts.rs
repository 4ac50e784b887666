//! Instruction text sent to the vision model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the extraction contract ("verbatim text,
//!    no commentary") lives in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real model, so a prompt regression is caught immediately.

/// Fixed instruction for verbatim text extraction from a document image.
///
/// The model is asked for raw text only. Formatting the model adds anyway
/// (stray code fences, CRLF endings) is stripped deterministically by
/// [`crate::postprocess::clean_extracted_text`] rather than by prompting
/// harder.
pub const EXTRACTION_PROMPT: &str = "Extract all text from the attached image. \
Return only the raw, extracted text without any formatting, commentary, or explanations.";
