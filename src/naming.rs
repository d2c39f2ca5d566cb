//! Storage key derivation for submission artifacts.
//!
//! Every artifact of one submission shares the sanitized carrier reference
//! and the submission id, e.g. `MSCU1234567-ARQ-2-1a2b3c4d.pdf` and
//! `MSCU1234567-RESUMO-1a2b3c4d.txt`.

use std::fmt;
use std::path::Path as FsPath;

use uuid::Uuid;

pub const MISSING_REFERENCE: &str = "SEM-BL";
pub const ATTACHMENT_TAG: &str = "ARQ";
pub const SUMMARY_TAG: &str = "RESUMO";

const UNSAFE_KEY_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];
const SUBMISSION_ID_LEN: usize = 8;

/// Upper-cases and trims the reference, replacing characters that are not
/// safe in object keys with `_`.
pub fn sanitize_reference(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return MISSING_REFERENCE.to_string();
    }

    replace_unsafe(&trimmed.to_uppercase())
}

fn replace_unsafe(value: &str) -> String {
    value
        .chars()
        .map(|ch| if UNSAFE_KEY_CHARS.contains(&ch) { '_' } else { ch })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(SUBMISSION_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercased extension of `filename` including the dot, or empty. Unsafe
/// key characters in the extension are replaced like in the reference.
pub fn extension_of(filename: &str) -> String {
    FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", replace_unsafe(&ext.to_lowercase())))
        .unwrap_or_default()
}

pub fn attachment_key(
    reference: &str,
    index: usize,
    submission_id: &SubmissionId,
    original_filename: &str,
) -> String {
    format!(
        "{reference}-{ATTACHMENT_TAG}-{index}-{submission_id}{}",
        extension_of(original_filename)
    )
}

pub fn summary_key(reference: &str, submission_id: &SubmissionId) -> String {
    format!("{reference}-{SUMMARY_TAG}-{submission_id}.txt")
}
