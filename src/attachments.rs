use crate::core::{AttachmentPolicy, ChatError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

static UNSAFE_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9]").expect("valid regex"));

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// A file reference sent along with a chat turn. The content travels
/// base64-encoded in `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub size: u64,
    pub data: String,
}

impl Attachment {
    /// Builds an attachment from raw bytes, enforcing `policy`.
    pub fn from_bytes(
        name: &str,
        media_type: &str,
        bytes: &[u8],
        policy: &AttachmentPolicy,
    ) -> Result<Self, ChatError> {
        let size = bytes.len() as u64;
        if size > policy.max_size_bytes {
            return Err(ChatError::AttachmentError(format!(
                "{name} is {} which exceeds the {} limit",
                human_readable_size(size),
                human_readable_size(policy.max_size_bytes)
            )));
        }
        if !is_type_allowed(media_type, &policy.allowed_types) {
            return Err(ChatError::AttachmentError(format!(
                "{name} has type {media_type}, which is not allowed"
            )));
        }

        Ok(Self {
            id: attachment_id(name),
            name: name.to_string(),
            media_type: media_type.to_string(),
            size,
            data: STANDARD.encode(bytes),
        })
    }

    /// Reads a file and guesses its media type from the extension.
    pub fn from_path(path: &Path, policy: &AttachmentPolicy) -> Result<Self, ChatError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ChatError::AttachmentError(format!("{} has no usable file name", path.display()))
            })?;
        let bytes = fs::read(path).map_err(|e| {
            ChatError::AttachmentError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let media_type = mime_guess::from_path(path).first_or_octet_stream();

        Self::from_bytes(name, media_type.essence_str(), &bytes, policy)
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

fn attachment_id(name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("file_{millis}_{}", UNSAFE_ID_CHARS.replace_all(name, "_"))
}

/// `*/*` allows everything, `image/*` a whole category, anything else must
/// match exactly.
pub fn is_type_allowed(media_type: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|pattern| {
        if pattern == "*/*" {
            return true;
        }
        match pattern.strip_suffix("/*") {
            Some(category) => media_type
                .strip_prefix(category)
                .is_some_and(|rest| rest.starts_with('/')),
            None => media_type == pattern,
        }
    })
}

/// Formats a byte count with 1024-based units and up to two decimals,
/// e.g. `0 Bytes`, `1.5 KB`.
pub fn human_readable_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}
