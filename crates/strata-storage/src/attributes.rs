//! File attributes derived from object descriptors.

use crate::client::ObjectDescriptor;
use crate::keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_core::constants::{DIRECTORY_CONTENT_TYPE, SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    File,
    Directory,
}

/// Attributes of a file or directory, computed on demand from a descriptor.
///
/// Directory markers may carry no timestamps; the millisecond accessors
/// report `0` for those instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttributes {
    pub file_name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

impl FileAttributes {
    /// Classify `descriptor`, stored under `blob_name`.
    ///
    /// The blob is a directory when `explicit_directory` is set, when its name
    /// ends with `/`, or when its content type marks a directory placeholder.
    pub fn from_descriptor(
        blob_name: &str,
        descriptor: &ObjectDescriptor,
        explicit_directory: bool,
    ) -> Self {
        let is_directory = explicit_directory
            || blob_name.ends_with(SEPARATOR)
            || descriptor.content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE);

        let (file_type, size) = if is_directory {
            (FileType::Directory, 0)
        } else {
            (FileType::File, descriptor.size)
        };

        Self {
            file_name: keys::file_name(blob_name).to_string(),
            file_type,
            size,
            last_modified: descriptor.updated,
            created: descriptor.created,
            metadata: descriptor.metadata.clone(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Epoch milliseconds of the last modification, 0 when unknown.
    pub fn last_modified_time(&self) -> i64 {
        self.last_modified.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    /// Epoch milliseconds of the creation, 0 when unknown.
    pub fn creation_time(&self) -> i64 {
        self.created.map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}
