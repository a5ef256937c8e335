// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Delta checkpoint files.
//!
//! A checkpoint `<version>.checkpoint.parquet` (or its multi-part form
//! `<version>.checkpoint.<part>.<parts>.parquet`) holds one action per row.
//! The `add` rows are exactly the files live at that version; `remove` rows
//! are tombstones and do not matter for the live set.

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use parquet::schema::types::Type;
use std::collections::BTreeMap;

use super::log::{decode_path, num_records};
use crate::analyze::error::LogReadError;
use crate::analyze::model::{FileRef, PartitionValues};
use crate::storage::FileMetadata;

const ADD_COLUMN: &str = "add";
const VERSION_DIGITS: usize = 20;

/// Position of one checkpoint file within its (possibly multi-part) checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPart {
    pub version: u64,
    pub part: u32,
    pub parts: u32,
}

/// Parse a checkpoint file name. UUID-named (v2) checkpoints are not recognized.
pub fn checkpoint_part(path: &str) -> Option<CheckpointPart> {
    let name = path.rsplit('/').next()?.strip_suffix(".parquet")?;
    let (digits, rest) = name.split_once(".checkpoint")?;
    if digits.len() != VERSION_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version = digits.parse().ok()?;
    if rest.is_empty() {
        return Some(CheckpointPart {
            version,
            part: 1,
            parts: 1,
        });
    }
    let (part, parts) = rest.strip_prefix('.')?.split_once('.')?;
    Some(CheckpointPart {
        version,
        part: part.parse().ok()?,
        parts: parts.parse().ok()?,
    })
}

/// Files of the newest checkpoint with all of its parts present, sorted by part.
pub fn latest_complete_checkpoint(files: &[FileMetadata]) -> Option<(u64, Vec<FileMetadata>)> {
    let mut by_version: BTreeMap<(u64, u32), Vec<(u32, &FileMetadata)>> = BTreeMap::new();
    for file in files {
        if let Some(cp) = checkpoint_part(&file.path) {
            by_version
                .entry((cp.version, cp.parts))
                .or_default()
                .push((cp.part, file));
        }
    }

    by_version
        .into_iter()
        .rev()
        .find(|((_, parts), found)| found.len() == *parts as usize)
        .map(|((version, _), mut found)| {
            found.sort_by_key(|(part, _)| *part);
            (version, found.into_iter().map(|(_, f)| f.clone()).collect())
        })
}

fn add_from_row(table_path: &str, add: &Row) -> Result<Option<FileRef>, LogReadError> {
    let mut path = None;
    let mut size = 0u64;
    let mut stats = None;
    let mut partition_values = PartitionValues::new();

    for (name, field) in add.get_column_iter() {
        match (name.as_str(), field) {
            ("path", Field::Str(s)) => path = Some(s.as_str()),
            ("size", Field::Long(v)) => size = u64::try_from(*v).unwrap_or(0),
            ("size", Field::Int(v)) => size = u64::try_from(*v).unwrap_or(0),
            ("stats", Field::Str(s)) => stats = Some(s.as_str()),
            ("partitionValues", Field::MapInternal(map)) => {
                for (key, value) in map.entries() {
                    if let Field::Str(key) = key {
                        let value = match value {
                            Field::Str(v) => Some(v.clone()),
                            _ => None,
                        };
                        partition_values.insert(key.clone(), value);
                    }
                }
            }
            _ => {}
        }
    }

    let Some(raw_path) = path else {
        return Ok(None);
    };
    let path = decode_path(table_path, raw_path)?;
    Ok(Some(FileRef {
        num_records: num_records(stats, &path),
        path,
        size_bytes: size,
        partition_values,
    }))
}

/// Live files recorded by one checkpoint part.
pub fn parse_checkpoint(table_path: &str, content: Bytes) -> Result<Vec<FileRef>, LogReadError> {
    let checkpoint_error =
        |message: &str| LogReadError::new(table_path, format!("checkpoint {}", message));

    let reader = SerializedFileReader::new(content)
        .map_err(|e| checkpoint_error("is not valid parquet").with_source(e))?;

    // Only the `add` column is decoded; metaData, protocol and tombstones are skipped.
    let file_schema = reader.metadata().file_metadata().schema();
    let selected_fields: Vec<_> = file_schema
        .get_fields()
        .iter()
        .filter(|f| f.name() == ADD_COLUMN)
        .cloned()
        .collect();
    if selected_fields.is_empty() {
        return Err(checkpoint_error("has no add column"));
    }
    let projection = Type::group_type_builder(file_schema.name())
        .with_fields(selected_fields)
        .build()
        .map_err(|e| checkpoint_error("schema projection failed").with_source(e))?;

    let rows = reader
        .get_row_iter(Some(projection))
        .map_err(|e| checkpoint_error("rows unreadable").with_source(e))?;

    let mut files = Vec::new();
    for row in rows {
        let row = row.map_err(|e| checkpoint_error("row unreadable").with_source(e))?;
        if let Some((_, Field::Group(add))) = row.get_column_iter().next() {
            if let Some(file) = add_from_row(table_path, add)? {
                files.push(file);
            }
        }
    }
    Ok(files)
}
