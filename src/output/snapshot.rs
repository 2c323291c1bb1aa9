//! Snapshot persistence for activation lists.
//!
//! A snapshot stores the forest as a flat pre-order array where each node
//! names its parent by index. Reading never recurses, however deep the
//! traced call chains were.

use crate::model::{ActivationId, ActivationList, MemberRef};
use crate::utils::config::{SCHEMA_VERSION, UNKNOWN_DEPTH};
use crate::utils::error::SnapshotError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Top-level snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for compatibility checking
    pub version: String,

    /// RFC 3339 timestamp
    pub generated_at: String,

    /// Every activation in pre-order
    pub activations: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotNode {
    pub owner: String,
    pub member: MemberRef,
    pub repetitions: u32,

    /// Index of an earlier node, `None` for roots
    pub parent: Option<usize>,
}

impl Snapshot {
    /// Flatten an activation list
    pub fn from_activations(list: &ActivationList) -> Self {
        let mut activations = Vec::with_capacity(list.node_count());
        let mut stack: Vec<(ActivationId, Option<usize>)> =
            list.root_ids().iter().rev().map(|&id| (id, None)).collect();

        while let Some((id, parent)) = stack.pop() {
            let activation = list.get(id);
            let index = activations.len();
            activations.push(SnapshotNode {
                owner: activation.owner().to_string(),
                member: activation.member().clone(),
                repetitions: activation.repetitions(),
                parent,
            });
            stack.extend(
                list.children_ids(id)
                    .iter()
                    .rev()
                    .map(|&child| (child, Some(index))),
            );
        }

        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            activations,
        }
    }

    /// Rebuild the activation list; stack depths read back as unknown
    ///
    /// # Errors
    /// * `SnapshotError::Corrupt` - a parent index does not name an earlier
    ///   node, or a repetition count is zero
    pub fn to_activations(&self) -> Result<ActivationList, SnapshotError> {
        let mut list = ActivationList::new();
        let mut ids: Vec<ActivationId> = Vec::with_capacity(self.activations.len());

        for (index, node) in self.activations.iter().enumerate() {
            let parent = match node.parent {
                Some(parent) if parent < index => Some(ids[parent]),
                Some(parent) => {
                    return Err(SnapshotError::Corrupt(format!(
                        "node {} names parent {}, which does not precede it",
                        index, parent
                    )))
                }
                None => None,
            };
            if node.repetitions == 0 {
                return Err(SnapshotError::Corrupt(format!(
                    "node {} has zero repetitions",
                    index
                )));
            }

            let id = list.add(parent, node.owner.clone(), node.member.clone(), UNKNOWN_DEPTH);
            list.set_repetitions(id, node.repetitions);
            ids.push(id);
        }

        Ok(list)
    }
}

/// Write an activation list as a snapshot file
///
/// **Public** - main entry point for saving a trace
///
/// # Errors
/// * `SnapshotError::InvalidPath` - path is empty, a directory, or its parent cannot be created
/// * `SnapshotError::Io` - I/O error during write
/// * `SnapshotError::Serialization` - JSON serialization error
pub fn write_snapshot(
    list: &ActivationList,
    output_path: impl AsRef<Path>,
) -> Result<(), SnapshotError> {
    let output_path = output_path.as_ref();

    info!("Writing snapshot to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                SnapshotError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_snapshot_to(list, &mut writer)?;
    writer.flush()?;

    info!(
        "Snapshot written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a snapshot into any writer
pub fn write_snapshot_to<W: Write>(list: &ActivationList, writer: W) -> Result<(), SnapshotError> {
    let snapshot = Snapshot::from_activations(list);
    serde_json::to_writer_pretty(writer, &snapshot)?;
    Ok(())
}

/// Read an activation list from any reader
///
/// # Errors
/// * `SnapshotError::Serialization` - not a snapshot document
/// * `SnapshotError::Corrupt` - structurally invalid node array
pub fn read_snapshot<R: Read>(reader: R) -> Result<ActivationList, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_reader(reader)?;

    if snapshot.version != SCHEMA_VERSION {
        warn!(
            "Snapshot version mismatch: file has {}, expected {}",
            snapshot.version, SCHEMA_VERSION
        );
    }

    snapshot.to_activations()
}

/// Read an activation list from a snapshot file
///
/// **Public** - used by the render and validate commands
pub fn read_snapshot_file(input_path: impl AsRef<Path>) -> Result<ActivationList, SnapshotError> {
    let input_path = input_path.as_ref();
    debug!("Reading snapshot from: {}", input_path.display());

    let file = File::open(input_path)?;
    let list = read_snapshot(BufReader::new(file))?;

    debug!(
        "Snapshot read successfully: {} roots, {} nodes",
        list.len(),
        list.node_count()
    );
    Ok(list)
}

/// Validate that output path is writable
fn validate_output_path(path: &Path) -> Result<(), SnapshotError> {
    if path.as_os_str().is_empty() {
        return Err(SnapshotError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(SnapshotError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
