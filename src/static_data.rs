use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::record::WorkflowRecord;

/// Pre-baked records plus the file's content hash.
#[derive(Debug, Clone, Default)]
pub struct StaticData {
    pub records: Vec<WorkflowRecord>,
    pub sha256: Option<String>,
}

impl StaticData {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a JSON array of records. A missing file reads as empty.
pub fn load_static(path: &Path) -> Result<StaticData> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StaticData::default()),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let records = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(StaticData {
        records,
        sha256: Some(hex::encode(Sha256::digest(&bytes))),
    })
}
