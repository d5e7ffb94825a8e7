// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of call operations

use fx_core::Operation;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt WAL entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only log of [`Operation`]s, one JSON entry per line
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let reader = BufReader::new(File::open(path)?);
        let sequence = reader.lines().count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
        })
    }

    /// Append an operation and flush it to disk before returning
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_data()?;
        self.sequence = entry.seq;
        Ok(self.sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the log at `path` with `ops`.
    ///
    /// The new log is written beside the old one and renamed over it, so a
    /// crash leaves either the old or the new log, never a mix.
    pub fn rewrite(path: &Path, ops: &[Operation]) -> Result<(), WalError> {
        let tmp = path.with_extension("wal.tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        for (index, op) in ops.iter().enumerate() {
            let entry = WalEntry {
                seq: index as u64 + 1,
                op: op.clone(),
            };
            serde_json::to_writer(&mut writer, &entry)?;
            writer.write_all(b"\n")?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Replay all operations from the log.
    ///
    /// A torn final line (the daemon died mid-write) is dropped with a
    /// warning. A bad line anywhere else is an error.
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        let last = lines.len();
        let mut ops = Vec::with_capacity(last);

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(line) {
                Ok(entry) => ops.push(entry.op),
                Err(e) if index + 1 == last => {
                    tracing::warn!(line = index + 1, error = %e, "dropping torn WAL tail");
                }
                Err(source) => {
                    return Err(WalError::Corrupt {
                        line: index + 1,
                        source,
                    })
                }
            }
        }

        Ok(ops)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
