//! JSONL (JSON Lines) collection files.
//!
//! Each line is one record. Full rewrites go through a sibling temp file and
//! a rename, so a reader never sees a half-written collection.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{Collection, StorageConfig, StorageError};

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_collection(config: &StorageConfig, collection: Collection) -> Self {
        Self::new(config.path_for(collection))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Replace the whole file. On error the previous contents survive.
    pub fn write_all(&self, records: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        // Serialize everything before touching the disk.
        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            lines.push(serde_json::to_string(record)?);
        }

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let result = (|| -> Result<(), StorageError> {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for line in &lines {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!("Wrote {} records to {:?}", lines.len(), self.path);
        Ok(lines.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_collection(config: &StorageConfig, collection: Collection) -> Self {
        Self::new(config.path_for(collection))
    }

    /// Read all records. A missing file reads as empty; unparseable lines
    /// are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", index + 1, self.path, e);
                }
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}
