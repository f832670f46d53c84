//! Ordered, validated file selection for the multi-file flows

use tracing::debug;

use crate::error::SelectionError;
use crate::file::{CandidateFile, FileRow};
use crate::flow::FlowKind;

/// Result of a successful `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub skipped_duplicates: usize,
}

/// Validate a whole batch against the per-file ceiling, nothing else.
/// Shared with the single-slot flows.
pub fn check_sizes<H>(
    batch: &[CandidateFile<H>],
    max_file_size: u64,
) -> Result<(), SelectionError> {
    match batch.iter().find(|f| f.size > max_file_size) {
        Some(file) => Err(SelectionError::FileTooLarge {
            name: file.name.clone(),
            limit_mb: max_file_size / crate::config::MB,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct SelectionList<H> {
    flow: FlowKind,
    max_files: usize,
    max_file_size: u64,
    files: Vec<CandidateFile<H>>,
}

impl<H> SelectionList<H> {
    pub fn new(flow: FlowKind, max_files: usize, max_file_size: u64) -> Self {
        Self {
            flow,
            max_files,
            max_file_size,
            files: Vec::new(),
        }
    }

    /// Add a batch, all or nothing.
    ///
    /// Checks run in order: size, count, type. The count check compares the
    /// whole batch (duplicates included) against the remaining room.
    pub fn add(&mut self, batch: Vec<CandidateFile<H>>) -> Result<AddOutcome, SelectionError> {
        check_sizes(&batch, self.max_file_size)?;

        if self.files.len() + batch.len() > self.max_files {
            return Err(SelectionError::TooManyFiles {
                label: self.flow.text().count_label,
                max: self.max_files,
            });
        }

        if !batch.iter().all(|f| self.flow.accepts(&f.mime_type)) {
            return Err(SelectionError::WrongType(self.flow.text().wrong_type));
        }

        let mut outcome = AddOutcome {
            added: 0,
            skipped_duplicates: 0,
        };
        for file in batch {
            if self.files.iter().any(|f| f.same_identity(&file)) {
                debug!(flow = %self.flow, name = %file.name, "Skipping duplicate file");
                outcome.skipped_duplicates += 1;
            } else {
                self.files.push(file);
                outcome.added += 1;
            }
        }

        Ok(outcome)
    }

    /// Remove by index. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<CandidateFile<H>> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn files(&self) -> &[CandidateFile<H>] {
        &self.files
    }

    pub fn rows(&self) -> Vec<FileRow> {
        self.files.iter().map(CandidateFile::row).collect()
    }
}
