// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for correspondence and transfer operations
//!
//! Only whole-batch or single-object impossibilities are errors. Per-pair
//! degradation (ambiguous buckets, partial coverage, corner-count mismatch)
//! is reported through [`crate::transfer::ReportSink`] instead.

use thiserror::Error;

/// Result type for engine operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Fatal conditions raised by the engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// No object pair was accepted across the whole batch.
    #[error(
        "object matching failed: {matched} pairs accepted \
         (source objects: {source_count}, target objects: {target_count})"
    )]
    BatchMatchFailure {
        /// Number of accepted pairs (always zero when raised).
        matched: usize,
        /// Number of source objects offered.
        source_count: usize,
        /// Number of target objects offered.
        target_count: usize,
    },

    /// An operation-level precondition does not hold.
    #[error("precondition violated for '{object}': {message}")]
    PreconditionViolation {
        /// The offending object.
        object: String,
        /// What was expected.
        message: String,
    },

    /// Weight transfer was requested but no pair produced a single mapping.
    #[error("vertex correspondence is empty for all {pairs} object pairs")]
    EmptyCorrespondence {
        /// Number of pairs that were attempted.
        pairs: usize,
    },

    /// Mesh data is internally inconsistent.
    #[error("invalid mesh '{object}': {message}")]
    InvalidMesh {
        /// The offending object.
        object: String,
        /// Description of the inconsistency.
        message: String,
    },

    /// A referenced object does not exist in the snapshot.
    #[error("object '{id}' not found")]
    ObjectNotFound {
        /// The missing object id.
        id: String,
    },
}

impl TransferError {
    pub(crate) fn precondition(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            object: object.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_message_carries_counts() {
        let err = TransferError::BatchMatchFailure {
            matched: 0,
            source_count: 7,
            target_count: 5,
        };
        let message = err.to_string();
        assert!(message.contains("source objects: 7"));
        assert!(message.contains("target objects: 5"));
    }

    #[test]
    fn test_precondition_names_object() {
        let err = TransferError::precondition("Face", "fewer than three anchor vertices");
        assert_eq!(
            err.to_string(),
            "precondition violated for 'Face': fewer than three anchor vertices"
        );
    }
}
