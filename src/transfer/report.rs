// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structured warnings for degraded (non-fatal) results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Topology signatures differ; pair skipped.
    ///
    /// Object matching never reports this kind: mismatched candidates are
    /// the common case and only their count is logged. It is kept in the
    /// taxonomy for hosts that pair objects themselves and want to record
    /// the skip.
    StructuralMismatch,
    /// Entities left unmapped because their bucket had several contributors
    AmbiguousCorrespondence,
    /// Accepted, but not every entity was mapped
    PartialCoverage,
    /// Several accepted candidates and no name agreement; first one taken
    LowConfidencePairing,
    /// Face-corner counts differ; UVs not copied
    CornerCountMismatch,
    /// Target cannot hold another UV layer
    UvLayerLimit,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::StructuralMismatch => "structural-mismatch",
            WarningKind::AmbiguousCorrespondence => "ambiguous-correspondence",
            WarningKind::PartialCoverage => "partial-coverage",
            WarningKind::LowConfidencePairing => "low-confidence-pairing",
            WarningKind::CornerCountMismatch => "corner-count-mismatch",
            WarningKind::UvLayerLimit => "uv-layer-limit",
        }
    }
}

/// One reported issue with the ids and counts needed to diagnose it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
    /// Object ids involved
    pub context: Vec<String>,
    /// `(matched, total)` or `(source, target)` counts, depending on kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<(usize, usize)>,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            context: Vec::new(),
            counts: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_context<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_counts(mut self, first: usize, second: usize) -> Self {
        self.counts = Some((first, second));
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if !self.context.is_empty() {
            write!(f, " ({})", self.context.join(" -> "))?;
        }
        if let Some((a, b)) = self.counts {
            write!(f, " [{}/{}]", a, b)?;
        }
        Ok(())
    }
}

/// Receiver for warnings raised during a run
pub trait ReportSink {
    fn report(&mut self, warning: Warning);
}

impl ReportSink for Vec<Warning> {
    fn report(&mut self, warning: Warning) {
        self.push(warning);
    }
}

/// Collecting sink
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    warnings: Vec<Warning>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

impl ReportSink for Report {
    fn report(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Forwards warnings to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&mut self, warning: Warning) {
        let kind = warning.kind.as_str();
        match warning.severity {
            Severity::Info => tracing::info!(kind, "{}", warning),
            Severity::Warning => tracing::warn!(kind, "{}", warning),
            Severity::Error => tracing::error!(kind, "{}", warning),
        }
    }
}

/// Sends every warning to two sinks
pub struct Tee<'a, A: ReportSink + ?Sized, B: ReportSink + ?Sized> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A: ReportSink + ?Sized, B: ReportSink + ?Sized> ReportSink for Tee<'_, A, B> {
    fn report(&mut self, warning: Warning) {
        self.first.report(warning.clone());
        self.second.report(warning);
    }
}
