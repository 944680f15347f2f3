// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Whole-object pairing across two models

use super::correspondence::{CorrespondenceMatcher, ProbeMode, ACCEPT_THRESHOLD};
use super::names::{strip_decorations, NameContext};
use super::spatial_hash::SpatialHashIndex;
use crate::error::{TransferError, TransferResult};
use crate::geometry::{MeshObject, TopologySignature};
use crate::transfer::{ReportSink, Warning, WarningKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a pair was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairConfidence {
    /// Zipped by caller ordering key, no geometric check
    Ordered,
    /// The only accepted candidate
    Unique,
    /// Several accepted candidates, decided by stripped name
    NameMatch,
    /// Several accepted candidates, first taken
    FirstCandidate,
}

impl PairConfidence {
    pub fn is_low(&self) -> bool {
        matches!(self, PairConfidence::FirstCandidate)
    }
}

/// Accepted source/target pairing, by index into the two object lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPair {
    pub source: usize,
    pub target: usize,
    /// Vertex match ratio; absent for ordered pairs
    pub ratio: Option<f64>,
    pub confidence: PairConfidence,
}

/// Resolution when one source has several accepted targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Take the first candidate by target id
    #[default]
    First,
    /// Prefer equal stripped names, else the first candidate by target id
    Name,
}

/// Pairs mesh objects of a source model with those of a target model
#[derive(Debug, Clone)]
pub struct BulkObjectMatcher {
    scale: f64,
    threshold: f64,
    tie_break: TieBreak,
    allow_ordered: bool,
    parallel: bool,
}

impl BulkObjectMatcher {
    /// `scale` maps target coordinates into the source frame
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            threshold: ACCEPT_THRESHOLD,
            tie_break: TieBreak::First,
            allow_ordered: false,
            parallel: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Zip by ordering key when both sides have equal counts and keys
    pub fn with_ordered_fast_path(mut self, allow: bool) -> Self {
        self.allow_ordered = allow;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Pair `sources` with `targets`, at most one target per source.
    ///
    /// Fails only when no pair at all is accepted.
    pub fn match_objects(
        &self,
        sources: &[MeshObject],
        targets: &[MeshObject],
        sink: &mut dyn ReportSink,
    ) -> TransferResult<Vec<ObjectPair>> {
        let pairs = match self.ordered_pairs(sources, targets) {
            Some(pairs) => {
                info!(pairs = pairs.len(), "objects paired by ordering key");
                pairs
            }
            None => self.geometric_pairs(sources, targets, sink),
        };

        if pairs.is_empty() {
            return Err(TransferError::BatchMatchFailure {
                matched: 0,
                source_count: sources.len(),
                target_count: targets.len(),
            });
        }
        Ok(pairs)
    }

    fn ordered_pairs(&self, sources: &[MeshObject], targets: &[MeshObject]) -> Option<Vec<ObjectPair>> {
        if !self.allow_ordered || sources.len() != targets.len() || sources.is_empty() {
            return None;
        }
        let source_order = sorted_by_key(sources)?;
        let target_order = sorted_by_key(targets)?;
        Some(
            source_order
                .into_iter()
                .zip(target_order)
                .map(|(source, target)| ObjectPair {
                    source,
                    target,
                    ratio: None,
                    confidence: PairConfidence::Ordered,
                })
                .collect(),
        )
    }

    fn geometric_pairs(
        &self,
        sources: &[MeshObject],
        targets: &[MeshObject],
        sink: &mut dyn ReportSink,
    ) -> Vec<ObjectPair> {
        let source_sigs = self.signatures(sources);
        let target_sigs = self.signatures(targets);

        let mut target_order: Vec<usize> = (0..targets.len()).collect();
        target_order.sort_by(|&a, &b| targets[a].id.cmp(&targets[b].id));

        let evaluate = |s: usize| -> SourceCandidates {
            let candidates: Vec<usize> = target_order
                .iter()
                .copied()
                .filter(|&t| target_sigs[t] == source_sigs[s])
                .collect();
            let skipped = targets.len() - candidates.len();
            if candidates.is_empty() {
                return SourceCandidates {
                    skipped,
                    accepted: Vec::new(),
                };
            }
            let matcher = CorrespondenceMatcher::new().with_probe(ProbeMode::Neighborhood);
            let index = SpatialHashIndex::build(&sources[s].mesh.positions, matcher.cell_size());
            let accepted = candidates
                .into_iter()
                .filter_map(|t| {
                    let correspondence =
                        matcher.match_against(&index, &targets[t].mesh.positions, self.scale);
                    let ratio = correspondence.match_ratio();
                    debug!(
                        source = %sources[s].id,
                        target = %targets[t].id,
                        ratio,
                        "candidate evaluated"
                    );
                    correspondence.is_accepted(self.threshold).then(|| Accepted {
                        target: t,
                        ratio,
                        matched: correspondence.matched(),
                        total: correspondence.target_count(),
                    })
                })
                .collect();
            SourceCandidates { skipped, accepted }
        };

        let evaluated: Vec<SourceCandidates> = if self.parallel {
            (0..sources.len()).into_par_iter().map(evaluate).collect()
        } else {
            (0..sources.len()).map(evaluate).collect()
        };

        let mut pairs = Vec::new();
        let mut mismatched = 0;
        for (s, candidates) in evaluated.into_iter().enumerate() {
            mismatched += candidates.skipped;
            let Some(chosen) = self.choose(&sources[s], targets, &candidates.accepted, sink) else {
                continue;
            };
            if chosen.0.matched < chosen.0.total {
                sink.report(
                    Warning::new(
                        WarningKind::PartialCoverage,
                        "object pair accepted with unmatched vertices",
                    )
                    .with_context([sources[s].id.as_str(), targets[chosen.0.target].id.as_str()])
                    .with_counts(chosen.0.matched, chosen.0.total),
                );
            }
            pairs.push(ObjectPair {
                source: s,
                target: chosen.0.target,
                ratio: Some(chosen.0.ratio),
                confidence: chosen.1,
            });
        }
        debug!(skipped = mismatched, "candidate pairs rejected by topology signature");
        info!(
            pairs = pairs.len(),
            sources = sources.len(),
            targets = targets.len(),
            "objects paired by geometry"
        );
        pairs
    }

    fn choose<'a>(
        &self,
        source: &MeshObject,
        targets: &[MeshObject],
        accepted: &'a [Accepted],
        sink: &mut dyn ReportSink,
    ) -> Option<(&'a Accepted, PairConfidence)> {
        match accepted {
            [] => None,
            [only] => Some((only, PairConfidence::Unique)),
            [first, ..] => {
                if self.tie_break == TieBreak::Name {
                    let wanted = strip_decorations(&source.name);
                    if let Some(hit) = accepted
                        .iter()
                        .find(|a| strip_decorations(&targets[a.target].name) == wanted)
                    {
                        return Some((hit, PairConfidence::NameMatch));
                    }
                }
                let mut context = vec![source.id.clone()];
                context.extend(accepted.iter().map(|a| targets[a.target].id.clone()));
                sink.report(
                    Warning::new(
                        WarningKind::LowConfidencePairing,
                        format!(
                            "{} candidates accepted for '{}', taking '{}'",
                            accepted.len(),
                            source.name,
                            targets[first.target].name
                        ),
                    )
                    .with_context(context),
                );
                Some((first, PairConfidence::FirstCandidate))
            }
        }
    }

    fn signatures(&self, objects: &[MeshObject]) -> Vec<TopologySignature> {
        if self.parallel {
            objects.par_iter().map(|o| TopologySignature::of(&o.mesh)).collect()
        } else {
            objects.iter().map(|o| TopologySignature::of(&o.mesh)).collect()
        }
    }
}

struct Accepted {
    target: usize,
    ratio: f64,
    matched: usize,
    total: usize,
}

struct SourceCandidates {
    skipped: usize,
    accepted: Vec<Accepted>,
}

fn sorted_by_key(objects: &[MeshObject]) -> Option<Vec<usize>> {
    let keys: Vec<&str> = objects
        .iter()
        .map(|o| o.order_key.as_deref())
        .collect::<Option<_>>()?;
    let mut order: Vec<usize> = (0..objects.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(keys[b]));
    Some(order)
}

/// Name table for the accepted pairs
pub fn name_context(pairs: &[ObjectPair], sources: &[MeshObject], targets: &[MeshObject]) -> NameContext {
    let mut names = NameContext::new();
    for pair in pairs {
        names.insert(sources[pair.source].name.clone(), targets[pair.target].name.clone());
    }
    names
}
