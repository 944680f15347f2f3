// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! UV layer copy between meshes with identical face-corner layout

use super::report::{ReportSink, Warning, WarningKind};
use super::PairContext;
use crate::geometry::{Mesh, UvLayer};
use tracing::debug;

/// Most UV layers a mesh may carry
pub const MAX_UV_LAYERS: usize = 8;

/// Names of all UV layers of `mesh`, in order
pub fn layer_names(mesh: &Mesh) -> Vec<String> {
    mesh.uv_layers.iter().map(|l| l.name.clone()).collect()
}

/// Copy the named UV layers from `source` onto `target`, corner for corner.
///
/// Requires equal face-corner counts; otherwise nothing is copied and a
/// [`WarningKind::CornerCountMismatch`] warning carries both counts. A
/// target layer of the same name is overwritten rather than duplicated.
/// With `clear_target`, existing target layers are dropped first.
///
/// Returns the number of layers written.
pub fn transfer_uv(
    source: &Mesh,
    target: &mut Mesh,
    layers: &[String],
    clear_target: bool,
    pair: PairContext<'_>,
    sink: &mut dyn ReportSink,
) -> usize {
    if source.uv_layers.is_empty() || layers.is_empty() {
        return 0;
    }
    let source_loops = source.loop_count();
    let target_loops = target.loop_count();
    if source_loops != target_loops {
        sink.report(
            Warning::new(
                WarningKind::CornerCountMismatch,
                format!(
                    "UV layers not copied: face corners differ (source {} corners, target {} corners)",
                    source_loops,
                    target_loops
                ),
            )
            .with_context([pair.source, pair.target])
            .with_counts(source_loops, target_loops),
        );
        return 0;
    }

    let previous_active = active_name(target, |l| l.active);
    let previous_render = active_name(target, |l| l.active_render);
    if clear_target {
        target.uv_layers.clear();
    }
    let had_layers = !target.uv_layers.is_empty();

    let mut written = 0;
    for name in layers {
        let Some(layer) = source.uv_layer(name) else {
            continue;
        };
        if let Some(existing) = target.uv_layers.iter_mut().find(|l| &l.name == name) {
            existing.coords = layer.coords.clone();
            written += 1;
            continue;
        }
        if target.uv_layers.len() >= MAX_UV_LAYERS {
            sink.report(
                Warning::new(
                    WarningKind::UvLayerLimit,
                    format!("UV layer '{}' not created: target already has {} layers", name, target.uv_layers.len()),
                )
                .with_context([pair.source, pair.target])
                .with_counts(target.uv_layers.len(), MAX_UV_LAYERS),
            );
            continue;
        }
        target
            .uv_layers
            .push(UvLayer::new(name.clone(), layer.coords.clone()));
        written += 1;
    }

    if had_layers {
        restore_flags(target, previous_active.as_deref(), previous_render.as_deref(), false);
    } else {
        let source_active = active_name(source, |l| l.active);
        let source_render = active_name(source, |l| l.active_render);
        restore_flags(target, source_active.as_deref(), source_render.as_deref(), true);
    }
    debug!(source = pair.source, target = pair.target, written, "UV layers copied");
    written
}

fn active_name(mesh: &Mesh, flag: impl Fn(&UvLayer) -> bool) -> Option<String> {
    mesh.uv_layers.iter().find(|l| flag(l)).map(|l| l.name.clone())
}

/// Flag the named layers active and active-render and clear the flag on
/// every other layer. With `first_by_default`, an unnamed or missing layer
/// falls back to the first one; otherwise that flag stays unset.
fn restore_flags(mesh: &mut Mesh, active: Option<&str>, render: Option<&str>, first_by_default: bool) {
    if mesh.uv_layers.is_empty() {
        return;
    }
    let pick = |name: Option<&str>| {
        name.and_then(|n| mesh.uv_layers.iter().position(|l| l.name == n))
            .or(first_by_default.then_some(0))
    };
    let active = pick(active);
    let render = pick(render);
    for (i, layer) in mesh.uv_layers.iter_mut().enumerate() {
        layer.active = active == Some(i);
        layer.active_render = render == Some(i);
    }
}
