// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end transfer over a two-object scene with a face locator

use anyhow::Result;
use approx::assert_relative_eq;
use meshxfer::anchor::FACE_VERTEX_GROUP;
use meshxfer::geometry::{Face, Hierarchy, Mesh, MeshObject, Model, Parent, Scene, SceneObject, UvLayer};
use meshxfer::transfer::WarningKind;
use meshxfer::{io, AnchorConfig, EngineConfig, Report, TransferDirection, TransferError, TransferPipeline};
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use tempfile::tempdir;

const SCALE: f64 = 0.08;

/// `nx` by `nz` grid in the XZ plane at `origin`, quads split in two
fn grid(nx: usize, nz: usize, origin: Vector3<f64>) -> Mesh {
    let mut mesh = Mesh::new();
    for k in 0..nz {
        for i in 0..nx {
            mesh.add_vertex(Point3::from(origin + Vector3::new(i as f64 * 0.1, 0.0, k as f64 * 0.1)));
        }
    }
    for k in 0..nz - 1 {
        for i in 0..nx - 1 {
            let a = k * nx + i;
            mesh.add_face(Face::with_material(vec![a, a + 1, a + nx + 1], (i % 2) as u32));
            mesh.add_face(Face::with_material(vec![a, a + nx + 1, a + nx], 1));
        }
    }
    mesh.materials = vec!["Skin".into(), "Cloth".into()];
    mesh
}

fn with_uv(mut mesh: Mesh) -> Mesh {
    let coords = (0..mesh.loop_count())
        .map(|c| Point2::new(c as f32 * 0.01, 0.5))
        .collect();
    let mut layer = UvLayer::new("UVMap", coords);
    layer.active = true;
    layer.active_render = true;
    mesh.uv_layers.push(layer);
    mesh
}

fn source_model() -> Model {
    let mut body = with_uv(grid(5, 5, Vector3::new(0.0, 0.0, 0.0)));
    let skirt = body.ensure_group("Skirt");
    body.set_weight(0, skirt, 0.25);
    body.set_weight(1, skirt, 0.75);
    let spine = body.ensure_group("Spine");
    body.set_weight(2, spine, 1.0);

    let mut face = with_uv(grid(4, 3, Vector3::new(1.0, 0.2, 1.5)));
    let head = face.ensure_group("Head");
    for v in 0..face.vertex_count() {
        face.set_weight(v, head, 1.0);
    }
    let blush = face.ensure_group("Blush");
    face.set_weight(5, blush, 0.5);

    Model {
        objects: vec![
            MeshObject::new("Body", body),
            MeshObject::new("Face", face).with_name("Face.001"),
        ],
        skeleton: vec!["Head".into(), "Spine".into()],
    }
}

/// Cached export: geometry scaled by 1 / SCALE, no groups, flat materials,
/// objects listed in a different order
fn target_model(source: &Model) -> Model {
    let objects = source
        .objects
        .iter()
        .rev()
        .map(|object| {
            let mut mesh = Mesh::from_parts(
                object.mesh.positions.iter().map(|p| Point3::from(p.coords / SCALE)).collect(),
                object
                    .mesh
                    .faces
                    .iter()
                    .map(|f| Face::new(f.vertices.clone()))
                    .collect(),
            );
            mesh.materials = vec!["Default".into()];
            MeshObject::new(format!("{}_cache", object.id), mesh)
        })
        .collect();
    Model {
        objects,
        skeleton: Vec::new(),
    }
}

fn scene() -> Scene {
    let source = source_model();
    let target = target_model(&source);
    let mut scene = Scene::new(source, target);
    let mut locator = SceneObject::new(
        "FaceLocator",
        Matrix4::new_translation(&Vector3::new(9.0, 9.0, 9.0)),
    );
    locator.parent = Parent::Bone {
        armature: "Armature".into(),
        bone: "Head".into(),
    };
    scene.objects = Hierarchy {
        objects: vec![locator],
    };
    scene
}

fn config() -> EngineConfig {
    EngineConfig {
        anchor: Some(AnchorConfig::new("FaceLocator")),
        ..EngineConfig::default()
    }
}

#[test]
fn test_full_transfer_to_cache() -> Result<()> {
    let mut scene = scene();
    let mut report = Report::new();
    let summary = TransferPipeline::new(config()).run(&mut scene, &mut report)?;

    assert_eq!(summary.pairs.len(), 2);
    let body_pair = summary.pairs.iter().find(|p| p.source == "Body").unwrap();
    assert_eq!(body_pair.target, "Body_cache");
    assert_eq!(body_pair.ratio, Some(1.0));
    assert_eq!(body_pair.faces_matched, Some(32));
    assert_eq!(summary.low_confidence_pairs().count(), 0);

    let body = &scene.target.find("Body_cache").unwrap().mesh;
    assert_eq!(body.materials, vec!["Skin".to_string(), "Cloth".to_string()]);
    assert_eq!(body.faces[0].material_index, 0);
    assert_eq!(body.faces[1].material_index, 1);
    assert_eq!(body.faces[2].material_index, 1);
    assert_eq!(body.uv_layers.len(), 1);
    assert!(body.uv_layers[0].active && body.uv_layers[0].active_render);

    // Bone groups stay behind, custom groups come across
    let skirt = body.group_index("Skirt").unwrap();
    assert_eq!(body.weight(0, skirt), Some(0.25));
    assert_eq!(body.weight(1, skirt), Some(0.75));
    assert!(body.group_index("Spine").is_none());

    let face = &scene.target.find("Face_cache").unwrap().mesh;
    assert!(face.group_index("Head").is_none());
    let blush = face.group_index("Blush").unwrap();
    assert_eq!(face.weight(5, blush), Some(0.5));

    // Anchor: lowest Z, then lowest X, then highest X of the 4x3 face grid
    let anchor = summary.anchor.as_ref().unwrap();
    assert_eq!(anchor.face_object, "Face_cache");
    assert_eq!(anchor.island_size, 12);
    assert_eq!(anchor.vertices, [0, 4, 3]);
    let expected = Point3::new((3.0 + 0.3) / 3.0, 0.2, (4.5 + 0.1) / 3.0) / SCALE;
    assert_relative_eq!(anchor.anchor, expected, epsilon = 1e-9);

    let group = face.group_index(FACE_VERTEX_GROUP).unwrap();
    let mut anchored = face.vertices_with_weight(group, 1.0);
    anchored.sort_unstable();
    assert_eq!(anchored, vec![0, 3, 4]);

    let locator = scene.objects.get("FaceLocator")?;
    assert_relative_eq!(locator.world_position(), expected, epsilon = 1e-9);
    match &locator.parent {
        Parent::Vertices { object, vertices, .. } => {
            assert_eq!(object, "Face_cache");
            assert_eq!(*vertices, [0, 4, 3]);
        }
        other => panic!("unexpected parent {:?}", other),
    }

    assert_eq!(report.count(WarningKind::PartialCoverage), 0);
    Ok(())
}

#[test]
fn test_rerun_is_stable() -> Result<()> {
    let mut scene = scene();
    // The locator hangs from the face after the first run, so name the group
    let mut anchor = AnchorConfig::new("FaceLocator");
    anchor.group = Some("Head".into());
    let pipeline = TransferPipeline::new(EngineConfig {
        anchor: Some(anchor),
        ..EngineConfig::default()
    });
    let mut report = Report::new();
    pipeline.run(&mut scene, &mut report)?;
    let first = scene.target.clone();

    let mut report = Report::new();
    pipeline.run(&mut scene, &mut report)?;
    assert_eq!(scene.target, first);
    Ok(())
}

#[test]
fn test_manual_face_object() -> Result<()> {
    let mut scene = scene();
    let mut anchor = AnchorConfig::new("FaceLocator");
    anchor.face_object = Some("Face.001".into());
    anchor.face_group = Some("Head".into());
    anchor.snap_to_anchor = false;
    let config = EngineConfig {
        anchor: Some(anchor),
        transfer_materials: false,
        ..EngineConfig::default()
    };
    let mut report = Report::new();
    let summary = TransferPipeline::new(config).run(&mut scene, &mut report)?;
    assert_eq!(summary.anchor.unwrap().vertices, [0, 4, 3]);

    // Without snapping the locator keeps its world position
    let locator = scene.objects.get("FaceLocator")?;
    assert_relative_eq!(locator.world_position(), Point3::new(9.0, 9.0, 9.0), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_missing_locator_is_reported() {
    let mut scene = scene();
    let config = EngineConfig {
        anchor: Some(AnchorConfig::new("Nowhere")),
        ..EngineConfig::default()
    };
    let mut report = Report::new();
    let err = TransferPipeline::new(config).run(&mut scene, &mut report).unwrap_err();
    assert!(matches!(err, TransferError::ObjectNotFound { ref id } if id == "Nowhere"));
}

#[test]
fn test_ordered_fast_path_zips_by_key() -> Result<()> {
    let mut scene = scene();
    scene.source.objects[0].order_key = Some("a".into());
    scene.source.objects[1].order_key = Some("b".into());
    // Target is reversed: Face_cache first
    scene.target.objects[0].order_key = Some("b".into());
    scene.target.objects[1].order_key = Some("a".into());

    let config = EngineConfig {
        transfer_materials: false,
        transfer_weights: false,
        ..EngineConfig::default()
    };
    let mut report = Report::new();
    let summary = TransferPipeline::new(config).run(&mut scene, &mut report)?;
    assert!(summary.pairs.iter().all(|p| p.ratio.is_none()));
    assert!(summary
        .pairs
        .iter()
        .any(|p| p.source == "Body" && p.target == "Body_cache"));
    Ok(())
}

#[test]
fn test_weight_coverage_gaps_are_reported() -> Result<()> {
    let mut scene = scene();
    let mut prop = grid(3, 3, Vector3::new(5.0, 0.0, 5.0));
    let tag = prop.ensure_group("Tag");
    prop.set_weight(4, tag, 1.0);
    scene.source.objects.push(MeshObject::new("Prop", prop).with_order_key("c"));
    // Same topology, unrelated place: zipped by key but never geometrically checked
    let stray = grid(3, 3, Vector3::new(-5.0, 0.0, -5.0)).scaled(1.0 / SCALE);
    scene.target.objects.push(MeshObject::new("Prop_cache", stray).with_order_key("c"));
    scene.source.objects[0].order_key = Some("a".into());
    scene.source.objects[1].order_key = Some("b".into());
    scene.target.objects[0].order_key = Some("b".into());
    scene.target.objects[1].order_key = Some("a".into());
    scene.target.objects[0].mesh.positions[11] = Point3::new(500.0, 500.0, 500.0);

    let config = EngineConfig {
        transfer_materials: false,
        ..EngineConfig::default()
    };
    let mut report = Report::new();
    let summary = TransferPipeline::new(config).run(&mut scene, &mut report)?;

    let prop_pair = summary.pairs.iter().find(|p| p.source == "Prop").unwrap();
    assert_eq!(prop_pair.target, "Prop_cache");
    assert_eq!(prop_pair.vertices_matched, Some(0));
    assert_eq!(prop_pair.weights_written, 0);

    let gaps: Vec<(Vec<String>, Option<(usize, usize)>)> = report
        .warnings()
        .iter()
        .filter(|w| w.kind == WarningKind::PartialCoverage)
        .map(|w| (w.context.clone(), w.counts))
        .collect();
    assert_eq!(gaps.len(), 2);
    assert!(gaps.contains(&(vec!["Face".into(), "Face_cache".into()], Some((11, 12)))));
    assert!(gaps.contains(&(vec!["Prop".into(), "Prop_cache".into()], Some((0, 9)))));

    // The partially covered pair still receives its weights
    let face = &scene.target.find("Face_cache").unwrap().mesh;
    let blush = face.group_index("Blush").unwrap();
    assert_eq!(face.weight(5, blush), Some(0.5));
    Ok(())
}

#[test]
fn test_non_finite_target_rejected() {
    let mut scene = scene();
    scene.target.objects[1].mesh.positions[3] = Point3::new(f64::NAN, 0.0, 0.0);
    let mut report = Report::new();
    let err = TransferPipeline::new(config()).run(&mut scene, &mut report).unwrap_err();
    assert!(matches!(err, TransferError::InvalidMesh { ref object, .. } if object == "Body_cache"));
}

#[test]
fn test_rigged_to_rigged_clears_target_uv() -> Result<()> {
    let source = source_model();
    let mut target = source.clone();
    for object in &mut target.objects {
        object.id = format!("{}_edit", object.id);
        object.mesh.uv_layers[0].name = "Old".into();
        object.mesh.groups.clear();
        object.mesh.weights.clear();
    }
    let mut scene = Scene::new(source, target);
    let config = EngineConfig {
        direction: TransferDirection::RiggedToRigged,
        ..EngineConfig::default()
    };
    let mut report = Report::new();
    TransferPipeline::new(config).run(&mut scene, &mut report)?;
    for object in &scene.target.objects {
        let names: Vec<&str> = object.mesh.uv_layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["UVMap"]);
    }
    Ok(())
}

#[test]
fn test_loop_count_mismatch_excludes_pair() -> Result<()> {
    let mut scene = scene();
    let body = scene
        .target
        .objects
        .iter_mut()
        .find(|o| o.id == "Body_cache")
        .unwrap();
    let first = body.mesh.faces[0].vertices[0];
    body.mesh.faces[0].vertices.push(first);

    let mut report = Report::new();
    let summary = TransferPipeline::new(EngineConfig::default()).run(&mut scene, &mut report)?;
    assert_eq!(summary.pairs.len(), 1);
    assert_eq!(summary.pairs[0].source, "Face");
    Ok(())
}

#[test]
fn test_scene_file_round_trip_through_pipeline() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("scene.json");
    io::save_scene(&scene(), &path)?;

    let mut report = Report::new();
    let (scene, summary) = meshxfer::transfer_file(&path, &config(), &mut report)?;
    assert_eq!(summary.pairs.len(), 2);
    assert!(scene.target.find("Face_cache").is_some());

    let summary_path = dir.path().join("out").join("summary.json");
    io::save_summary(&summary, &summary_path)?;
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summary_path)?)?;
    assert_eq!(written["pairs"].as_array().map(Vec::len), Some(2));
    Ok(())
}
