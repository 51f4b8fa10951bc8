//! Serialization and index-array round trips of [`Mesh`].

use proptest::prelude::*;
use trimesh2d::core::validation::validate;
use trimesh2d::prelude::*;

fn sample() -> DelaunayTriangulation {
    DelaunayTriangulation::from_points(&[
        Point::new(0.0, 0.0, 1.0),
        Point::new(3.0, 0.0, 2.0),
        Point::new(1.0, 2.5, 0.5),
        Point::new(1.2, 0.8, -1.0),
        Point::new(3.5, 2.0, 0.0),
    ])
    .unwrap()
}

/// Edges as sorted vertex pairs, each with the sorted pair of opposite vertices.
fn edge_signature(mesh: &Mesh) -> Vec<((VertexId, VertexId), Vec<VertexId>)> {
    let mut edges: FastHashMap<(VertexId, VertexId), Vec<VertexId>> = FastHashMap::default();
    for (_, t) in mesh.finite_triangles() {
        for corner in Corner::ALL {
            let (a, b) = t.edge(corner);
            edges
                .entry((a.min(b), a.max(b)))
                .or_default()
                .push(t.vertex(corner));
        }
    }
    let mut signature: Vec<_> = edges
        .into_iter()
        .map(|(edge, mut opposite)| {
            opposite.sort_unstable();
            (edge, opposite)
        })
        .collect();
    signature.sort_unstable();
    signature
}

#[test]
fn json_round_trip() {
    let mesh = sample().into_mesh();
    let json = serde_json::to_string(&mesh).unwrap();
    let restored: Mesh = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, mesh);
    assert!(!restored.points()[0].is_finite());
    assert!(validate(&restored, ValidationOptions::delaunay()).is_ok());
}

#[test]
fn wire_form_omits_the_sentinel() {
    let mesh = sample().into_mesh();
    let value = serde_json::to_value(&mesh).unwrap();
    assert_eq!(value["points"].as_array().unwrap().len(), 5);
    assert_eq!(value["anchors"].as_array().unwrap().len(), 6);
    assert_eq!(
        value["triangles"].as_array().unwrap().len(),
        mesh.number_of_triangles()
    );
}

#[test]
fn sentinel_anchor_carries_the_hull() {
    let mesh = sample().into_mesh();
    let value = serde_json::to_value(&mesh).unwrap();
    let sentinel_anchor = value["anchors"][0].as_u64().unwrap();
    let anchor = TriangleId::new(usize::try_from(sentinel_anchor).unwrap());
    assert!(mesh.triangle(anchor).unwrap().is_infinite());

    let restored: Mesh = serde_json::from_value(value).unwrap();
    assert_eq!(restored.hull_vertices(), mesh.hull_vertices());
    assert!(!restored.hull_vertices().is_empty());
}

#[test]
fn corrupted_wire_form_is_rejected() {
    let mesh = sample().into_mesh();
    let value = serde_json::to_value(&mesh).unwrap();

    let mut dangling = value.clone();
    dangling["triangles"][0]["neighbors"][0] = serde_json::json!(999);
    assert!(serde_json::from_value::<Mesh>(dangling).is_err());

    let mut unknown_vertex = value.clone();
    unknown_vertex["triangles"][0]["vertices"][1] = serde_json::json!(42);
    assert!(serde_json::from_value::<Mesh>(unknown_vertex).is_err());

    let mut short = value;
    short["anchors"].as_array_mut().unwrap().pop();
    assert!(serde_json::from_value::<Mesh>(short).is_err());
}

#[test]
fn index_array_round_trip() {
    let mesh = sample().into_mesh();
    let (points, triangles) = mesh.to_index_arrays();
    assert_eq!(points.len(), mesh.number_of_vertices());
    assert_eq!(triangles.len(), mesh.number_of_finite_triangles());

    let rebuilt = MeshBuilder::from_arrays(&points, &triangles).unwrap();
    assert_eq!(edge_signature(&rebuilt), edge_signature(&mesh));
    let open = ValidationOptions {
        require_closed: false,
        ..ValidationOptions::default()
    };
    assert!(validate(&rebuilt, open).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trips_preserve_connectivity(
        coords in prop::collection::vec((-50.0..50.0f64, -50.0..50.0f64, -5.0..5.0f64), 3..30)
    ) {
        let mut dt = DelaunayTriangulation::new();
        for (x, y, z) in coords {
            // Collinear bootstraps and near-duplicates are skipped.
            let _ = dt.insert(Point::new(x, y, z));
        }
        prop_assume!(dt.state() == ConstructionState::Ready);
        let mesh = dt.into_mesh();

        let json = serde_json::to_string(&mesh).unwrap();
        let restored: Mesh = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&restored, &mesh);

        let (points, triangles) = mesh.to_index_arrays();
        let rebuilt = MeshBuilder::from_arrays(&points, &triangles).unwrap();
        prop_assert_eq!(edge_signature(&rebuilt), edge_signature(&mesh));
        prop_assert_eq!(rebuilt.points(), mesh.points());
    }
}
