use super::*;
use crate::foundation::core::{Aabb, DVec3, Pose};
use crate::scene::graph::NodeId;
use crate::scene::piece::PieceSphere;

fn piece(id: &str, centers: &[DVec3]) -> Piece {
    let bounds = Aabb::from_spheres(centers, 0.5).unwrap();
    Piece {
        id: id.to_owned(),
        node: NodeId(0),
        spheres: centers
            .iter()
            .map(|c| PieceSphere {
                node: NodeId(0),
                local_offset: *c,
                radius: 0.5,
            })
            .collect(),
        original_pose: Pose::IDENTITY,
        bounds,
    }
}

fn ids(pieces: &[Piece]) -> Vec<String> {
    piece_order(pieces)
        .into_iter()
        .map(|i| pieces[i].id.clone())
        .collect()
}

#[test]
fn lower_pieces_come_first() {
    let pieces = vec![
        piece("top", &[DVec3::new(0.0, 2.5, 0.0)]),
        piece("bottom", &[DVec3::new(0.0, 0.5, 0.0)]),
        piece("middle", &[DVec3::new(0.0, 1.5, 0.0)]),
    ];
    assert_eq!(ids(&pieces), ["bottom", "middle", "top"]);
}

#[test]
fn centroid_breaks_min_y_ties() {
    let pieces = vec![
        piece("tall", &[DVec3::new(0.0, 0.5, 0.0), DVec3::new(0.0, 1.5, 0.0)]),
        piece("flat", &[DVec3::new(1.0, 0.5, 0.0), DVec3::new(2.0, 0.5, 0.0)]),
    ];
    assert_eq!(ids(&pieces), ["flat", "tall"]);
}

#[test]
fn near_equal_values_tie_and_fall_back_to_id() {
    let pieces = vec![
        piece("b", &[DVec3::new(0.0, 0.5, 0.0)]),
        piece("a", &[DVec3::new(1.0, 0.5 + 5e-7, 0.0)]),
        piece("c", &[DVec3::new(2.0, 0.5 - 5e-7, 0.0)]),
    ];
    assert_eq!(ids(&pieces), ["a", "b", "c"]);
}

#[test]
fn identical_boxes_order_by_id_regardless_of_input_order() {
    let mut pieces = vec![
        piece("p3", &[DVec3::new(0.0, 0.5, 0.0)]),
        piece("p1", &[DVec3::new(0.0, 0.5, 0.0)]),
        piece("p2", &[DVec3::new(0.0, 0.5, 0.0)]),
    ];
    let first = ids(&pieces);
    pieces.reverse();
    assert_eq!(ids(&pieces), first);
    assert_eq!(first, ["p1", "p2", "p3"]);
}

#[test]
fn keys_form_a_strict_total_order() {
    let pieces: Vec<Piece> = (0..12)
        .map(|i| {
            let y = 0.5 + (i % 4) as f64 * 1e-7 + (i / 4) as f64;
            piece(&format!("p{}", 11 - i), &[DVec3::new(i as f64, y, 0.0)])
        })
        .collect();
    let keys = order_keys(&pieces);
    for a in &keys {
        assert_eq!(compare_keys(a, a), Ordering::Equal);
        for b in &keys {
            if a.index != b.index {
                assert_ne!(compare_keys(a, b), Ordering::Equal);
            }
            assert_eq!(compare_keys(a, b), compare_keys(b, a).reverse());
            for c in &keys {
                if compare_keys(a, b) == Ordering::Less && compare_keys(b, c) == Ordering::Less {
                    assert_eq!(compare_keys(a, c), Ordering::Less);
                }
            }
        }
    }
    assert_eq!(piece_order(&pieces), piece_order(&pieces));
}
