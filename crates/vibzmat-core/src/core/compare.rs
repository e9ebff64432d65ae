use crate::core::models::geometry::{Geometry, element_mismatches};
use crate::core::utils::geometry::calculate_rmsd;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsCloseOptions {
    /// Move both geometries to their centres of mass and principal axes first.
    pub align: bool,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for IsCloseOptions {
    fn default() -> Self {
        Self {
            align: true,
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

/// Compares two geometries coordinate by coordinate.
///
/// Every component must satisfy `|x - y| <= atol + rtol * |y|`, where `y` is taken
/// from `b` after reordering it like `a`. Differing index sets or element labels give
/// `false` rather than an error.
pub fn isclose(a: &Geometry, b: &Geometry, options: &IsCloseOptions) -> bool {
    let Some((a, b)) = comparable(a, b, options.align) else {
        return false;
    };
    a.positions().iter().zip(b.positions()).all(|(x, y)| {
        (0..3).all(|k| (x[k] - y[k]).abs() <= options.atol + options.rtol * y[k].abs())
    })
}

/// Root-mean-square deviation after the same pretest and optional alignment as [`isclose`].
pub fn rmsd(a: &Geometry, b: &Geometry, align: bool) -> Option<f64> {
    let (a, b) = comparable(a, b, align)?;
    calculate_rmsd(&a.positions(), &b.positions())
}

fn comparable(a: &Geometry, b: &Geometry, align: bool) -> Option<(Geometry, Geometry)> {
    if !a.has_same_indices(b) {
        debug!("Geometries differ in their atom indices.");
        return None;
    }
    let mismatches = element_mismatches(a, b);
    if !mismatches.is_empty() {
        debug!(count = mismatches.len(), "Geometries differ in element labels.");
        return None;
    }

    if !align {
        return Some((a.clone(), b.reindex_like(a).ok()?));
    }
    let frame_a = a
        .inertia()
        .inspect_err(|e| debug!("Cannot align first geometry: {}", e))
        .ok()?
        .transformed;
    // Axis signs follow atom order, so both geometries must share it.
    let frame_b = b
        .reindex_like(a)
        .ok()?
        .inertia()
        .inspect_err(|e| debug!("Cannot align second geometry: {}", e))
        .ok()?
        .transformed;
    Some((frame_a, frame_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::utils::geometry::rotation_from_axis_angle;
    use nalgebra::{Point3, Vector3};

    fn molecule() -> Geometry {
        Geometry::from_atoms([
            Atom::new(0, "C", Point3::new(0.0, 0.0, 0.0)),
            Atom::new(1, "O", Point3::new(1.21, 0.0, 0.0)),
            Atom::new(2, "H", Point3::new(-0.55, 0.94, 0.0)),
            Atom::new(3, "N", Point3::new(-0.70, -1.10, 0.35)),
        ])
        .unwrap()
    }

    fn moved(geometry: &Geometry) -> Geometry {
        let rotation = rotation_from_axis_angle(&Vector3::new(0.3, -1.0, 0.6), 73.0);
        geometry
            .rotated(&rotation)
            .translated(&Vector3::new(2.0, -1.0, 4.5))
    }

    #[test]
    fn aligned_comparison_ignores_rigid_motion() {
        let a = molecule();
        let b = moved(&a);
        assert!(isclose(&a, &b, &IsCloseOptions::default()));
        assert!(rmsd(&a, &b, true).unwrap() < 1e-8);
    }

    #[test]
    fn unaligned_comparison_detects_rigid_motion() {
        let a = molecule();
        let b = moved(&a);
        let options = IsCloseOptions {
            align: false,
            ..IsCloseOptions::default()
        };
        assert!(!isclose(&a, &b, &options));
    }

    #[test]
    fn comparison_matches_atoms_by_index_not_position() {
        let a = molecule();
        let reversed = Geometry::from_atoms(a.atoms().iter().rev().cloned()).unwrap();
        let options = IsCloseOptions {
            align: false,
            ..IsCloseOptions::default()
        };
        assert!(isclose(&a, &reversed, &options));
        assert!(isclose(&a, &moved(&reversed), &IsCloseOptions::default()));
    }

    #[test]
    fn tolerances_are_respected() {
        let a = molecule();
        let options = IsCloseOptions {
            align: false,
            ..IsCloseOptions::default()
        };
        let tiny = a.translated(&Vector3::new(1e-10, 0.0, 0.0));
        let large = a.translated(&Vector3::new(1e-3, 0.0, 0.0));
        assert!(isclose(&a, &tiny, &options));
        assert!(!isclose(&a, &large, &options));
    }

    #[test]
    fn mismatched_inputs_are_not_close() {
        let a = molecule();
        let disjoint = Geometry::from_atoms(
            a.atoms()
                .iter()
                .map(|atom| Atom::new(atom.index + 10, &atom.element, atom.position)),
        )
        .unwrap();
        assert!(!isclose(&a, &disjoint, &IsCloseOptions::default()));

        let relabeled = Geometry::from_atoms(a.atoms().iter().map(|atom| {
            let element = if atom.index == 3 { "C" } else { atom.element.as_str() };
            Atom::new(atom.index, element, atom.position)
        }))
        .unwrap();
        assert!(!isclose(&a, &relabeled, &IsCloseOptions::default()));
        assert_eq!(rmsd(&a, &relabeled, false), None);
    }
}
