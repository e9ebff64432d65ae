use nalgebra::{Point3, Vector3};

/// Vectors shorter than this are treated as degenerate directions.
const DEGENERATE_NORM: f64 = 1e-10;

#[cfg(test)]
pub(crate) fn rotation_from_axis_angle(
    axis: &Vector3<f64>,
    angle_degrees: f64,
) -> nalgebra::Rotation3<f64> {
    nalgebra::Rotation3::from_axis_angle(
        &nalgebra::Unit::new_normalize(*axis),
        angle_degrees.to_radians(),
    )
}

pub fn bond_length(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

/// Angle `a-b-c` at vertex `b`, in degrees.
pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    let denom = ba.norm() * bc.norm();
    if denom < DEGENERATE_NORM {
        return 0.0;
    }
    (ba.dot(&bc) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Dihedral angle `a-b-c-d` in degrees, in the range (-180, 180].
pub fn dihedral_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    let angle = y.atan2(x).to_degrees();
    if angle <= -180.0 { angle + 360.0 } else { angle }
}

/// True when the three points lie on one line (or two of them coincide).
pub fn is_collinear(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, tolerance: f64) -> bool {
    let ab = b - a;
    let ac = c - a;
    let scale = ab.norm() * ac.norm();
    if scale < DEGENERATE_NORM {
        return true;
    }
    ab.cross(&ac).norm() / scale < tolerance
}

/// Maps an angular difference in degrees onto its smallest-magnitude representative.
///
/// The result lies in (-180, 180]; `360 - eps` becomes `-eps`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(360.0);
    if reduced > 180.0 { reduced - 360.0 } else { reduced }
}

/// Places a new point `d` from three reference points.
///
/// `d` ends up at `length` from `c`, with angle `b-c-d` equal to `angle_degrees` and
/// dihedral `a-b-c-d` equal to `dihedral_degrees`.
pub fn place_atom(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    length: f64,
    angle_degrees: f64,
    dihedral_degrees: f64,
) -> Point3<f64> {
    let theta = angle_degrees.to_radians();
    let phi = dihedral_degrees.to_radians();

    let bc = (c - b).normalize();
    let mut normal = (b - a).cross(&bc);
    if normal.norm() < DEGENERATE_NORM {
        normal = any_perpendicular(&bc);
    }
    let normal = normal.normalize();
    let in_plane = normal.cross(&bc);

    c + bc * (-length * theta.cos())
        + in_plane * (length * theta.sin() * phi.cos())
        + normal * (length * theta.sin() * phi.sin())
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper)
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn bond_angle_of_right_angle_is_ninety_degrees() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 2.0, 0.0);
        assert_close(bond_angle(&a, &b, &c), 90.0);
    }

    #[test]
    fn dihedral_angle_has_expected_sign_and_symmetry() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.0);
        let d = Point3::new(0.0, 1.0, 1.0);
        let forward = dihedral_angle(&a, &b, &c, &d);
        assert_close(forward.abs(), 90.0);
        assert_close(dihedral_angle(&d, &c, &b, &a), forward);
    }

    #[test]
    fn place_atom_reproduces_requested_internal_coordinates() {
        let a = Point3::new(1.0, 0.3, 0.2);
        let b = Point3::origin();
        let c = Point3::new(0.1, 0.2, 1.5);
        for phi in [60.0, -60.0, 120.0, 179.0, -179.0] {
            let d = place_atom(&a, &b, &c, 1.1, 110.0, phi);
            assert_close(bond_length(&c, &d), 1.1);
            assert_close(bond_angle(&b, &c, &d), 110.0);
            assert_close(dihedral_angle(&a, &b, &c, &d), phi);
        }
    }

    #[test]
    fn wrap_degrees_selects_smallest_magnitude_representative() {
        assert_close(wrap_degrees(359.0), -1.0);
        assert_close(wrap_degrees(-359.0), 1.0);
        assert_close(wrap_degrees(10.0), 10.0);
        assert_close(wrap_degrees(180.0), 180.0);
        assert_close(wrap_degrees(540.0), 180.0);
        assert_close(wrap_degrees(-190.0), 170.0);
    }

    #[test]
    fn is_collinear_detects_straight_lines() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        assert!(is_collinear(&a, &b, &Point3::new(3.0, 0.0, 0.0), 1e-6));
        assert!(!is_collinear(&a, &b, &Point3::new(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn calculate_rmsd_handles_mismatched_and_empty_inputs() {
        let p = [Point3::origin()];
        assert_eq!(calculate_rmsd(&p, &[]), None);
        assert_eq!(calculate_rmsd(&[], &[]), None);
        let q = [Point3::new(0.0, 0.0, 2.0)];
        assert_close(calculate_rmsd(&p, &q).unwrap(), 2.0);
    }
}
