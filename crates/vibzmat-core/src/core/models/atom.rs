use nalgebra::Point3;

/// A single atom of a [`Geometry`](super::geometry::Geometry).
///
/// The `index` is the stable identity of the atom across a trajectory or a
/// displacement; arithmetic on geometries never changes it, nor the element label.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The integer label identifying this atom within its geometry.
    pub index: usize,
    /// The element label as read from or written to file (e.g. "C", "Cl").
    pub element: String,
    /// The Cartesian position in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(index: usize, element: &str, position: Point3<f64>) -> Self {
        Self {
            index,
            element: element.to_string(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_stores_all_fields() {
        let atom = Atom::new(3, "O", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.index, 3);
        assert_eq!(atom.element, "O");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let atom1 = Atom::new(0, "N", Point3::origin());
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }
}
