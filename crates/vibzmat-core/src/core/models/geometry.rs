use super::atom::Atom;
use crate::core::utils::elements::atomic_mass;
use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Vector3};
use std::collections::{HashMap, HashSet};
use std::ops::Mul;
use thiserror::Error;

/// Projections smaller than this (in Angstroms) do not decide the sign of a principal axis.
const AXIS_SIGN_THRESHOLD: f64 = 1e-3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Duplicate atom index: {0}")]
    DuplicateIndex(usize),
    #[error("Atom index {0} not found in geometry")]
    MissingIndex(usize),
    #[error("Atom index sets differ ({left} vs. {right} atoms)")]
    IndexMismatch { left: usize, right: usize },
    #[error("No atomic mass known for element '{0}'")]
    UnknownElement(String),
    #[error("Operation requires a non-empty geometry")]
    Empty,
}

/// A molecular geometry: an ordered collection of atoms keyed by a stable integer index.
///
/// The order of atoms is the order in which they were added; lookups by atom index go
/// through an internal map. All arithmetic (scaling, translation, addition, subtraction)
/// returns a new `Geometry` and leaves element labels and indices untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Atom storage in insertion order.
    atoms: Vec<Atom>,
    /// Lookup from atom index to position in `atoms`.
    index_map: HashMap<usize, usize>,
}

/// The result of a principal-axes transformation.
#[derive(Debug, Clone)]
pub struct InertiaFrame {
    /// Principal moments of inertia in ascending order (amu·Å²).
    pub moments: Vector3<f64>,
    /// Principal axes as matrix columns, ordered like `moments`; always a proper rotation.
    pub axes: Matrix3<f64>,
    /// The geometry moved to its centre of mass and expressed in the principal-axes frame.
    pub transformed: Geometry,
}

impl Geometry {
    /// Creates a new, empty geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a geometry from atoms, keeping their order.
    ///
    /// # Arguments
    ///
    /// * `atoms` - The atoms to insert.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DuplicateIndex`] if two atoms share an index.
    pub fn from_atoms(atoms: impl IntoIterator<Item = Atom>) -> Result<Self, GeometryError> {
        let mut geometry = Self::new();
        for atom in atoms {
            geometry.push(atom)?;
        }
        Ok(geometry)
    }

    /// Appends an atom.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DuplicateIndex`] if the index is already present.
    pub fn push(&mut self, atom: Atom) -> Result<(), GeometryError> {
        if self.index_map.contains_key(&atom.index) {
            return Err(GeometryError::DuplicateIndex(atom.index));
        }
        self.index_map.insert(atom.index, self.atoms.len());
        self.atoms.push(atom);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns the atoms in their stored order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Looks up an atom by its index.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the index exists, otherwise `None`.
    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.index_map.get(&index).map(|&pos| &self.atoms[pos])
    }

    pub fn contains(&self, index: usize) -> bool {
        self.index_map.contains_key(&index)
    }

    /// Returns the atom indices in stored order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms.iter().map(|atom| atom.index)
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|atom| atom.position).collect()
    }

    pub fn elements(&self) -> Vec<&str> {
        self.atoms.iter().map(|atom| atom.element.as_str()).collect()
    }

    /// Checks whether both geometries carry exactly the same set of atom indices.
    pub fn has_same_indices(&self, other: &Geometry) -> bool {
        self.len() == other.len() && self.indices().all(|index| other.contains(index))
    }

    /// Returns a copy with atoms sorted by ascending index.
    pub fn sort_index(&self) -> Geometry {
        let mut atoms = self.atoms.clone();
        atoms.sort_by_key(|atom| atom.index);
        Self::from_unique_atoms(atoms)
    }

    /// Returns a copy whose atom order follows `template`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexMismatch`] when the index sets differ.
    pub fn reindex_like(&self, template: &Geometry) -> Result<Geometry, GeometryError> {
        self.ensure_same_indices(template)?;
        let atoms = template
            .indices()
            .map(|index| self.lookup(index).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_unique_atoms(atoms))
    }

    /// Multiplies every coordinate by `factor`.
    pub fn scaled(&self, factor: f64) -> Geometry {
        self.map_positions(|p| Point3::from(p.coords * factor))
    }

    pub fn translated(&self, shift: &Vector3<f64>) -> Geometry {
        self.map_positions(|p| p + shift)
    }

    /// Applies a rotation about the origin.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Geometry {
        self.map_positions(|p| rotation * p)
    }

    /// Adds the coordinates of `other` atom by atom (matched by index).
    ///
    /// The result keeps the order and element labels of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexMismatch`] when the index sets differ.
    pub fn try_add(&self, other: &Geometry) -> Result<Geometry, GeometryError> {
        self.combine(other, |a, b| a + b.coords)
    }

    /// Subtracts the coordinates of `other` atom by atom (matched by index).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexMismatch`] when the index sets differ.
    pub fn try_sub(&self, other: &Geometry) -> Result<Geometry, GeometryError> {
        self.combine(other, |a, b| a - b.coords)
    }

    /// Computes the mass-weighted centre of the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Empty`] for an empty geometry and
    /// [`GeometryError::UnknownElement`] if a mass is unavailable.
    pub fn center_of_mass(&self) -> Result<Point3<f64>, GeometryError> {
        if self.is_empty() {
            return Err(GeometryError::Empty);
        }
        let masses = self.masses()?;
        let total: f64 = masses.iter().sum();
        let weighted = self
            .atoms
            .iter()
            .zip(&masses)
            .fold(Vector3::zeros(), |acc, (atom, m)| acc + atom.position.coords * *m);
        Ok(Point3::from(weighted / total))
    }

    /// Computes the inertia tensor about the centre of mass.
    pub fn inertia_tensor(&self) -> Result<Matrix3<f64>, GeometryError> {
        let com = self.center_of_mass()?;
        let masses = self.masses()?;
        let mut tensor = Matrix3::zeros();
        for (atom, m) in self.atoms.iter().zip(&masses) {
            let r = atom.position - com;
            tensor += (Matrix3::identity() * r.norm_squared() - r * r.transpose()) * *m;
        }
        Ok(tensor)
    }

    /// Moves the geometry to its centre of mass and rotates it onto its principal axes.
    ///
    /// Axes are sorted by ascending moment. The sign of the first two axes is fixed so
    /// that the first atom with a significant projection lies on the positive side, and
    /// the third axis completes a right-handed frame. Two copies of a molecule related by
    /// a rigid motion therefore map onto the same coordinates, as long as their moments
    /// are non-degenerate.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Geometry::center_of_mass`].
    pub fn inertia(&self) -> Result<InertiaFrame, GeometryError> {
        let com = self.center_of_mass()?;
        let centered = self.translated(&-com.coords);
        let eigen = SymmetricEigen::new(centered.inertia_tensor()?);

        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a]
                .partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let first = centered.oriented_axis(eigen.eigenvectors.column(order[0]).into_owned());
        let second = centered.oriented_axis(eigen.eigenvectors.column(order[1]).into_owned());
        let third = first.cross(&second);
        let axes = Matrix3::from_columns(&[first, second, third]);

        let moments = Vector3::new(
            eigen.eigenvalues[order[0]],
            eigen.eigenvalues[order[1]],
            eigen.eigenvalues[order[2]],
        );
        let basis_transpose = axes.transpose();
        let transformed = centered.map_positions(|p| Point3::from(basis_transpose * p.coords));

        Ok(InertiaFrame {
            moments,
            axes,
            transformed,
        })
    }

    fn oriented_axis(&self, axis: Vector3<f64>) -> Vector3<f64> {
        let deciding = self
            .atoms
            .iter()
            .map(|atom| atom.position.coords.dot(&axis))
            .find(|projection| projection.abs() > AXIS_SIGN_THRESHOLD);
        match deciding {
            Some(projection) if projection < 0.0 => -axis,
            _ => axis,
        }
    }

    fn masses(&self) -> Result<Vec<f64>, GeometryError> {
        self.atoms
            .iter()
            .map(|atom| {
                atomic_mass(&atom.element)
                    .ok_or_else(|| GeometryError::UnknownElement(atom.element.clone()))
            })
            .collect()
    }

    fn lookup(&self, index: usize) -> Result<&Atom, GeometryError> {
        self.get(index).ok_or(GeometryError::MissingIndex(index))
    }

    fn ensure_same_indices(&self, other: &Geometry) -> Result<(), GeometryError> {
        if self.has_same_indices(other) {
            Ok(())
        } else {
            Err(GeometryError::IndexMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }

    fn combine(
        &self,
        other: &Geometry,
        op: impl Fn(Point3<f64>, Point3<f64>) -> Point3<f64>,
    ) -> Result<Geometry, GeometryError> {
        self.ensure_same_indices(other)?;
        let atoms = self
            .atoms
            .iter()
            .map(|atom| {
                let rhs = other.lookup(atom.index)?;
                Ok(Atom {
                    position: op(atom.position, rhs.position),
                    ..atom.clone()
                })
            })
            .collect::<Result<Vec<_>, GeometryError>>()?;
        Ok(Self::from_unique_atoms(atoms))
    }

    fn map_positions(&self, f: impl Fn(&Point3<f64>) -> Point3<f64>) -> Geometry {
        Geometry {
            atoms: self
                .atoms
                .iter()
                .map(|atom| Atom {
                    position: f(&atom.position),
                    ..atom.clone()
                })
                .collect(),
            index_map: self.index_map.clone(),
        }
    }

    // Callers guarantee uniqueness: the atoms come from an existing geometry.
    fn from_unique_atoms(atoms: Vec<Atom>) -> Geometry {
        let index_map = atoms
            .iter()
            .enumerate()
            .map(|(pos, atom)| (atom.index, pos))
            .collect();
        Geometry { atoms, index_map }
    }
}

impl Mul<f64> for &Geometry {
    type Output = Geometry;

    fn mul(self, factor: f64) -> Geometry {
        self.scaled(factor)
    }
}

impl Mul<f64> for Geometry {
    type Output = Geometry;

    fn mul(self, factor: f64) -> Geometry {
        self.scaled(factor)
    }
}

/// Returns the element labels of `geometry` that differ from those of `template` at the
/// same atom index, as `(index, template_element, other_element)`.
pub fn element_mismatches<'a>(
    template: &'a Geometry,
    geometry: &'a Geometry,
) -> Vec<(usize, &'a str, &'a str)> {
    let seen: HashSet<usize> = geometry.indices().collect();
    template
        .atoms()
        .iter()
        .filter(|atom| seen.contains(&atom.index))
        .filter_map(|atom| {
            let other = geometry.get(atom.index)?;
            (other.element != atom.element)
                .then_some((atom.index, atom.element.as_str(), other.element.as_str()))
        })
        .collect()
}
