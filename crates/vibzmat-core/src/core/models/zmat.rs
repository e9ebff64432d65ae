use super::atom::Atom;
use super::geometry::{Geometry, GeometryError};
use crate::core::utils::geometry::{
    bond_angle, bond_length, dihedral_angle, is_collinear, place_atom, wrap_degrees,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Relative cross-product norm below which three reference atoms count as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Error)]
pub enum ZmatError {
    #[error("Invalid construction entry at row {row} (atom {atom}): {reason}")]
    InvalidEntry {
        row: usize,
        atom: usize,
        reason: String,
    },
    #[error("Atom {0} appears more than once in the construction table")]
    DuplicateAtom(usize),
    #[error("Construction table references atom {0}, which is not in the geometry")]
    MissingAtom(usize),
    #[error("Construction table covers {table} atoms but the geometry has {geometry}")]
    Coverage { table: usize, geometry: usize },
    #[error("Internal coordinates built from different construction tables cannot be combined")]
    TableMismatch,
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// One row of a construction table: how the position of `atom` is expressed.
///
/// `bond`, `angle` and `dihedral` name the reference atoms for the bond length
/// (`atom`–`bond`), the bond angle (`atom`–`bond`–`angle`) and the dihedral
/// (`atom`–`bond`–`angle`–`dihedral`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructionEntry {
    pub atom: usize,
    pub bond: Option<usize>,
    pub angle: Option<usize>,
    pub dihedral: Option<usize>,
}

/// The fixed choice of internal-coordinate references used to build a Z-matrix.
///
/// Row 0 has no references, row 1 only a bond reference, row 2 a bond and an angle
/// reference and every later row all three. References always point to atoms of
/// earlier rows. Two Z-matrices can only be subtracted if they share the same table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantTable {
    entries: Vec<ConstructionEntry>,
}

impl ConstantTable {
    /// Creates a table after checking its structural rules.
    ///
    /// # Errors
    ///
    /// Returns [`ZmatError::InvalidEntry`] or [`ZmatError::DuplicateAtom`] when a row
    /// has the wrong number of references, references a later row, or repeats an atom.
    pub fn new(entries: Vec<ConstructionEntry>) -> Result<Self, ZmatError> {
        let mut seen = HashSet::new();
        for (row, entry) in entries.iter().enumerate() {
            let invalid = |reason: &str| ZmatError::InvalidEntry {
                row,
                atom: entry.atom,
                reason: reason.to_string(),
            };

            let refs = [entry.bond, entry.angle, entry.dihedral];
            let expected = row.min(3);
            let present = refs.iter().take_while(|r| r.is_some()).count();
            if present != expected || refs.iter().filter(|r| r.is_some()).count() != expected {
                return Err(invalid(&format!(
                    "expected {} leading reference(s), found {:?}",
                    expected, refs
                )));
            }

            let mut row_atoms = HashSet::from([entry.atom]);
            for reference in refs.iter().flatten() {
                if !seen.contains(reference) {
                    return Err(invalid(&format!(
                        "reference {} is not defined in an earlier row",
                        reference
                    )));
                }
                if !row_atoms.insert(*reference) {
                    return Err(invalid("references must be distinct"));
                }
            }

            if !seen.insert(entry.atom) {
                return Err(ZmatError::DuplicateAtom(entry.atom));
            }
        }
        Ok(Self { entries })
    }

    /// Derives a construction table from the connectivity implied by distances.
    ///
    /// Construction starts at the atom closest to the centroid and repeatedly adds the
    /// unplaced atom nearest to any placed atom, bonded to that placed atom. Angle and
    /// dihedral references are the nearest placed atoms that do not form a collinear
    /// triple with the previous references.
    ///
    /// # Errors
    ///
    /// Returns [`ZmatError::Geometry`] with [`GeometryError::Empty`] for an empty geometry.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, ZmatError> {
        let atoms = geometry.atoms();
        if atoms.is_empty() {
            return Err(GeometryError::Empty.into());
        }

        let positions: HashMap<usize, Point3<f64>> =
            atoms.iter().map(|a| (a.index, a.position)).collect();
        let centroid = atoms
            .iter()
            .fold(Vector3::zeros(), |acc, a| acc + a.position.coords)
            / atoms.len() as f64;

        let start = atoms
            .iter()
            .min_by(|a, b| {
                let da = (a.position.coords - centroid).norm();
                let db = (b.position.coords - centroid).norm();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|a| a.index)
            .ok_or(GeometryError::Empty)?;

        let mut placed = vec![start];
        let mut entries = vec![ConstructionEntry {
            atom: start,
            bond: None,
            angle: None,
            dihedral: None,
        }];

        while placed.len() < atoms.len() {
            let mut best: Option<(f64, usize, usize)> = None;
            for candidate in atoms.iter().filter(|a| !placed.contains(&a.index)) {
                for &anchor in &placed {
                    let distance = bond_length(&candidate.position, &positions[&anchor]);
                    if best.is_none_or(|(d, _, _)| distance < d) {
                        best = Some((distance, candidate.index, anchor));
                    }
                }
            }
            let Some((_, atom, bond)) = best else {
                break;
            };

            let angle = (placed.len() >= 2).then(|| {
                pick_reference(&placed, &positions, &[bond], bond, |c| {
                    !is_collinear(
                        &positions[&atom],
                        &positions[&bond],
                        &positions[&c],
                        COLLINEAR_TOLERANCE,
                    )
                })
            });
            let dihedral = match angle {
                Some(angle) if placed.len() >= 3 => Some(pick_reference(
                    &placed,
                    &positions,
                    &[bond, angle],
                    angle,
                    |c| {
                        !is_collinear(
                            &positions[&bond],
                            &positions[&angle],
                            &positions[&c],
                            COLLINEAR_TOLERANCE,
                        )
                    },
                )),
                _ => None,
            };

            entries.push(ConstructionEntry {
                atom,
                bond: Some(bond),
                angle,
                dihedral,
            });
            placed.push(atom);
        }

        Self::new(entries)
    }

    pub fn entries(&self) -> &[ConstructionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that the table covers exactly the atoms of `geometry`.
    pub fn validate_for(&self, geometry: &Geometry) -> Result<(), ZmatError> {
        if self.entries.len() != geometry.len() {
            return Err(ZmatError::Coverage {
                table: self.entries.len(),
                geometry: geometry.len(),
            });
        }
        match self.entries.iter().find(|e| !geometry.contains(e.atom)) {
            Some(entry) => Err(ZmatError::MissingAtom(entry.atom)),
            None => Ok(()),
        }
    }

    /// Reads a table from CSV with the columns `atom,bond,angle,dihedral`.
    pub fn read_csv(reader: impl Read) -> Result<Self, ZmatError> {
        Self::read_csv_named(reader, "<reader>")
    }

    pub fn load_csv(path: &Path) -> Result<Self, ZmatError> {
        let name = path.to_string_lossy().to_string();
        let file = std::fs::File::open(path).map_err(|e| ZmatError::Csv {
            path: name.clone(),
            source: e.into(),
        })?;
        Self::read_csv_named(file, &name)
    }

    pub fn write_csv(&self, writer: impl Write) -> Result<(), ZmatError> {
        self.write_csv_named(writer, "<writer>")
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), ZmatError> {
        let name = path.to_string_lossy().to_string();
        let file = std::fs::File::create(path).map_err(|e| ZmatError::Csv {
            path: name.clone(),
            source: e.into(),
        })?;
        self.write_csv_named(file, &name)
    }

    fn read_csv_named(reader: impl Read, name: &str) -> Result<Self, ZmatError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let entries = reader
            .deserialize::<ConstructionEntry>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ZmatError::Csv {
                path: name.to_string(),
                source: e,
            })?;
        Self::new(entries)
    }

    fn write_csv_named(&self, writer: impl Write, name: &str) -> Result<(), ZmatError> {
        let csv_err = |e: csv::Error| ZmatError::Csv {
            path: name.to_string(),
            source: e,
        };
        let mut writer = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            writer.serialize(entry).map_err(csv_err)?;
        }
        writer.flush().map_err(|e| csv_err(e.into()))?;
        Ok(())
    }
}

fn pick_reference(
    placed: &[usize],
    positions: &HashMap<usize, Point3<f64>>,
    exclude: &[usize],
    near: usize,
    acceptable: impl Fn(usize) -> bool,
) -> usize {
    let mut candidates: Vec<usize> = placed
        .iter()
        .copied()
        .filter(|c| !exclude.contains(c))
        .collect();
    candidates.sort_by(|a, b| {
        let da = bond_length(&positions[a], &positions[&near]);
        let db = bond_length(&positions[b], &positions[&near]);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
        .iter()
        .copied()
        .find(|&c| acceptable(c))
        .unwrap_or(candidates[0])
}

/// A Z-matrix row: the internal coordinates of one atom.
///
/// Bond lengths are in Angstroms, angles and dihedrals in degrees. Values whose
/// reference is absent in the construction table are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ZmatEntry {
    pub atom: usize,
    pub element: String,
    pub bond: f64,
    pub angle: f64,
    pub dihedral: f64,
}

/// A molecule in internal coordinates, tied to the table used to build it.
#[derive(Debug, Clone, PartialEq)]
pub struct ZMatrix {
    table: ConstantTable,
    entries: Vec<ZmatEntry>,
}

/// The difference of two Z-matrices sharing a construction table.
#[derive(Debug, Clone, PartialEq)]
pub struct ZmatDelta {
    table: ConstantTable,
    entries: Vec<InternalDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InternalDelta {
    pub atom: usize,
    pub bond: f64,
    pub angle: f64,
    pub dihedral: f64,
}

impl ZMatrix {
    /// Converts a Cartesian geometry into internal coordinates under `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not cover exactly the geometry's atoms.
    pub fn from_geometry(geometry: &Geometry, table: &ConstantTable) -> Result<Self, ZmatError> {
        table.validate_for(geometry)?;
        let position = |index: usize| -> Result<Point3<f64>, ZmatError> {
            geometry
                .get(index)
                .map(|a| a.position)
                .ok_or(ZmatError::MissingAtom(index))
        };

        let mut entries = Vec::with_capacity(table.len());
        for entry in table.entries() {
            let here = position(entry.atom)?;
            let mut row = ZmatEntry {
                atom: entry.atom,
                element: geometry
                    .get(entry.atom)
                    .map(|a| a.element.clone())
                    .unwrap_or_default(),
                bond: 0.0,
                angle: 0.0,
                dihedral: 0.0,
            };
            if let Some(b) = entry.bond {
                let b = position(b)?;
                row.bond = bond_length(&here, &b);
                if let Some(a) = entry.angle {
                    let a = position(a)?;
                    row.angle = bond_angle(&here, &b, &a);
                    if let Some(d) = entry.dihedral {
                        row.dihedral = dihedral_angle(&here, &b, &a, &position(d)?);
                    }
                }
            }
            entries.push(row);
        }

        Ok(Self {
            table: table.clone(),
            entries,
        })
    }

    pub fn table(&self) -> &ConstantTable {
        &self.table
    }

    pub fn entries(&self) -> &[ZmatEntry] {
        &self.entries
    }

    /// Rebuilds Cartesian coordinates.
    ///
    /// The first atom sits at the origin, the second on the +z axis and the third in
    /// the xz-plane; every other atom is placed from its three references.
    pub fn to_geometry(&self) -> Result<Geometry, ZmatError> {
        let mut placed: HashMap<usize, Point3<f64>> = HashMap::with_capacity(self.entries.len());
        let mut atoms = Vec::with_capacity(self.entries.len());

        for (row, (entry, construction)) in self.entries.iter().zip(self.table.entries()).enumerate() {
            let at = |index: Option<usize>| -> Result<Point3<f64>, ZmatError> {
                let index = index.ok_or_else(|| ZmatError::InvalidEntry {
                    row,
                    atom: entry.atom,
                    reason: "missing reference".to_string(),
                })?;
                placed.get(&index).copied().ok_or(ZmatError::MissingAtom(index))
            };

            let position = match row {
                0 => Point3::origin(),
                1 => at(construction.bond)? + Vector3::z() * entry.bond,
                2 => {
                    let b = at(construction.bond)?;
                    let a = at(construction.angle)?;
                    let pseudo = a + Vector3::x();
                    place_atom(&pseudo, &a, &b, entry.bond, entry.angle, 0.0)
                }
                _ => place_atom(
                    &at(construction.dihedral)?,
                    &at(construction.angle)?,
                    &at(construction.bond)?,
                    entry.bond,
                    entry.angle,
                    entry.dihedral,
                ),
            };
            placed.insert(entry.atom, position);
            atoms.push(Atom::new(entry.atom, &entry.element, position));
        }

        Ok(Geometry::from_atoms(atoms)?)
    }

    /// Computes `self - other` row by row.
    ///
    /// # Errors
    ///
    /// Returns [`ZmatError::TableMismatch`] when the construction tables differ.
    pub fn try_sub(&self, other: &ZMatrix) -> Result<ZmatDelta, ZmatError> {
        if self.table != other.table {
            return Err(ZmatError::TableMismatch);
        }
        let entries = self
            .entries
            .iter()
            .zip(&other.entries)
            .map(|(a, b)| InternalDelta {
                atom: a.atom,
                bond: a.bond - b.bond,
                angle: a.angle - b.angle,
                dihedral: a.dihedral - b.dihedral,
            })
            .collect();
        Ok(ZmatDelta {
            table: self.table.clone(),
            entries,
        })
    }

    /// Applies an internal-coordinate delta, returning the displaced Z-matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ZmatError::TableMismatch`] when the construction tables differ.
    pub fn displaced(&self, delta: &ZmatDelta) -> Result<ZMatrix, ZmatError> {
        if self.table != delta.table {
            return Err(ZmatError::TableMismatch);
        }
        let entries = self
            .entries
            .iter()
            .zip(&delta.entries)
            .map(|(row, d)| ZmatEntry {
                bond: row.bond + d.bond,
                angle: row.angle + d.angle,
                dihedral: row.dihedral + d.dihedral,
                ..row.clone()
            })
            .collect();
        Ok(ZMatrix {
            table: self.table.clone(),
            entries,
        })
    }
}

impl ZmatDelta {
    pub fn table(&self) -> &ConstantTable {
        &self.table
    }

    pub fn entries(&self) -> &[InternalDelta] {
        &self.entries
    }

    /// Replaces every dihedral difference by its smallest-magnitude equivalent mod 360°.
    pub fn minimize_dihedrals(&self) -> ZmatDelta {
        let entries = self
            .entries
            .iter()
            .zip(self.table.entries())
            .map(|(delta, construction)| InternalDelta {
                dihedral: if construction.dihedral.is_some() {
                    wrap_degrees(delta.dihedral)
                } else {
                    delta.dihedral
                },
                ..*delta
            })
            .collect();
        ZmatDelta {
            table: self.table.clone(),
            entries,
        }
    }

    pub fn scaled(&self, factor: f64) -> ZmatDelta {
        let entries = self
            .entries
            .iter()
            .map(|d| InternalDelta {
                atom: d.atom,
                bond: d.bond * factor,
                angle: d.angle * factor,
                dihedral: d.dihedral * factor,
            })
            .collect();
        ZmatDelta {
            table: self.table.clone(),
            entries,
        }
    }
}

fn write_reference(f: &mut fmt::Formatter<'_>, reference: Option<usize>, value: f64) -> fmt::Result {
    match reference {
        Some(r) => write!(f, " {:>6} {:>12.6}", r, value),
        None => write!(f, " {:>6} {:>12}", "-", "-"),
    }
}

impl fmt::Display for ZMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:<4} {:>6} {:>12} {:>6} {:>12} {:>6} {:>12}",
            "atom", "elem", "b", "bond", "a", "angle", "d", "dihedral"
        )?;
        for (row, c) in self.entries.iter().zip(self.table.entries()) {
            write!(f, "{:>6} {:<4}", row.atom, row.element)?;
            write_reference(f, c.bond, row.bond)?;
            write_reference(f, c.angle, row.angle)?;
            write_reference(f, c.dihedral, row.dihedral)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ZmatDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>6} {:>12} {:>6} {:>12} {:>6} {:>12}",
            "atom", "b", "d_bond", "a", "d_angle", "d", "d_dihedral"
        )?;
        for (row, c) in self.entries.iter().zip(self.table.entries()) {
            write!(f, "{:>6}", row.atom)?;
            write_reference(f, c.bond, row.bond)?;
            write_reference(f, c.angle, row.angle)?;
            write_reference(f, c.dihedral, row.dihedral)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(atom: usize, refs: &[usize]) -> ConstructionEntry {
        ConstructionEntry {
            atom,
            bond: refs.first().copied(),
            angle: refs.get(1).copied(),
            dihedral: refs.get(2).copied(),
        }
    }

    fn chain_table() -> ConstantTable {
        ConstantTable::new(vec![
            entry(0, &[]),
            entry(1, &[0]),
            entry(2, &[1, 0]),
            entry(3, &[2, 1, 0]),
        ])
        .unwrap()
    }

    /// Four atoms with the dihedral 0-1-2-3 at `dihedral` degrees.
    fn chain(dihedral: f64) -> Geometry {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.5);
        let d = place_atom(&a, &b, &c, 1.2, 100.0, dihedral);
        Geometry::from_atoms([
            Atom::new(0, "H", a),
            Atom::new(1, "C", b),
            Atom::new(2, "C", c),
            Atom::new(3, "H", d),
        ])
        .unwrap()
    }

    #[test]
    fn new_rejects_wrong_reference_counts() {
        let result = ConstantTable::new(vec![entry(0, &[]), entry(1, &[])]);
        assert!(matches!(result, Err(ZmatError::InvalidEntry { row: 1, .. })));
    }

    #[test]
    fn new_rejects_forward_references_and_duplicates() {
        let forward = ConstantTable::new(vec![entry(0, &[]), entry(1, &[2])]);
        assert!(matches!(forward, Err(ZmatError::InvalidEntry { row: 1, .. })));

        let duplicate = ConstantTable::new(vec![entry(0, &[]), entry(0, &[0])]);
        assert!(matches!(duplicate, Err(ZmatError::InvalidEntry { .. })));

        let repeated = ConstantTable::new(vec![
            entry(0, &[]),
            entry(1, &[0]),
            entry(2, &[1, 0]),
            entry(3, &[2, 1, 0]),
            entry(1, &[3, 2, 0]),
        ]);
        assert!(matches!(repeated, Err(ZmatError::DuplicateAtom(1))));
    }

    #[test]
    fn from_geometry_produces_a_valid_table_covering_all_atoms() {
        let geometry = chain(60.0);
        let table = ConstantTable::from_geometry(&geometry).unwrap();
        assert_eq!(table.len(), 4);
        table.validate_for(&geometry).unwrap();
        assert!(table.entries()[3].dihedral.is_some());
    }

    #[test]
    fn zmatrix_reports_expected_internal_coordinates() {
        let zmat = ZMatrix::from_geometry(&chain(75.0), &chain_table()).unwrap();
        let last = &zmat.entries()[3];
        assert!((last.bond - 1.2).abs() < 1e-9);
        assert!((last.angle - 100.0).abs() < 1e-9);
        assert!((last.dihedral - 75.0).abs() < 1e-9);
        assert!((zmat.entries()[2].angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn to_geometry_round_trips_internal_coordinates() {
        let table = chain_table();
        let zmat = ZMatrix::from_geometry(&chain(-130.0), &table).unwrap();
        let rebuilt = ZMatrix::from_geometry(&zmat.to_geometry().unwrap(), &table).unwrap();
        for (a, b) in zmat.entries().iter().zip(rebuilt.entries()) {
            assert!((a.bond - b.bond).abs() < 1e-9);
            assert!((a.angle - b.angle).abs() < 1e-9);
            assert!((a.dihedral - b.dihedral).abs() < 1e-9);
        }
    }

    #[test]
    fn minimize_dihedrals_unwraps_branch_cut_differences() {
        let table = chain_table();
        let reference = ZMatrix::from_geometry(&chain(-179.0), &table).unwrap();
        let moved = ZMatrix::from_geometry(&chain(179.0), &table).unwrap();

        let raw = moved.try_sub(&reference).unwrap();
        assert!((raw.entries()[3].dihedral - 358.0).abs() < 1e-9);

        let minimized = raw.minimize_dihedrals();
        assert!((minimized.entries()[3].dihedral + 2.0).abs() < 1e-9);
        assert_eq!(minimized.entries()[3].bond, raw.entries()[3].bond);
    }

    #[test]
    fn try_sub_rejects_different_tables() {
        let geometry = chain(30.0);
        let a = ZMatrix::from_geometry(&geometry, &chain_table()).unwrap();
        let other_table = ConstantTable::new(vec![
            entry(1, &[]),
            entry(0, &[1]),
            entry(2, &[1, 0]),
            entry(3, &[2, 1, 0]),
        ])
        .unwrap();
        let b = ZMatrix::from_geometry(&geometry, &other_table).unwrap();
        assert!(matches!(a.try_sub(&b), Err(ZmatError::TableMismatch)));
    }

    #[test]
    fn validate_for_detects_missing_atoms() {
        let geometry = Geometry::from_atoms([
            Atom::new(0, "H", Point3::origin()),
            Atom::new(7, "H", Point3::new(0.7, 0.0, 0.0)),
        ])
        .unwrap();
        let table = ConstantTable::new(vec![entry(0, &[]), entry(1, &[0])]).unwrap();
        assert!(matches!(
            table.validate_for(&geometry),
            Err(ZmatError::MissingAtom(1))
        ));
    }

    #[test]
    fn csv_round_trip_preserves_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        chain_table().save_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("atom,bond,angle,dihedral"));
        assert_eq!(ConstantTable::load_csv(&path).unwrap(), chain_table());
    }

    #[test]
    fn read_csv_accepts_blank_reference_cells() {
        let text = "atom,bond,angle,dihedral\n0,,,\n1,0,,\n2,1,0,\n";
        let table = ConstantTable::read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.entries()[2], entry(2, &[1, 0]));
    }
}
