use super::cartesian::{CartesianVibration, ModeInfo};
use super::displacement::{DisplacementField, InternalDisplacement};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::symbols::AmplitudeSymbol;
use crate::core::models::geometry::Geometry;
use crate::core::models::zmat::{ConstantTable, ZMatrix};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Vibrational modes re-expressed in internal coordinates.
///
/// Every displacement shares the construction table of `reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZmatVibration {
    reference: ZMatrix,
    modes: Vec<ModeInfo>,
    displacements: BTreeMap<usize, InternalDisplacement>,
}

impl ZmatVibration {
    /// Projects each Cartesian mode into internal coordinates.
    ///
    /// For every mode the reference is displaced at unit amplitude, both geometries are
    /// converted under the same construction table and their difference, with dihedral
    /// jumps folded into (-180°, 180°], becomes the internal displacement. Without a
    /// `table` one is derived from the reference geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not fit the reference geometry.
    #[instrument(skip_all, name = "internal_projection")]
    pub fn from_cart_vib(
        cart_vib: &CartesianVibration,
        table: Option<&ConstantTable>,
        reporter: &ProgressReporter,
    ) -> Result<Self, EngineError> {
        let reference = cart_vib.reference();
        let table = match table {
            Some(table) => table.clone(),
            None => ConstantTable::from_geometry(reference)?,
        };
        let z_ref = ZMatrix::from_geometry(reference, &table)?;

        let work: Vec<(&usize, &DisplacementField)> = cart_vib.displacements().iter().collect();
        reporter.report(Progress::TaskStart {
            total_steps: work.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = work.iter();

        #[cfg(feature = "parallel")]
        let iterator = work.par_iter();

        let projected = iterator
            .map(|&(&mode, field)| {
                let result = project_mode(mode, field, reference, &z_ref);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect::<Result<Vec<_>, EngineError>>();
        reporter.report(Progress::TaskFinish);

        let displacements: BTreeMap<usize, InternalDisplacement> = projected?.into_iter().collect();
        info!(
            modes = displacements.len(),
            atoms = table.len(),
            "Projected vibrational modes into internal coordinates."
        );

        Ok(Self {
            reference: z_ref,
            modes: cart_vib.modes().to_vec(),
            displacements,
        })
    }

    pub fn reference(&self) -> &ZMatrix {
        &self.reference
    }

    pub fn table(&self) -> &ConstantTable {
        self.reference.table()
    }

    pub fn modes(&self) -> &[ModeInfo] {
        &self.modes
    }

    pub fn displacement(&self, index: usize) -> Option<&InternalDisplacement> {
        self.displacements.get(&index)
    }

    pub fn displacements(&self) -> &BTreeMap<usize, InternalDisplacement> {
        &self.displacements
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Cartesian geometry of the reference moved along `mode` by `amplitude` in
    /// internal coordinates.
    pub fn displaced(&self, mode: usize, amplitude: f64) -> Result<Geometry, EngineError> {
        self.displacements
            .get(&mode)
            .ok_or(EngineError::UnknownMode(mode))?
            .displace(&self.reference, amplitude)
    }
}

impl fmt::Display for ZmatVibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vibrational modes in Z-matrix coordinates.", self.modes.len())
    }
}

fn project_mode(
    mode: usize,
    field: &DisplacementField,
    reference: &Geometry,
    z_ref: &ZMatrix,
) -> Result<(usize, InternalDisplacement), EngineError> {
    let distorted = reference.try_add(&field.subs(field.symbol(), 1.0)?)?;
    let z_distorted = ZMatrix::from_geometry(&distorted, z_ref.table())?;
    let delta = z_distorted.try_sub(z_ref)?.minimize_dihedrals();
    Ok((
        mode,
        InternalDisplacement::new(AmplitudeSymbol::internal(mode), delta),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compare::{IsCloseOptions, isclose};
    use crate::core::models::atom::Atom;
    use crate::core::models::zmat::ConstructionEntry;
    use crate::core::utils::geometry::place_atom;
    use crate::engine::cartesian::tests::WATER_MOLDEN;
    use crate::engine::config::VibrationConfig;
    use nalgebra::Point3;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn water() -> CartesianVibration {
        CartesianVibration::read_from(&mut Cursor::new(WATER_MOLDEN), &VibrationConfig::default())
            .unwrap()
    }

    fn chain(dihedral: f64) -> Geometry {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.5);
        let d = place_atom(&a, &b, &c, 1.1, 109.5, dihedral);
        Geometry::from_atoms([
            Atom::new(0, "H", a),
            Atom::new(1, "C", b),
            Atom::new(2, "C", c),
            Atom::new(3, "H", d),
        ])
        .unwrap()
    }

    fn chain_table() -> ConstantTable {
        let row = |atom, bond, angle, dihedral| ConstructionEntry {
            atom,
            bond,
            angle,
            dihedral,
        };
        ConstantTable::new(vec![
            row(0, None, None, None),
            row(1, Some(0), None, None),
            row(2, Some(1), Some(0), None),
            row(3, Some(2), Some(1), Some(0)),
        ])
        .unwrap()
    }

    #[test]
    fn projection_keeps_mode_indices_and_uses_internal_symbols() {
        let cart = water();
        let zvib = ZmatVibration::from_cart_vib(&cart, None, &ProgressReporter::new()).unwrap();
        assert_eq!(
            zvib.displacements().keys().copied().collect::<Vec<_>>(),
            vec![6, 7, 8]
        );
        assert_eq!(zvib.displacement(8).unwrap().symbol().to_string(), "s8");
        assert_eq!(zvib.modes(), cart.modes());
        assert_eq!(
            zvib.to_string(),
            "3 vibrational modes in Z-matrix coordinates."
        );
    }

    #[test]
    fn internal_displacement_reproduces_cartesian_shape_at_unit_amplitude() {
        let cart = water();
        let zvib = ZmatVibration::from_cart_vib(&cart, None, &ProgressReporter::new()).unwrap();
        for &mode in cart.displacements().keys() {
            let from_cartesian = cart.displaced(mode, 1.0).unwrap();
            let from_internal = zvib.displaced(mode, 1.0).unwrap();
            assert!(
                isclose(&from_cartesian, &from_internal, &IsCloseOptions::default()),
                "mode {mode} differs"
            );
        }
    }

    #[test]
    fn dihedral_jump_across_branch_cut_is_minimized() {
        let reference = chain(-179.0);
        let offsets = chain(179.0).try_sub(&reference).unwrap();
        let symbol = AmplitudeSymbol::cartesian(0);
        let cart = CartesianVibration::new(
            reference,
            vec![ModeInfo {
                index: 0,
                frequency: 120.0,
                intensity: None,
            }],
            BTreeMap::from([(0, DisplacementField::new(symbol, offsets))]),
        );

        let zvib =
            ZmatVibration::from_cart_vib(&cart, Some(&chain_table()), &ProgressReporter::new())
                .unwrap();
        let delta = zvib.displacement(0).unwrap().delta().entries()[3];
        assert!((delta.dihedral + 2.0).abs() < 1e-6, "got {}", delta.dihedral);
        assert!(delta.bond.abs() < 1e-9);
        assert!(delta.angle.abs() < 1e-6);
    }

    #[test]
    fn foreign_table_is_rejected() {
        let cart = water();
        let result =
            ZmatVibration::from_cart_vib(&cart, Some(&chain_table()), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Zmat(_))));
    }

    #[test]
    fn progress_counts_every_mode() {
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        ZmatVibration::from_cart_vib(&water(), None, &reporter).unwrap();
        assert_eq!(increments.load(Ordering::SeqCst), 3);
    }
}
