use super::error::EngineError;
use super::symbols::AmplitudeSymbol;
use crate::core::models::geometry::Geometry;
use crate::core::models::zmat::{ZMatrix, ZmatDelta};
use std::fmt;

/// A Cartesian displacement linear in one amplitude: `offsets * factor * amplitude`.
///
/// `offsets` keeps the indices and element labels of the reference geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    symbol: AmplitudeSymbol,
    offsets: Geometry,
    factor: f64,
}

impl DisplacementField {
    pub fn new(symbol: AmplitudeSymbol, offsets: Geometry) -> Self {
        Self {
            symbol,
            offsets,
            factor: 1.0,
        }
    }

    pub fn symbol(&self) -> AmplitudeSymbol {
        self.symbol
    }

    pub fn offsets(&self) -> &Geometry {
        &self.offsets
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// The displacement for a concrete amplitude.
    ///
    /// Amplitude 0 yields exact zeros; amplitude 1 yields `offsets * factor`.
    pub fn evaluate(&self, amplitude: f64) -> Geometry {
        self.offsets.scaled(self.factor * amplitude)
    }

    /// Returns a field whose displacement is multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            factor: self.factor * factor,
            ..self.clone()
        }
    }

    /// Evaluates after checking that `symbol` is the field's own amplitude.
    pub fn subs(&self, symbol: AmplitudeSymbol, value: f64) -> Result<Geometry, EngineError> {
        if symbol != self.symbol {
            return Err(EngineError::UnknownSymbol {
                expected: self.symbol,
                found: symbol,
            });
        }
        Ok(self.evaluate(value))
    }

    /// `reference + evaluate(amplitude)`, matched by atom index.
    pub fn displace(&self, reference: &Geometry, amplitude: f64) -> Result<Geometry, EngineError> {
        Ok(reference.try_add(&self.evaluate(amplitude))?)
    }
}

impl fmt::Display for DisplacementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} * {} Cartesian offsets (factor {})",
            self.symbol,
            self.offsets.len(),
            self.factor
        )
    }
}

/// The internal-coordinate analogue of [`DisplacementField`].
#[derive(Debug, Clone, PartialEq)]
pub struct InternalDisplacement {
    symbol: AmplitudeSymbol,
    delta: ZmatDelta,
    factor: f64,
}

impl InternalDisplacement {
    pub fn new(symbol: AmplitudeSymbol, delta: ZmatDelta) -> Self {
        Self {
            symbol,
            delta,
            factor: 1.0,
        }
    }

    pub fn symbol(&self) -> AmplitudeSymbol {
        self.symbol
    }

    pub fn delta(&self) -> &ZmatDelta {
        &self.delta
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn evaluate(&self, amplitude: f64) -> ZmatDelta {
        self.delta.scaled(self.factor * amplitude)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            factor: self.factor * factor,
            ..self.clone()
        }
    }

    pub fn subs(&self, symbol: AmplitudeSymbol, value: f64) -> Result<ZmatDelta, EngineError> {
        if symbol != self.symbol {
            return Err(EngineError::UnknownSymbol {
                expected: self.symbol,
                found: symbol,
            });
        }
        Ok(self.evaluate(value))
    }

    /// Applies the delta at `amplitude` to `reference` and rebuilds Cartesian coordinates.
    pub fn displace(&self, reference: &ZMatrix, amplitude: f64) -> Result<Geometry, EngineError> {
        let displaced = reference.displaced(&self.evaluate(amplitude))?;
        Ok(displaced.to_geometry()?)
    }
}

impl fmt::Display for InternalDisplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} * (factor {})", self.symbol, self.factor)?;
        write!(f, "{}", self.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn offsets() -> Geometry {
        Geometry::from_atoms([
            Atom::new(0, "O", Point3::new(0.0, 0.0, -0.07)),
            Atom::new(1, "H", Point3::new(0.0, 0.43, 0.56)),
        ])
        .unwrap()
    }

    #[test]
    fn evaluate_at_zero_is_exactly_zero_and_at_one_is_the_offsets() {
        let field = DisplacementField::new(AmplitudeSymbol::cartesian(6), offsets());
        assert!(
            field
                .evaluate(0.0)
                .positions()
                .iter()
                .all(|p| p.coords.iter().all(|&c| c == 0.0))
        );
        assert_eq!(field.evaluate(1.0), offsets());
    }

    #[test]
    fn scale_multiplies_the_displacement() {
        let field = DisplacementField::new(AmplitudeSymbol::cartesian(6), offsets()).scale(2.0);
        assert_eq!(field.factor(), 2.0);
        assert_eq!(field.evaluate(0.5), offsets());
    }

    #[test]
    fn subs_rejects_foreign_symbols() {
        let field = DisplacementField::new(AmplitudeSymbol::cartesian(6), offsets());
        assert!(field.subs(AmplitudeSymbol::cartesian(6), 1.0).is_ok());
        assert!(matches!(
            field.subs(AmplitudeSymbol::cartesian(7), 1.0),
            Err(EngineError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            field.subs(AmplitudeSymbol::internal(6), 1.0),
            Err(EngineError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn displace_adds_offsets_by_index() {
        let field = DisplacementField::new(AmplitudeSymbol::cartesian(0), offsets());
        let reference = Geometry::from_atoms([
            Atom::new(1, "H", Point3::new(1.0, 1.0, 1.0)),
            Atom::new(0, "O", Point3::origin()),
        ])
        .unwrap();
        let displaced = field.displace(&reference, 1.0).unwrap();
        let moved = displaced.get(1).unwrap().position;
        assert!((moved - Point3::new(1.0, 1.43, 1.56)).norm() < 1e-12);
        assert_eq!(displaced.atoms()[0].index, 1);
    }
}
