use super::geometry::Geometry;
use std::collections::BTreeMap;

pub const ENERGY: &str = "energy";
pub const MAX_FORCE: &str = "max-force";
pub const RMS_FORCE: &str = "rms-force";

/// Per-step scalar annotations of an optimization trajectory, keyed by block name.
///
/// Each block holds one value per geometry, aligned by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoConv {
    blocks: BTreeMap<String, Vec<f64>>,
}

impl GeoConv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, values: Vec<f64>) {
        self.blocks.insert(name.to_string(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.blocks.get(name).map(Vec::as_slice)
    }

    pub fn energy(&self) -> Option<&[f64]> {
        self.get(ENERGY)
    }

    pub fn max_force(&self) -> Option<&[f64]> {
        self.get(MAX_FORCE)
    }

    pub fn rms_force(&self) -> Option<&[f64]> {
        self.get(RMS_FORCE)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

/// An ordered sequence of geometries with optional per-step annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub geometries: Vec<Geometry>,
    pub geoconv: GeoConv,
}

impl Trajectory {
    pub fn new(geometries: Vec<Geometry>) -> Self {
        Self {
            geometries,
            geoconv: GeoConv::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

impl From<Vec<Geometry>> for Trajectory {
    fn from(geometries: Vec<Geometry>) -> Self {
        Self::new(geometries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geoconv_exposes_named_blocks() {
        let mut geoconv = GeoConv::new();
        geoconv.insert(ENERGY, vec![-1.0, -1.5]);
        geoconv.insert("max-step", vec![0.1, 0.05]);

        assert_eq!(geoconv.energy(), Some(&[-1.0, -1.5][..]));
        assert_eq!(geoconv.max_force(), None);
        assert_eq!(geoconv.names().collect::<Vec<_>>(), vec!["energy", "max-step"]);
    }

    #[test]
    fn trajectory_from_geometries_has_no_annotations() {
        let trajectory = Trajectory::from(vec![Geometry::new(), Geometry::new()]);
        assert_eq!(trajectory.len(), 2);
        assert!(trajectory.geoconv.is_empty());
    }
}
