use phf::{Map, phf_map};

/// Standard atomic weights in atomic mass units, keyed by canonical element symbol.
#[rustfmt::skip]
static ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    // --- Period 1 ---
    "H" => 1.008, "D" => 2.014, "He" => 4.0026,
    // --- Period 2 ---
    "Li" => 6.94, "Be" => 9.0122, "B" => 10.81, "C" => 12.011,
    "N" => 14.007, "O" => 15.999, "F" => 18.998, "Ne" => 20.180,
    // --- Period 3 ---
    "Na" => 22.990, "Mg" => 24.305, "Al" => 26.982, "Si" => 28.085,
    "P" => 30.974, "S" => 32.06, "Cl" => 35.45, "Ar" => 39.948,
    // --- Period 4 ---
    "K" => 39.098, "Ca" => 40.078, "Sc" => 44.956, "Ti" => 47.867,
    "V" => 50.942, "Cr" => 51.996, "Mn" => 54.938, "Fe" => 55.845,
    "Co" => 58.933, "Ni" => 58.693, "Cu" => 63.546, "Zn" => 65.38,
    "Ga" => 69.723, "Ge" => 72.630, "As" => 74.922, "Se" => 78.971,
    "Br" => 79.904, "Kr" => 83.798,
    // --- Heavier elements common in quantum chemistry inputs ---
    "Rb" => 85.468, "Sr" => 87.62, "Ag" => 107.87, "Sn" => 118.71,
    "I" => 126.90, "Xe" => 131.29, "Pt" => 195.08, "Au" => 196.97,
    "Hg" => 200.59, "Pb" => 207.2,
};

/// Normalizes an element label to its canonical symbol form.
///
/// Only the leading alphabetic characters are kept, the first one upper-cased and
/// the rest lower-cased, so `"CL"`, `"cl"` and `"Cl1"` all map to `"Cl"`.
pub fn canonical_symbol(label: &str) -> String {
    let mut symbol = String::with_capacity(2);
    for (i, c) in label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .enumerate()
    {
        if i == 0 {
            symbol.push(c.to_ascii_uppercase());
        } else {
            symbol.push(c.to_ascii_lowercase());
        }
    }
    symbol
}

pub fn atomic_mass(label: &str) -> Option<f64> {
    ATOMIC_MASSES.get(canonical_symbol(label).as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_symbol_normalizes_case_and_suffixes() {
        assert_eq!(canonical_symbol("CL"), "Cl");
        assert_eq!(canonical_symbol("cl"), "Cl");
        assert_eq!(canonical_symbol(" Cl1 "), "Cl");
        assert_eq!(canonical_symbol("h"), "H");
        assert_eq!(canonical_symbol("12"), "");
    }

    #[test]
    fn atomic_mass_finds_known_elements() {
        assert_eq!(atomic_mass("H"), Some(1.008));
        assert_eq!(atomic_mass("o"), Some(15.999));
        assert_eq!(atomic_mass("Fe"), Some(55.845));
    }

    #[test]
    fn atomic_mass_returns_none_for_unknown_labels() {
        assert_eq!(atomic_mass("Xx"), None);
        assert_eq!(atomic_mass(""), None);
    }
}
