use crate::color::{self, Rgb};
use crate::histogram::ColorEntry;
use crate::kmeans::nearest_index;

/// Closest palette entry to `color` by Euclidean distance; the first one wins ties.
///
/// Returns `None` only for an empty palette.
pub fn nearest(color: Rgb, palette: &[Rgb]) -> Option<Rgb> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[nearest_index(color, palette)])
}

/// Old → new color pairs in the order the old colors were observed.
///
/// Pairs whose old and new colors are equal are kept so callers can tell
/// "nothing to replace" apart from "not covered".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorMapping {
    pairs: Vec<(Rgb, Rgb)>,
}

impl ColorMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair; a later insert for the same old color replaces the earlier one.
    pub fn insert(&mut self, old: Rgb, new: Rgb) {
        match self.pairs.iter_mut().find(|(o, _)| *o == old) {
            Some(pair) => pair.1 = new,
            None => self.pairs.push((old, new)),
        }
    }

    pub fn get(&self, old: Rgb) -> Option<Rgb> {
        self.pairs.iter().find(|(o, _)| *o == old).map(|(_, n)| *n)
    }

    /// Look up by hex key in any case, with or without `#`.
    pub fn get_hex(&self, old: &str) -> Option<Rgb> {
        color::from_hex(old).ok().and_then(|c| self.get(c))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rgb, Rgb)> + '_ {
        self.pairs.iter().copied()
    }

    /// Pairs that actually change a color.
    pub fn changes(&self) -> impl Iterator<Item = (Rgb, Rgb)> + '_ {
        self.iter().filter(|(old, new)| old != new)
    }
}

impl FromIterator<(Rgb, Rgb)> for ColorMapping {
    fn from_iter<I: IntoIterator<Item = (Rgb, Rgb)>>(iter: I) -> Self {
        let mut mapping = ColorMapping::new();
        for (old, new) in iter {
            mapping.insert(old, new);
        }
        mapping
    }
}

/// Map every observed color to its nearest palette entry.
///
/// An empty palette yields an empty mapping.
pub fn build_mapping(colors: &[ColorEntry], palette: &[Rgb]) -> ColorMapping {
    let mapping: ColorMapping = colors
        .iter()
        .filter_map(|entry| nearest(entry.color, palette).map(|new| (entry.color, new)))
        .collect();
    tracing::debug!(
        colors = mapping.len(),
        changed = mapping.changes().count(),
        "built color mapping"
    );
    mapping
}
