//! Count-weighted k-means over a set of observed colors.
//!
//! Centroids are seeded from the most frequent colors and refined for a fixed
//! number of rounds. There is no convergence test: the round count is part of
//! the observable behavior.

use crate::color::{self, Rgb};
use crate::config::DEFAULT_ITERATIONS;
use crate::error::{Error, Result};
use crate::histogram::ColorEntry;

/// Reduce `colors` to exactly `k` representative colors using the default round count.
pub fn reduce_palette(colors: &[ColorEntry], k: usize) -> Result<Vec<Rgb>> {
    reduce_palette_with(colors, k, DEFAULT_ITERATIONS)
}

/// Reduce `colors` to exactly `k` colors with `iterations` assignment/update rounds.
///
/// When `k` exceeds the number of distinct colors the palette is padded with
/// copies of the first centroid.
pub fn reduce_palette_with(colors: &[ColorEntry], k: usize, iterations: usize) -> Result<Vec<Rgb>> {
    if colors.is_empty() {
        return Err(Error::InvalidInput(
            "cannot cluster an empty color set".into(),
        ));
    }
    if k < 1 {
        return Err(Error::InvalidInput(format!(
            "palette size must be at least 1, got {k}"
        )));
    }

    tracing::debug!(k, colors = colors.len(), iterations, "running k-means");

    let mut seeds: Vec<&ColorEntry> = colors.iter().collect();
    // Stable: equal counts keep their input order.
    seeds.sort_by(|a, b| b.count.cmp(&a.count));

    let mut centroids: Vec<Rgb> = seeds.iter().take(k).map(|e| e.color).collect();
    let first = centroids[0];
    centroids.resize(k, first);

    let mut members = vec![0usize; colors.len()];
    for round in 0..iterations {
        for (slot, entry) in members.iter_mut().zip(colors) {
            *slot = nearest_index(entry.color, &centroids);
        }

        let mut weights = vec![0u64; k];
        let mut sums = vec![[0u64; 3]; k];
        for (entry, &m) in colors.iter().zip(&members) {
            weights[m] += entry.count;
            sums[m][0] += entry.color.red as u64 * entry.count;
            sums[m][1] += entry.color.green as u64 * entry.count;
            sums[m][2] += entry.color.blue as u64 * entry.count;
        }

        for (i, centroid) in centroids.iter_mut().enumerate() {
            if weights[i] == 0 {
                tracing::trace!(cluster = i, round, "cluster kept its centroid");
                continue;
            }
            let w = weights[i] as f64;
            let [r, g, b] = sums[i];
            *centroid = color::from_f64(r as f64 / w, g as f64 / w, b as f64 / w);
        }
    }

    tracing::debug!(k, "k-means finished");
    Ok(centroids)
}

/// Index of the palette entry closest to `color`; the lowest index wins ties.
pub(crate) fn nearest_index(color: Rgb, palette: &[Rgb]) -> usize {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (idx, c) in palette.iter().enumerate() {
        let d = color::squared_distance(color, *c);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

/// A cluster of similar observed colors around a centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorGroup {
    pub centroid: Rgb,
    pub colors: Vec<ColorEntry>,
}

impl ColorGroup {
    pub fn total_count(&self) -> u64 {
        self.colors.iter().map(|c| c.count).sum()
    }
}

/// Number of similarity groups worth showing for `n` colors: one per five, at most eight.
pub fn suggested_group_count(n: usize) -> usize {
    n.div_ceil(5).min(8)
}

/// Partition `colors` into at most `k` groups of similar colors.
///
/// With no more colors than groups every color forms its own group. Otherwise
/// the colors are clustered, each color joins its nearest centroid, empty
/// groups are dropped and members are ordered by count descending.
pub fn group_by_similarity(colors: &[ColorEntry], k: usize) -> Result<Vec<ColorGroup>> {
    if colors.len() <= k {
        return Ok(colors
            .iter()
            .map(|c| ColorGroup {
                centroid: c.color,
                colors: vec![*c],
            })
            .collect());
    }

    let centroids = reduce_palette(colors, k)?;
    let mut groups: Vec<ColorGroup> = centroids
        .iter()
        .map(|&centroid| ColorGroup {
            centroid,
            colors: Vec::new(),
        })
        .collect();
    for entry in colors {
        groups[nearest_index(entry.color, &centroids)].colors.push(*entry);
    }

    groups.retain(|g| !g.colors.is_empty());
    for group in &mut groups {
        group.colors.sort_by(|a, b| b.count.cmp(&a.count));
    }
    Ok(groups)
}
