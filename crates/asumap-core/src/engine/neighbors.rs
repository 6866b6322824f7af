use super::error::EngineError;
use super::grid::BinGrid;
use super::mappings::AsuMappings;
use nalgebra::Point3;

/// One candidate neighbor pair between symmetry copies.
///
/// `i_seq` and `j_seq` index the processed-site order; `j_sym` indexes site
/// `j_seq`'s mapping group. The pair relates the home copy (group index 0) of
/// site `i_seq` to the `j_sym`-th copy of site `j_seq`. `dist_sq` is the
/// squared Cartesian distance between those copies, or
/// [`IndexPair::NO_DISTANCE`] when the generator ran without a cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexPair {
    pub i_seq: usize,
    pub j_seq: usize,
    pub j_sym: usize,
    pub dist_sq: f64,
}

impl IndexPair {
    /// Sentinel `dist_sq` meaning "not computed".
    pub const NO_DISTANCE: f64 = -1.0;
}

/// Lazy, order-stable enumerator of candidate neighbor pairs over a locked
/// [`AsuMappings`].
///
/// Pairs are produced in a fixed triple-loop order: `i_seq` ascending, then
/// `j_seq` from `i_seq`, then `j_sym` over site `j_seq`'s group (skipping
/// `j_sym == 0` on the diagonal, where the home copy would be paired with
/// itself). With a distance cutoff, only pairs with
/// `0 < dist_sq <= cutoff^2` are produced, in the same order; copies are
/// binned on a Cartesian grid with the cutoff as cell edge so that distances
/// are only evaluated inside each home copy's 27-cell neighborhood.
///
/// Dropping the generator is the only cancellation mechanism; reconstruction
/// restarts the sequence from the beginning.
pub struct NeighborPairGenerator<'a> {
    asu_mappings: &'a AsuMappings,
    distance_cutoff: Option<f64>,
    scan: Scan,
    pending: Option<IndexPair>,
}

enum Scan {
    /// Plain triple loop; state is the next candidate triple.
    Exhaustive {
        i_seq: usize,
        j_seq: usize,
        j_sym: usize,
    },
    /// Grid-pruned scan; candidates are refilled one home copy at a time.
    Pruned(PrunedScan),
    /// A zero cutoff admits no pair.
    Empty,
}

impl<'a> NeighborPairGenerator<'a> {
    /// Enumerates every candidate pair, without distance computation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotLocked`] unless `asu_mappings.lock()` has
    /// been called.
    pub fn new(asu_mappings: &'a AsuMappings) -> Result<Self, EngineError> {
        Self::build(asu_mappings, None)
    }

    /// Enumerates only pairs within `distance_cutoff` (Cartesian).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotLocked`] for an unlocked mapping set and
    /// [`EngineError::InvalidDistanceCutoff`] for a negative or non-finite
    /// cutoff.
    pub fn with_cutoff(
        asu_mappings: &'a AsuMappings,
        distance_cutoff: f64,
    ) -> Result<Self, EngineError> {
        if !distance_cutoff.is_finite() || distance_cutoff < 0.0 {
            return Err(EngineError::InvalidDistanceCutoff {
                value: distance_cutoff,
            });
        }
        Self::build(asu_mappings, Some(distance_cutoff))
    }

    fn build(
        asu_mappings: &'a AsuMappings,
        distance_cutoff: Option<f64>,
    ) -> Result<Self, EngineError> {
        if !asu_mappings.is_locked() {
            return Err(EngineError::NotLocked);
        }
        let scan = match distance_cutoff {
            None => Scan::Exhaustive {
                i_seq: 0,
                j_seq: 0,
                j_sym: 1,
            },
            Some(cutoff) if cutoff == 0.0 => Scan::Empty,
            Some(cutoff) => Scan::Pruned(PrunedScan::build(asu_mappings, cutoff)),
        };
        let mut generator = Self {
            asu_mappings,
            distance_cutoff,
            scan,
            pending: None,
        };
        generator.pending = generator.advance();
        Ok(generator)
    }

    pub fn distance_cutoff(&self) -> Option<f64> {
        self.distance_cutoff
    }

    /// True once the sequence is exhausted.
    pub fn at_end(&self) -> bool {
        self.pending.is_none()
    }

    fn advance(&mut self) -> Option<IndexPair> {
        let groups = self.asu_mappings.mappings();
        match &mut self.scan {
            Scan::Exhaustive {
                i_seq,
                j_seq,
                j_sym,
            } => {
                let n = groups.len();
                while *i_seq < n {
                    if *j_seq < n {
                        if *j_sym < groups[*j_seq].len() {
                            let pair = IndexPair {
                                i_seq: *i_seq,
                                j_seq: *j_seq,
                                j_sym: *j_sym,
                                dist_sq: IndexPair::NO_DISTANCE,
                            };
                            *j_sym += 1;
                            return Some(pair);
                        }
                        *j_seq += 1;
                        *j_sym = 0;
                        continue;
                    }
                    *i_seq += 1;
                    *j_seq = *i_seq;
                    *j_sym = 1;
                }
                None
            }
            Scan::Pruned(scan) => scan.advance(groups.len()),
            Scan::Empty => None,
        }
    }
}

impl Iterator for NeighborPairGenerator<'_> {
    type Item = IndexPair;

    fn next(&mut self) -> Option<IndexPair> {
        let pair = self.pending.take()?;
        self.pending = self.advance();
        Some(pair)
    }
}

struct PrunedScan {
    cutoff_sq: f64,
    /// Cartesian position of every retained copy, flattened in
    /// (group, group index) order.
    cart: Vec<Point3<f64>>,
    group_of: Vec<u32>,
    sym_of: Vec<u32>,
    group_start: Vec<usize>,
    grid: BinGrid,
    i_seq: usize,
    started: bool,
    candidates: Vec<IndexPair>,
    position: usize,
}

impl PrunedScan {
    fn build(asu_mappings: &AsuMappings, cutoff: f64) -> Self {
        let unit_cell = asu_mappings.unit_cell();
        let mut cart = Vec::new();
        let mut group_of = Vec::new();
        let mut sym_of = Vec::new();
        let mut group_start = Vec::with_capacity(asu_mappings.n_sites() + 1);
        for (i_seq, group) in asu_mappings.mappings().iter().enumerate() {
            group_start.push(cart.len());
            for (j_sym, mapping) in group.iter().enumerate() {
                cart.push(unit_cell.to_cartesian(&mapping.mapped_site()));
                group_of.push(i_seq as u32);
                sym_of.push(j_sym as u32);
            }
        }
        group_start.push(cart.len());
        let grid = BinGrid::build(&cart, cutoff);
        Self {
            cutoff_sq: cutoff * cutoff,
            cart,
            group_of,
            sym_of,
            group_start,
            grid,
            i_seq: 0,
            started: false,
            candidates: Vec::new(),
            position: 0,
        }
    }

    fn advance(&mut self, n_groups: usize) -> Option<IndexPair> {
        loop {
            if self.position < self.candidates.len() {
                let pair = self.candidates[self.position];
                self.position += 1;
                return Some(pair);
            }
            if self.started {
                self.i_seq += 1;
            } else {
                self.started = true;
            }
            if self.i_seq >= n_groups {
                return None;
            }
            self.collect_candidates();
        }
    }

    /// Gathers the surviving pairs for the current home copy, in ascending
    /// flattened index order (which is (j_seq, j_sym) lexicographic order).
    fn collect_candidates(&mut self) {
        self.candidates.clear();
        self.position = 0;

        let i_seq = self.i_seq;
        let start = self.group_start[i_seq];
        if start == self.group_start[i_seq + 1] {
            return; // site retained no copies, nothing to reference
        }
        let home = self.cart[start];
        for flat in self.grid.neighborhood(&home) {
            let flat = flat as usize;
            let j_seq = self.group_of[flat] as usize;
            let j_sym = self.sym_of[flat] as usize;
            if j_seq < i_seq || (j_seq == i_seq && j_sym == 0) {
                continue;
            }
            let dist_sq = (self.cart[flat] - home).norm_squared();
            if dist_sq > 0.0 && dist_sq <= self.cutoff_sq {
                self.candidates.push(IndexPair {
                    i_seq,
                    j_seq,
                    j_sym,
                    dist_sq,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures;

    const TOLERANCE: f64 = 1e-9;

    fn locked_mappings(buffer_thickness: f64, n_sites: usize) -> AsuMappings {
        let mut asu_mappings = fixtures::mappings_with_buffer(buffer_thickness, n_sites);
        asu_mappings.lock();
        asu_mappings
    }

    fn triples(pairs: &[IndexPair]) -> Vec<(usize, usize, usize)> {
        pairs.iter().map(|p| (p.i_seq, p.j_seq, p.j_sym)).collect()
    }

    /// Squared Cartesian distance between the home copy of site `i_seq` and
    /// the `j_sym`-th copy of site `j_seq`, straight from the mapping set.
    fn reference_dist_sq(asu_mappings: &AsuMappings, pair: &IndexPair) -> f64 {
        let cell = asu_mappings.unit_cell();
        let home = cell.to_cartesian(&asu_mappings.mappings()[pair.i_seq][0].mapped_site());
        let other =
            cell.to_cartesian(&asu_mappings.mappings()[pair.j_seq][pair.j_sym].mapped_site());
        (other - home).norm_squared()
    }

    #[test]
    fn construction_requires_a_locked_mapping_set() {
        let asu_mappings = fixtures::mappings_with_buffer(0.1, 2);
        assert_eq!(
            NeighborPairGenerator::new(&asu_mappings).err(),
            Some(EngineError::NotLocked)
        );
        assert_eq!(
            NeighborPairGenerator::with_cutoff(&asu_mappings, 1.0).err(),
            Some(EngineError::NotLocked)
        );
    }

    #[test]
    fn construction_rejects_invalid_cutoffs() {
        let asu_mappings = locked_mappings(0.1, 2);
        assert_eq!(
            NeighborPairGenerator::with_cutoff(&asu_mappings, -1.0).err(),
            Some(EngineError::InvalidDistanceCutoff { value: -1.0 })
        );
        assert!(NeighborPairGenerator::with_cutoff(&asu_mappings, f64::NAN).is_err());
    }

    #[test]
    fn unfiltered_enumeration_follows_the_triple_loop_order() {
        let asu_mappings = locked_mappings(0.1, 2);
        let mut generator = NeighborPairGenerator::new(&asu_mappings).unwrap();
        assert!(!generator.at_end());

        let mut pairs = Vec::new();
        while let Some(pair) = generator.next() {
            assert_eq!(pair.dist_sq, IndexPair::NO_DISTANCE);
            pairs.push(pair);
        }
        assert!(generator.at_end());

        assert_eq!(
            triples(&pairs),
            vec![
                (0, 0, 1),
                (0, 0, 2),
                (0, 0, 3),
                (0, 0, 4),
                (0, 1, 0),
                (0, 1, 1),
                (0, 1, 2),
                (0, 1, 3),
                (0, 1, 4),
                (0, 1, 5),
                (1, 1, 1),
                (1, 1, 2),
                (1, 1, 3),
                (1, 1, 4),
                (1, 1, 5),
            ]
        );
    }

    #[test]
    fn a_generous_cutoff_reproduces_the_unfiltered_pair_set_with_distances() {
        let asu_mappings = locked_mappings(0.1, 2);
        let unfiltered: Vec<_> = NeighborPairGenerator::new(&asu_mappings).unwrap().collect();
        let filtered: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, 100.0)
            .unwrap()
            .collect();

        assert_eq!(triples(&filtered), triples(&unfiltered));
        for pair in &filtered {
            assert!(pair.dist_sq > 0.0);
            let expected = reference_dist_sq(&asu_mappings, pair);
            assert!((pair.dist_sq - expected).abs() < TOLERANCE);
        }
    }

    #[test]
    fn a_tightened_cutoff_keeps_exactly_the_near_pairs() {
        let asu_mappings = locked_mappings(0.1, 2);
        let full: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, 100.0)
            .unwrap()
            .collect();

        let mean_distance =
            full.iter().map(|p| p.dist_sq.sqrt()).sum::<f64>() / full.len() as f64;
        let cutoff = mean_distance + 1e-5;

        let near: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, cutoff)
            .unwrap()
            .collect();
        assert_eq!(
            triples(&near),
            vec![(0, 1, 0), (0, 1, 1), (0, 1, 2), (1, 1, 1), (1, 1, 2)]
        );

        // Exactly the prefix-order subset of the full enumeration that
        // satisfies the new cutoff; nothing missing, nothing duplicated.
        let expected: Vec<_> = full
            .iter()
            .filter(|p| p.dist_sq <= cutoff * cutoff)
            .cloned()
            .collect();
        assert_eq!(triples(&near), triples(&expected));
        for (got, want) in near.iter().zip(&expected) {
            assert!((got.dist_sq - want.dist_sq).abs() < TOLERANCE);
        }
    }

    #[test]
    fn identical_generators_produce_identical_sequences() {
        let asu_mappings = locked_mappings(0.1, 2);
        let first: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, 0.7)
            .unwrap()
            .collect();
        let second: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, 0.7)
            .unwrap()
            .collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn a_zero_cutoff_produces_no_pairs() {
        let asu_mappings = locked_mappings(0.1, 2);
        let mut generator = NeighborPairGenerator::with_cutoff(&asu_mappings, 0.0).unwrap();
        assert!(generator.at_end());
        assert_eq!(generator.next(), None);
    }

    #[test]
    fn a_single_site_with_a_tight_buffer_has_no_neighbors() {
        let asu_mappings = locked_mappings(0.04, 1);
        let pairs: Vec<_> = NeighborPairGenerator::new(&asu_mappings).unwrap().collect();
        assert!(pairs.is_empty());
    }

    #[test]
    fn a_single_site_pairs_its_home_copy_with_its_other_copies() {
        let asu_mappings = locked_mappings(0.1, 1);
        let pairs: Vec<_> = NeighborPairGenerator::new(&asu_mappings).unwrap().collect();
        assert_eq!(
            triples(&pairs),
            vec![(0, 0, 1), (0, 0, 2), (0, 0, 3), (0, 0, 4)]
        );
    }

    #[test]
    fn distinct_sites_pair_even_without_extra_symmetry_copies() {
        let asu_mappings = locked_mappings(0.0, 2);
        let pairs: Vec<_> = NeighborPairGenerator::new(&asu_mappings).unwrap().collect();
        assert_eq!(triples(&pairs), vec![(0, 1, 0)]);
    }

    #[test]
    fn a_small_buffer_admits_a_few_cross_and_self_pairs() {
        let asu_mappings = locked_mappings(0.04, 2);
        let pairs: Vec<_> = NeighborPairGenerator::new(&asu_mappings).unwrap().collect();
        assert_eq!(triples(&pairs), vec![(0, 1, 0), (0, 1, 1), (1, 1, 1)]);
    }

    #[test]
    fn at_end_tracks_the_stepwise_pull() {
        let asu_mappings = locked_mappings(0.0, 2);
        let mut generator = NeighborPairGenerator::new(&asu_mappings).unwrap();
        assert!(!generator.at_end());
        assert!(generator.next().is_some());
        assert!(generator.at_end());
        assert_eq!(generator.next(), None);
        assert!(generator.at_end());
    }

    #[test]
    fn cutoff_pruning_matches_the_exhaustive_filter_for_many_cutoffs() {
        let asu_mappings = locked_mappings(0.1, 2);
        let full: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, 100.0)
            .unwrap()
            .collect();
        for cutoff in [0.15, 0.3, 0.45, 0.62, 0.8, 0.95] {
            let pruned: Vec<_> = NeighborPairGenerator::with_cutoff(&asu_mappings, cutoff)
                .unwrap()
                .collect();
            let expected: Vec<_> = full
                .iter()
                .filter(|p| p.dist_sq <= cutoff * cutoff)
                .cloned()
                .collect();
            assert_eq!(triples(&pruned), triples(&expected));
        }
    }
}
