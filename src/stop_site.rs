//! Locate where reverse transcription stopped by aligning read 2 against the
//! construct expected for each candidate library member.

use memchr::memmem;

use crate::align::*;
use crate::candidates::*;
use crate::library::Library;

pub const INDEL_TOLERANT_CUTOFF: i32 = -4;
pub const INDEL_FREE_CUTOFF: i32 = -2;
pub const STRICT_CUTOFF: i32 = 0;

/// How read 2 is scored against the construct. Chosen once per run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Dynamic programming with mismatch -2 and gap -1.
    IndelTolerant { cutoff: i32 },
    /// Unit cost edit distance; the cutoff is the negated maximum distance.
    IndelFree { cutoff: i32 },
}

impl Strategy {
    pub fn cutoff(&self) -> i32 {
        match self {
            Strategy::IndelTolerant { cutoff } | Strategy::IndelFree { cutoff } => *cutoff,
        }
    }
}

/// Best scoring stop positions of read 2 for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct StopSites {
    pub library_id: usize,
    /// Distinct positions, ascending.
    pub positions: Vec<usize>,
    pub score: i32,
}

impl StopSites {
    /// Weight of each position. The weights of one candidate sum to one.
    pub fn weight(&self) -> f64 {
        1.0 / self.positions.len() as f64
    }

    /// Read 2 matched without any mismatch or gap.
    pub fn is_strict(&self) -> bool {
        self.score == 0
    }
}

pub struct StopSiteLocalizer {
    strategy: Strategy,
    constant_region: Vec<u8>,
    adapter5: Vec<u8>,
    sequence_id_length: usize,
    /// Only one base before the constant region is excluded instead of the whole sequence ID.
    relaxed_bound: bool,
    max_position: usize,
    dp: DpSearcher,
    construct: Vec<u8>,
    occurrences: Vec<Occurrence>,
}

impl StopSiteLocalizer {
    pub fn new(
        strategy: Strategy,
        constant_region: &[u8],
        adapter5: &[u8],
        sequence_id_length: usize,
        relaxed_bound: bool,
        max_position: usize,
    ) -> Self {
        Self {
            strategy,
            constant_region: constant_region.to_owned(),
            adapter5: adapter5.to_owned(),
            sequence_id_length,
            relaxed_bound,
            max_position,
            dp: DpSearcher::new(),
            construct: Vec::new(),
            occurrences: Vec::new(),
        }
    }

    /// Stop sites of `read2` for every candidate that matches within the cutoff.
    ///
    /// Each candidate is weighted on its own, so a read with several surviving
    /// candidates contributes more than one unit of weight in total.
    pub fn localize(
        &mut self,
        read2: &[u8],
        candidates: &CandidateSet,
        experimental_id: &[u8],
        library: &Library,
    ) -> Vec<StopSites> {
        let mut edit_distance = match self.strategy {
            Strategy::IndelFree { .. } => Some(EditDistanceSearcher::new(read2)),
            Strategy::IndelTolerant { .. } => None,
        };

        candidates
            .iter()
            .filter_map(|c| {
                self.build_construct(c.sequence(library), experimental_id);
                self.search(read2, edit_distance.as_mut())?;
                self.best_positions(c.library_id)
            })
            .collect()
    }

    /// `sequence + experimental ID + adapter`, the expected cDNA read by read 2.
    fn build_construct(&mut self, sequence: &[u8], experimental_id: &[u8]) {
        self.construct.clear();
        self.construct.extend_from_slice(sequence);
        self.construct.extend_from_slice(experimental_id);
        self.construct.extend_from_slice(&self.adapter5);
    }

    /// Largest allowed stop position: stops cannot lie inside the sequence ID region.
    fn upper_bound(&self) -> usize {
        let excluded = if self.relaxed_bound {
            1
        } else {
            self.sequence_id_length
        };

        let bound = memmem::find(&self.construct, &self.constant_region)
            .and_then(|pos| pos.checked_sub(excluded))
            .unwrap_or(self.construct.len());

        bound.min(self.max_position)
    }

    fn search(&mut self, read2: &[u8], edit_distance: Option<&mut EditDistanceSearcher>) -> Option<()> {
        self.occurrences = match (self.strategy, edit_distance) {
            (Strategy::IndelFree { cutoff }, Some(searcher)) => {
                searcher.search(&self.construct, cutoff.unsigned_abs() as usize)
            }
            (strategy, _) => self.dp.search(
                &self.construct,
                read2,
                Scoring::STOP_SITE,
                strategy.cutoff(),
            ),
        };

        if self.occurrences.is_empty() {
            None
        } else {
            Some(())
        }
    }

    fn best_positions(&self, library_id: usize) -> Option<StopSites> {
        let score = self.occurrences.iter().map(|o| o.score).max()?;
        let bound = self.upper_bound();

        let mut positions = self
            .occurrences
            .iter()
            .filter(|o| o.score == score && o.begin <= bound)
            .map(|o| o.begin)
            .collect::<Vec<_>>();
        positions.sort_unstable();
        positions.dedup();

        if positions.is_empty() {
            return None;
        }

        Some(StopSites {
            library_id,
            positions,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSEQ: &[u8] = b"AAAGAAACAACAACAACAAC";
    const ADAPTER: &[u8] = b"CCTTAGGA";
    const EXPT: &[u8] = b"TCGA";

    fn member() -> Vec<u8> {
        let mut s = b"GGAAAGCGCATTCCAGTGCTGAGCTA".to_vec();
        s.extend_from_slice(CSEQ);
        s
    }

    fn construct() -> Vec<u8> {
        let mut s = member();
        s.extend_from_slice(EXPT);
        s.extend_from_slice(ADAPTER);
        s
    }

    fn localizer(strategy: Strategy) -> StopSiteLocalizer {
        StopSiteLocalizer::new(strategy, CSEQ, ADAPTER, 3, false, member().len())
    }

    fn single(lib: &Library) -> CandidateSet {
        let mut set = CandidateSet::new();
        set.push_ordinary(0, None).unwrap();
        assert_eq!(lib.len(), 1);
        set
    }

    #[test]
    fn exact_read2_is_strict() {
        let lib = Library::from_sequences(&[member()]).unwrap();
        let read2 = &construct()[7..37];

        for strategy in [
            Strategy::IndelTolerant {
                cutoff: INDEL_TOLERANT_CUTOFF,
            },
            Strategy::IndelFree {
                cutoff: INDEL_FREE_CUTOFF,
            },
        ] {
            let sites = localizer(strategy).localize(read2, &single(&lib), EXPT, &lib);
            assert_eq!(sites.len(), 1, "{strategy:?}");
            assert_eq!(sites[0].positions, vec![7]);
            assert!(sites[0].is_strict());
            assert_eq!(sites[0].weight(), 1.0);
        }
    }

    #[test]
    fn mismatches_respect_cutoff() {
        let lib = Library::from_sequences(&[member()]).unwrap();
        let mut read2 = construct()[5..35].to_vec();
        read2[10] = if read2[10] == b'A' { b'C' } else { b'A' };

        let sites = localizer(Strategy::IndelFree {
            cutoff: INDEL_FREE_CUTOFF,
        })
        .localize(&read2, &single(&lib), EXPT, &lib);
        assert_eq!(sites[0].positions, vec![5]);
        assert_eq!(sites[0].score, -1);
        assert!(!sites[0].is_strict());

        let sites = localizer(Strategy::IndelFree {
            cutoff: STRICT_CUTOFF,
        })
        .localize(&read2, &single(&lib), EXPT, &lib);
        assert!(sites.is_empty());
    }

    #[test]
    fn stops_inside_sequence_id_are_dropped() {
        let lib = Library::from_sequences(&[member()]).unwrap();
        let c = construct();
        let cseq_pos = member().len() - CSEQ.len();
        let strategy = Strategy::IndelTolerant {
            cutoff: INDEL_TOLERANT_CUTOFF,
        };

        // starts 2 bases before the constant region, inside a 3 base sequence ID
        let read2 = &c[cseq_pos - 2..];
        assert!(localizer(strategy)
            .localize(read2, &single(&lib), EXPT, &lib)
            .is_empty());

        // one base before the constant region is fine with the relaxed bound
        let read2 = &c[cseq_pos - 1..];
        let mut relaxed = StopSiteLocalizer::new(strategy, CSEQ, ADAPTER, 3, true, member().len());
        let sites = relaxed.localize(read2, &single(&lib), EXPT, &lib);
        assert_eq!(sites[0].positions, vec![cseq_pos - 1]);
    }

    #[test]
    fn tied_positions_split_weight() {
        // a repeat gives two equally good stops
        let mut seq = b"ACGTACGTACGTTTTTTTTT".to_vec();
        seq.extend_from_slice(CSEQ);
        let lib = Library::from_sequences(&[seq.clone()]).unwrap();
        let read2 = b"ACGTACGT";

        let mut loc = StopSiteLocalizer::new(
            Strategy::IndelTolerant { cutoff: 0 },
            CSEQ,
            ADAPTER,
            3,
            false,
            seq.len(),
        );
        let sites = loc.localize(read2, &single(&lib), EXPT, &lib);
        assert_eq!(sites[0].positions, vec![0, 4]);
        assert_eq!(sites[0].weight(), 0.5);
    }

    #[test]
    fn each_candidate_is_normalized_separately() {
        let lib = Library::from_sequences(&[member(), member()]).unwrap();
        let mut set = CandidateSet::new();
        set.push_ordinary(0, None).unwrap();
        set.push_ordinary(1, None).unwrap();

        let read2 = &construct()[3..33];
        let sites = localizer(Strategy::IndelFree {
            cutoff: INDEL_FREE_CUTOFF,
        })
        .localize(read2, &set, EXPT, &lib);

        assert_eq!(sites.len(), 2);
        let total = sites
            .iter()
            .map(|s| s.weight() * s.positions.len() as f64)
            .sum::<f64>();
        assert_eq!(total, 2.0);
    }
}
