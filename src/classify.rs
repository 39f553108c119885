//! Per-read classification of read 1: primer binding site, experimental ID,
//! then the library members the sequence ID window can belong to.

use log::debug;
use memchr::memmem;

use crate::align::*;
use crate::calibration::Calibration;
use crate::candidates::*;
use crate::counts::*;
use crate::errors::*;
use crate::index::*;
use crate::library::*;
use crate::seq::*;
use crate::variants::SingleNucleotideVariants;

/// Tolerates one mismatch or a two base deletion in the primer binding site.
pub const PRIMER_MAX_COST: usize = 2;
pub const EXPERIMENTAL_ID_MAX_DIST: usize = 2;
pub const MIN_LIGATION_ADAPTER_LEN: usize = 7;
/// Length of the end of a wildcard prefix searched for in read 1.
pub const WILDCARD_ANCHOR_LEN: usize = 6;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    pub try_harder: bool,
    pub align_null: bool,
    pub match_single_nt_variants: bool,
}

/// A read that made it past read 1.
#[derive(Debug, Clone)]
pub struct Classification {
    pub experimental_id: usize,
    pub candidates: CandidateSet,
}

pub struct Classifier {
    library: Library,
    calibration: Calibration,
    library_index: SearchIndex,
    id_index: SearchIndex,
    /// Distinct experimental ID lengths, longest first.
    id_lens: Vec<usize>,
    /// One searcher per experimental ID, in ID order.
    id_searchers: Vec<EditDistanceSearcher>,
    primer_searcher: WeightedMismatchSearcher,
    ligation_adapter: Vec<u8>,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(
        library: Library,
        calibration: Calibration,
        ligation_adapter: Vec<u8>,
        options: ClassifyOptions,
    ) -> Self {
        let seed_len = calibration.sequence_id_length + calibration.constant_region.len();
        let library_index = SearchIndex::new(
            &library
                .members()
                .iter()
                .map(|m| m.sequence.as_slice())
                .collect::<Vec<_>>(),
            seed_len,
        );

        let ids = calibration
            .experimental_ids
            .iter()
            .map(|e| e.short_sequence.as_slice())
            .collect::<Vec<_>>();
        let min_id_len = ids.iter().map(|s| s.len()).min().unwrap_or(0);
        let id_index = SearchIndex::new(&ids, min_id_len);

        let mut id_lens = ids
            .iter()
            .map(|s| s.len())
            .filter(|&l| l > 0)
            .collect::<Vec<_>>();
        id_lens.sort_unstable_by(|a, b| b.cmp(a));
        id_lens.dedup();

        let id_searchers = ids.iter().map(|s| EditDistanceSearcher::new(s)).collect();
        let primer_searcher = WeightedMismatchSearcher::new(calibration.constant_region.len());

        Self {
            library,
            calibration,
            library_index,
            id_index,
            id_lens,
            id_searchers,
            primer_searcher,
            ligation_adapter,
            options,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn experimental_id(&self, id: usize) -> &[u8] {
        &self.calibration.experimental_ids[id].short_sequence
    }

    /// Run read 1 through every stage, recording the stages it passes.
    ///
    /// `Ok(None)` means the read was dropped. Errors are reserved for
    /// inconsistent candidate sets.
    pub fn classify(
        &mut self,
        read1: &[u8],
        counters: &mut PurificationCounters,
    ) -> Result<Option<Classification>> {
        counters.record(Stage::Total);

        let cseq_len = self.calibration.constant_region.len();
        let Some(primer) = self.primer_searcher.best(
            read1,
            &self.calibration.constant_region,
            PRIMER_MAX_COST,
        ) else {
            return Ok(None);
        };
        if primer.score == 0 {
            counters.perfect += 1;
        }
        counters.record(Stage::PrimerSite);

        let Some(experimental_id) = self.find_experimental_id(&read1[primer.end..]) else {
            return Ok(None);
        };
        counters.record(Stage::ExperimentalId);

        // assumes no indels in the primer binding site
        let cseq_begin = primer.end.saturating_sub(cseq_len);
        let window_start = cseq_begin.saturating_sub(self.calibration.sequence_id_length);
        let window = self.anchored(&read1[window_start..cseq_begin]);

        let mut candidates = CandidateSet::new();
        self.lookup(&window, &mut candidates)?;

        if candidates.len() > 1 {
            candidates.disambiguate(read1, window_start, &self.library);
        }

        if candidates.is_empty() && self.options.try_harder {
            self.check_short_insert(read1, cseq_begin, &mut candidates, counters)?;

            if candidates.is_empty() {
                self.check_extra_junk(read1, cseq_begin, &mut candidates)?;
            }

            // hail mary
            if candidates.is_empty() {
                for &id in self.library.wildcard_ids() {
                    candidates.push_ordinary(id, None)?;
                }
            }
        }

        if candidates.is_empty() && self.options.match_single_nt_variants {
            let mut variants = SingleNucleotideVariants::new(window, cseq_begin - window_start);
            // the unmodified window has already been looked up
            variants.next_variant();

            while candidates.is_empty() {
                let Some(variant) = variants.next_variant() else {
                    break;
                };
                self.lookup(variant, &mut candidates)?;
            }
        }

        if candidates.is_empty() {
            return Ok(None);
        }
        counters.record(Stage::LibraryMatchRead1);

        debug!(
            "Read 1 assigned to experimental ID {} with {} candidate(s)",
            experimental_id + 1,
            candidates.len()
        );

        Ok(Some(Classification {
            experimental_id,
            candidates,
        }))
    }

    /// Exact lookup first, then the best scoring ID anywhere in the tail. Ties go to the first ID.
    fn find_experimental_id(&self, tail: &[u8]) -> Option<usize> {
        for &len in &self.id_lens {
            if tail.len() < len {
                continue;
            }

            let exact = self
                .id_index
                .find_all(&tail[..len])
                .into_iter()
                .find(|h| h.offset == 0 && self.id_index.seq(h.member).len() == len);
            if let Some(hit) = exact {
                return Some(hit.member);
            }
        }

        let mut best: Option<(usize, i32)> = None;

        for (id, searcher) in self.id_searchers.iter().enumerate() {
            let Some(occ) = searcher.best_end(tail, EXPERIMENTAL_ID_MAX_DIST) else {
                continue;
            };

            if best.map_or(true, |(_, s)| occ.score > s) {
                best = Some((id, occ.score));
                if occ.score == 0 {
                    break;
                }
            }
        }

        best.map(|(id, _)| id)
    }

    /// The constant region is appended so that only windows adjoining it in the library match.
    fn anchored(&self, window: &[u8]) -> Vec<u8> {
        let mut query = Vec::with_capacity(window.len() + self.calibration.constant_region.len());
        query.extend_from_slice(window);
        query.extend_from_slice(&self.calibration.constant_region);
        query
    }

    fn lookup(&self, query: &[u8], candidates: &mut CandidateSet) -> Result<()> {
        for hit in self.library_index.find_all(query) {
            candidates.push_ordinary(hit.member, Some(hit.offset))?;
        }
        Ok(())
    }

    /// Look for the ligation adapter right before the primer binding site. Whatever
    /// lies between them is the whole insert. Only exact adapter matches count.
    fn check_short_insert(
        &self,
        read1: &[u8],
        cseq_begin: usize,
        candidates: &mut CandidateSet,
        counters: &mut PurificationCounters,
    ) -> Result<()> {
        let len = cseq_begin
            .saturating_sub(self.calibration.sequence_id_length + 2)
            .max(MIN_LIGATION_ADAPTER_LEN)
            .min(self.ligation_adapter.len());
        let pattern = revcomp(&self.ligation_adapter[..len]);

        let Some(adapter_begin) = memmem::find(read1, &pattern) else {
            return Ok(());
        };
        let adapter_end = adapter_begin + pattern.len();
        if adapter_end > cseq_begin {
            return Ok(());
        }

        let insert = &read1[adapter_end..cseq_begin];
        if insert.is_empty() {
            counters.null_ligations += 1;
            if !self.options.align_null {
                return Ok(());
            }
        }

        debug!("Short insert of length {} in read 1", insert.len());
        let query = self.anchored(insert);
        self.lookup(&query, candidates)
    }

    /// Rebuild wildcard members around the junk observed between the end of
    /// their prefix and the primer binding site.
    fn check_extra_junk(
        &self,
        read1: &[u8],
        cseq_begin: usize,
        candidates: &mut CandidateSet,
    ) -> Result<()> {
        // the anchor must end strictly before the primer binding site
        let Some(limit) = cseq_begin.checked_sub(1) else {
            return Ok(());
        };
        let haystack = &read1[..limit];

        for &id in self.library.wildcard_ids() {
            let Some(split) = &self.library.member(id).wildcard_split else {
                continue;
            };
            let prefix = &split.prefix;
            let anchor = &prefix[prefix.len().saturating_sub(WILDCARD_ANCHOR_LEN)..];
            if anchor.is_empty() {
                continue;
            }

            let Some(pos) = memmem::rfind(haystack, anchor) else {
                continue;
            };
            let junk = &read1[pos + anchor.len()..cseq_begin];

            let mut seq = Vec::with_capacity(prefix.len() + junk.len() + split.suffix.len());
            seq.extend_from_slice(prefix);
            seq.extend_from_slice(junk);
            seq.extend_from_slice(&split.suffix);

            debug!("Junk insert {} for library member {}", utf8(junk), id + 1);
            candidates.push_extra_junk(id, seq)?;
        }

        Ok(())
    }
}
