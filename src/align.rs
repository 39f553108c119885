//! Approximate substring search: find a whole pattern inside a text,
//! reporting every end position whose score passes a cutoff.

use bio::pattern_matching::myers::long;
use bio::pattern_matching::ukkonen::Ukkonen;

/// Linear gap scoring where a match scores zero, so every score is `<= 0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scoring {
    pub mismatch: i32,
    pub gap: i32,
}

impl Scoring {
    pub const STOP_SITE: Scoring = Scoring {
        mismatch: -2,
        gap: -1,
    };

    #[inline]
    fn sub(&self, a: u8, b: u8) -> i32 {
        if a == b {
            0
        } else {
            self.mismatch
        }
    }
}

/// A pattern occurrence in the text. `end` is exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    pub begin: usize,
    pub end: usize,
    pub score: i32,
}

/// A pattern occurrence known only by where it ends. `end` is exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchEnd {
    pub end: usize,
    pub score: i32,
}

/// Lowest distance among `(last index, distance)` hits. Ties go to the first
/// end position and scanning stops early at an exact hit.
fn first_best(hits: impl Iterator<Item = (usize, usize)>) -> Option<MatchEnd> {
    let mut best: Option<MatchEnd> = None;

    for (last, dist) in hits {
        let score = -(dist as i32);
        if best.map_or(true, |b| score > b.score) {
            best = Some(MatchEnd {
                end: last + 1,
                score,
            });
            if score == 0 {
                break;
            }
        }
    }

    best
}

/// Dynamic programming search with free end gaps in the text (Sellers).
///
/// Used where begin positions are needed under non-unit costs. The full matrix
/// is kept so that the begin position of every hit can be recovered by
/// traceback. Buffers are reused across calls.
pub struct DpSearcher {
    matrix: Vec<i32>,
    len: usize,
}

impl DpSearcher {
    const MIN_SIZE: usize = 1024;

    pub fn new() -> Self {
        Self {
            matrix: vec![0; Self::MIN_SIZE],
            len: Self::MIN_SIZE,
        }
    }

    fn resize_if_needed(&mut self, len: usize) {
        if len > self.len {
            self.matrix = vec![0; len];
            self.len = len;
        }
    }

    /// All occurrences of `pattern` in `text` scoring at least `cutoff`, in order of end position.
    pub fn search(
        &mut self,
        text: &[u8],
        pattern: &[u8],
        scoring: Scoring,
        cutoff: i32,
    ) -> Vec<Occurrence> {
        if pattern.is_empty() {
            return Vec::new();
        }

        self.fill(text, pattern, scoring);

        let cols = text.len() + 1;
        let last_row = pattern.len() * cols;

        (1..cols)
            .filter_map(|j| {
                let score = self.matrix[last_row + j];
                if score >= cutoff {
                    Some(Occurrence {
                        begin: self.begin(text, pattern, scoring, j),
                        end: j,
                        score,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    fn fill(&mut self, text: &[u8], pattern: &[u8], scoring: Scoring) {
        let cols = text.len() + 1;
        let rows = pattern.len() + 1;
        self.resize_if_needed(rows * cols);
        let m = &mut self.matrix;

        // the pattern may start anywhere in the text
        m[..cols].fill(0);

        for i in 1..rows {
            let row = i * cols;
            let prev = row - cols;
            m[row] = (i as i32) * scoring.gap;

            for j in 1..cols {
                let diag = m[prev + j - 1] + scoring.sub(pattern[i - 1], text[j - 1]);
                let up = m[prev + j] + scoring.gap;
                let left = m[row + j - 1] + scoring.gap;
                m[row + j] = diag.max(up).max(left);
            }
        }
    }

    fn begin(&self, text: &[u8], pattern: &[u8], scoring: Scoring, end: usize) -> usize {
        let cols = text.len() + 1;
        let m = &self.matrix;
        let mut i = pattern.len();
        let mut j = end;

        while i > 0 {
            let curr = m[i * cols + j];

            if j > 0 && curr == m[(i - 1) * cols + j - 1] + scoring.sub(pattern[i - 1], text[j - 1])
            {
                i -= 1;
                j -= 1;
            } else if curr == m[(i - 1) * cols + j] + scoring.gap {
                i -= 1;
            } else {
                j -= 1;
            }
        }

        j
    }
}

impl Default for DpSearcher {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch_costs_two(a: u8, b: u8) -> u32 {
    if a == b {
        0
    } else {
        2
    }
}

/// Search where a mismatch costs two and a gap costs one (Ukkonen cutoff).
///
/// One base deletion is cheaper than a mismatch, so a cost of 2 tolerates one
/// mismatch or two deleted bases.
pub struct WeightedMismatchSearcher {
    ukkonen: Ukkonen<fn(u8, u8) -> u32>,
}

impl WeightedMismatchSearcher {
    pub fn new(pattern_len: usize) -> Self {
        Self {
            ukkonen: Ukkonen::with_capacity(pattern_len, mismatch_costs_two as fn(u8, u8) -> u32),
        }
    }

    /// Lowest cost occurrence within `max_cost`, scored as the negated cost.
    pub fn best(&mut self, text: &[u8], pattern: &[u8], max_cost: usize) -> Option<MatchEnd> {
        if pattern.is_empty() {
            return None;
        }
        first_best(self.ukkonen.find_all_end(pattern, text.iter(), max_cost))
    }
}

/// Unit cost edit distance search of one pattern against many texts (Myers bit-parallel).
pub struct EditDistanceSearcher {
    myers: Option<long::Myers<u64>>,
}

impl EditDistanceSearcher {
    pub fn new(pattern: &[u8]) -> Self {
        let myers = if pattern.is_empty() {
            None
        } else {
            Some(long::Myers::<u64>::new(pattern))
        };

        Self { myers }
    }

    /// All occurrences within `max_dist` edits, scored as the negated distance.
    pub fn search(&mut self, text: &[u8], max_dist: usize) -> Vec<Occurrence> {
        let Some(myers) = self.myers.as_mut() else {
            return Vec::new();
        };

        myers
            .find_all(text, max_dist)
            .map(|(begin, end, dist)| Occurrence {
                begin,
                end,
                score: -(dist as i32),
            })
            .collect()
    }

    /// Lowest distance occurrence within `max_dist`, without traceback.
    pub fn best_end(&self, text: &[u8], max_dist: usize) -> Option<MatchEnd> {
        let myers = self.myers.as_ref()?;
        first_best(myers.find_all_end(text, max_dist))
    }
}
