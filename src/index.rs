use std::hash::{Hash, Hasher};

use memchr::memmem;
use rustc_hash::{FxHashMap, FxHasher};

/// An exact occurrence of a query inside one member of the indexed collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hit {
    pub member: usize,
    pub offset: usize,
}

/// Exact multi-pattern search over a fixed collection of strings.
///
/// Every substring of length `seed_len` is hashed. Queries at least that long
/// are answered by looking up the hash of their first `seed_len` bytes and
/// comparing the whole query; shorter queries fall back to scanning each member.
pub struct SearchIndex {
    seqs: Vec<Vec<u8>>,
    seed_len: usize,
    /// Hits of all seeds sharing a hash, ordered by member then offset.
    seeds: FxHashMap<u64, Vec<Hit>>,
}

fn seed_hash(seed: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    hasher.finish()
}

impl SearchIndex {
    pub const MAX_SEED_LEN: usize = 16;

    pub fn new<S: AsRef<[u8]>>(seqs: &[S], seed_len: usize) -> Self {
        let seqs = seqs.iter().map(|s| s.as_ref().to_owned()).collect::<Vec<_>>();
        let seed_len = seed_len.min(Self::MAX_SEED_LEN);
        let mut seeds: FxHashMap<u64, Vec<Hit>> = FxHashMap::default();

        if seed_len > 0 {
            for (member, seq) in seqs.iter().enumerate() {
                for (offset, w) in seq.windows(seed_len).enumerate() {
                    seeds
                        .entry(seed_hash(w))
                        .or_default()
                        .push(Hit { member, offset });
                }
            }
        }

        Self {
            seqs,
            seed_len,
            seeds,
        }
    }

    /// Every occurrence of `query` in the collection, ordered by member then offset.
    ///
    /// An empty query matches nothing.
    pub fn find_all(&self, query: &[u8]) -> Vec<Hit> {
        let mut res = Vec::new();
        self.find_all_into(query, &mut res);
        res
    }

    /// Like [`find_all`](Self::find_all), but appends to `res`.
    fn find_all_into(&self, query: &[u8], res: &mut Vec<Hit>) {
        if query.is_empty() {
            return;
        }

        if self.seed_len > 0 && query.len() >= self.seed_len {
            let Some(hits) = self.seeds.get(&seed_hash(&query[..self.seed_len])) else {
                return;
            };

            res.extend(
                hits.iter()
                    .copied()
                    .filter(|h| self.seqs[h.member][h.offset..].starts_with(query)),
            );
        } else {
            let finder = memmem::Finder::new(query);

            for (member, seq) in self.seqs.iter().enumerate() {
                // find_iter skips overlapping occurrences
                let mut start = 0;
                while let Some(i) = finder.find(&seq[start..]) {
                    res.push(Hit {
                        member,
                        offset: start + i,
                    });
                    start += i + 1;
                }
            }
        }
    }

    pub fn seq(&self, member: usize) -> &[u8] {
        &self.seqs[member]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(seqs: &[&[u8]], query: &[u8]) -> Vec<Hit> {
        let mut res = Vec::new();
        for (member, seq) in seqs.iter().enumerate() {
            if query.len() > seq.len() {
                continue;
            }
            for offset in 0..=seq.len() - query.len() {
                if &seq[offset..offset + query.len()] == query {
                    res.push(Hit { member, offset });
                }
            }
        }
        res
    }

    #[test]
    fn finds_every_occurrence() {
        let seqs: [&[u8]; 3] = [b"ACGTACGTAC", b"TTACGTTT", b"GGGGG"];
        let queries: [&[u8]; 7] = [b"ACGT", b"AC", b"A", b"TACGT", b"GGGG", b"GG", b"CGTTT"];
        for seed_len in [0, 2, 4, 8] {
            let index = SearchIndex::new(&seqs, seed_len);
            for query in queries {
                assert_eq!(
                    index.find_all(query),
                    brute_force(&seqs, query),
                    "seed_len {seed_len} query {:?}",
                    std::str::from_utf8(query)
                );
            }
        }
    }

    #[test]
    fn overlapping_and_empty_queries() {
        let seqs: [&[u8]; 2] = [b"TTTT", b"AACCAACC"];
        let index = SearchIndex::new(&seqs, 3);
        assert_eq!(
            index.find_all(b"AACC"),
            vec![
                Hit {
                    member: 1,
                    offset: 0
                },
                Hit {
                    member: 1,
                    offset: 4
                }
            ]
        );
        assert_eq!(index.find_all(b"TTT").len(), 2);
        assert!(index.find_all(b"").is_empty());
        assert!(index.find_all(b"GG").is_empty());
    }

    #[test]
    fn every_window_of_long_members() {
        let seqs = (0..20)
            .map(|m| {
                (0..300)
                    .map(|i: usize| b"ACGT"[(i * i + i / 3 + m * 7) % 4])
                    .collect::<Vec<u8>>()
            })
            .collect::<Vec<_>>();
        let refs = seqs.iter().map(|s| s.as_slice()).collect::<Vec<_>>();
        let index = SearchIndex::new(&seqs, 16);

        for (m, offset) in [(0, 0), (3, 17), (11, 150), (19, 270)] {
            let query = &seqs[m][offset..offset + 24];
            let hits = index.find_all(query);
            assert_eq!(hits, brute_force(&refs, query));
            assert!(hits.contains(&Hit { member: m, offset }));
        }
    }

    #[test]
    fn query_longer_than_member() {
        let seqs: [&[u8]; 1] = [b"ACGTAC"];
        let index = SearchIndex::new(&seqs, 4);
        assert!(index.find_all(b"ACGTACGT").is_empty());
    }
}
