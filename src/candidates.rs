use crate::errors::*;
use crate::library::Library;

/// A library member still plausible for the current read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub library_id: usize,
    /// Offset of the matched sequence ID window inside the library sequence, if known.
    pub offset: Option<usize>,
    /// Library sequence rebuilt around the junk insert observed in read 1.
    pub junk_sequence: Option<Vec<u8>>,
}

impl Candidate {
    /// The sequence that read 2 should be aligned against.
    pub fn sequence<'a>(&'a self, library: &'a Library) -> &'a [u8] {
        match &self.junk_sequence {
            Some(s) => s,
            None => &library.member(self.library_id).sequence,
        }
    }
}

/// Per-read set of candidates. Ordinary and extra-junk candidates never mix.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    mode: Option<CandidateMode>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ordinary(&mut self, library_id: usize, offset: Option<usize>) -> Result<()> {
        if self.mode == Some(CandidateMode::ExtraJunk) {
            return Err(Error::CandidateConflict(CandidateMode::ExtraJunk));
        }

        self.mode = Some(CandidateMode::Ordinary);
        self.candidates.push(Candidate {
            library_id,
            offset,
            junk_sequence: None,
        });
        Ok(())
    }

    pub fn push_extra_junk(&mut self, library_id: usize, sequence: Vec<u8>) -> Result<()> {
        if self.mode == Some(CandidateMode::Ordinary) {
            return Err(Error::CandidateConflict(CandidateMode::Ordinary));
        }

        self.mode = Some(CandidateMode::ExtraJunk);
        self.candidates.push(Candidate {
            library_id,
            offset: None,
            junk_sequence: Some(sequence),
        });
        Ok(())
    }

    /// Keep only the candidates whose library sequence agrees with read 1 the
    /// furthest upstream of the sequence ID window.
    ///
    /// Ties are all kept. Candidates without a known offset count as zero.
    pub fn disambiguate(&mut self, read1: &[u8], window_start: usize, library: &Library) {
        if self.candidates.len() < 2 {
            return;
        }

        let lens = self
            .candidates
            .iter()
            .map(|c| match c.offset {
                Some(offset) => backward_match_len(
                    read1,
                    window_start,
                    &library.member(c.library_id).sequence,
                    offset,
                ),
                None => 0,
            })
            .collect::<Vec<_>>();
        let max = lens.iter().copied().max().unwrap_or(0);

        let mut i = 0;
        self.candidates.retain(|_| {
            let keep = lens[i] == max;
            i += 1;
            keep
        });
    }

    pub fn is_extra_junk(&self) -> bool {
        self.mode == Some(CandidateMode::ExtraJunk)
    }

    pub fn iter(&self) -> std::slice::Iter<Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Number of consecutive equal bases walking backward from `a[a_pos]` and `b[b_pos]`, inclusive.
pub fn backward_match_len(a: &[u8], a_pos: usize, b: &[u8], b_pos: usize) -> usize {
    if a_pos >= a.len() || b_pos >= b.len() {
        return 0;
    }

    a[..=a_pos]
        .iter()
        .rev()
        .zip(b[..=b_pos].iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_upstream_agreement_wins() {
        // both members end in the same window. Counting the window start itself,
        // read 1 agrees with the first member for 5 bases (4 upstream) and with
        // the second for 2 (1 upstream)
        let lib = Library::from_sequences(&[&b"TTTTGACCAGGTC"[..], &b"TTTTTACAGGTC"[..]]).unwrap();
        let read1 = b"GGGACCAGGTC";
        let window_start = 6; // "AGGTC"

        let mut set = CandidateSet::new();
        set.push_ordinary(0, Some(8)).unwrap();
        set.push_ordinary(1, Some(7)).unwrap();
        assert_eq!(backward_match_len(read1, window_start, &lib.member(0).sequence, 8), 5);
        assert_eq!(backward_match_len(read1, window_start, &lib.member(1).sequence, 7), 2);

        set.disambiguate(read1, window_start, &lib);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().library_id, 0);
    }

    #[test]
    fn ties_are_kept() {
        let lib = Library::from_sequences(&[&b"AAAGGTC"[..], &b"CAAGGTC"[..], &b"AAAGGTC"[..]]).unwrap();
        let read1 = b"TAAGGTC";

        let mut set = CandidateSet::new();
        for id in 0..3 {
            set.push_ordinary(id, Some(3)).unwrap();
        }
        set.disambiguate(read1, 3, &lib);
        assert_eq!(set.iter().map(|c| c.library_id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn modes_do_not_mix() {
        let mut set = CandidateSet::new();
        set.push_ordinary(0, Some(1)).unwrap();
        assert!(matches!(
            set.push_extra_junk(1, b"ACGT".to_vec()),
            Err(Error::CandidateConflict(CandidateMode::Ordinary))
        ));

        let mut set = CandidateSet::new();
        set.push_extra_junk(1, b"ACGT".to_vec()).unwrap();
        set.push_extra_junk(2, b"ACGGT".to_vec()).unwrap();
        assert!(set.is_extra_junk());
        assert!(matches!(
            set.push_ordinary(0, None),
            Err(Error::CandidateConflict(CandidateMode::ExtraJunk))
        ));
    }

    #[test]
    fn junk_sequence_replaces_library_sequence() {
        let lib = Library::from_sequences(&[&b"GGA*CC"[..]]).unwrap();
        let mut set = CandidateSet::new();
        set.push_extra_junk(0, b"GGATTTCC".to_vec()).unwrap();
        let c = set.iter().next().unwrap();
        assert_eq!(c.sequence(&lib), b"GGATTTCC");
        assert_eq!(lib.member(0).sequence, b"GGA*CC");
    }
}
