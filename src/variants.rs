use crate::seq::DNA_BASES;

/// Single nucleotide substitution variants of a sequence ID window.
///
/// The first item is the unmodified window. After that, positions are visited
/// left to right and each is replaced by every other base of `ACGT` in
/// alphabet order, one substitution at a time. Only the first `mutable_len`
/// bytes are varied, so an anchor appended after the window stays fixed.
#[derive(Debug, Clone)]
pub struct SingleNucleotideVariants {
    window: Vec<u8>,
    variant: Vec<u8>,
    mutable_len: usize,
    state: State,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Unmodified,
    At { pos: usize, base: usize },
    Exhausted,
}

impl SingleNucleotideVariants {
    pub fn new(window: Vec<u8>, mutable_len: usize) -> Self {
        let mutable_len = mutable_len.min(window.len());
        Self {
            variant: window.clone(),
            window,
            mutable_len,
            state: State::Unmodified,
        }
    }

    /// Advance to the next variant and borrow it, without allocating.
    pub fn next_variant(&mut self) -> Option<&[u8]> {
        let (mut pos, mut base) = match self.state {
            State::Exhausted => return None,
            State::Unmodified => {
                self.state = State::At { pos: 0, base: 0 };
                return Some(&self.variant);
            }
            State::At { pos, base } => (pos, base),
        };

        while pos < self.mutable_len {
            // undo the previous substitution at this position
            self.variant[pos] = self.window[pos];

            while base < DNA_BASES.len() {
                let b = DNA_BASES[base];
                base += 1;

                if b != self.window[pos] {
                    self.variant[pos] = b;
                    self.state = State::At { pos, base };
                    return Some(&self.variant);
                }
            }

            pos += 1;
            base = 0;
        }

        self.state = State::Exhausted;
        None
    }
}

impl Iterator for SingleNucleotideVariants {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.next_variant().map(|v| v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_base_window() {
        let variants = SingleNucleotideVariants::new(b"ACG".to_vec(), 3).collect::<Vec<_>>();
        assert_eq!(variants.len(), 10);
        assert_eq!(variants[0], b"ACG");
        assert_eq!(variants[1], b"CCG");
        assert_eq!(variants[3], b"TCG");
        assert_eq!(variants[4], b"AAG");
        assert_eq!(variants[9], b"ACT");

        let mut sorted = variants.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
    }

    #[test]
    fn anchor_is_not_varied() {
        let variants = SingleNucleotideVariants::new(b"AC|GGG".to_vec(), 2).collect::<Vec<_>>();
        assert_eq!(variants.len(), 1 + 2 * 3);
        assert!(variants.iter().all(|v| v.ends_with(b"|GGG")));
    }

    #[test]
    fn unknown_bases_get_four_alternatives() {
        let variants = SingleNucleotideVariants::new(b"N".to_vec(), 1).collect::<Vec<_>>();
        assert_eq!(variants, vec![b"N".to_vec(), b"A".to_vec(), b"C".to_vec(), b"G".to_vec(), b"T".to_vec()]);
    }

    #[test]
    fn exhaustion_is_terminal() {
        let mut variants = SingleNucleotideVariants::new(b"A".to_vec(), 1);
        assert_eq!(variants.next_variant(), Some(&b"A"[..]));
        assert_eq!(variants.by_ref().count(), 3);
        assert!(variants.next_variant().is_none());
        assert!(variants.next().is_none());
    }
}
