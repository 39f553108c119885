use lazy_static::lazy_static;

/// Marks the position of an unknown-length insert in a library sequence.
pub const WILDCARD: u8 = b'*';

/// Shared 5' end of the reverse transcription primers (TruSeq universal adapter).
pub const UNIVERSAL_ADAPTER: &[u8] =
    b"AATGATACGGCGACCACCGAGATCTACACTCTTTCCCTACACGACGCTCTTCCGATCT";

/// Adapter ligated onto the 3' end of every cDNA fragment.
pub const LIGATION_ADAPTER: &[u8] = b"AGATCGGAAGAGC";

/// Alphabet walked, in order, when generating single nucleotide variants.
pub const DNA_BASES: &[u8; 4] = b"ACGT";

lazy_static! {
    pub static ref COMPLEMENT: [u8; 256] = {
        let mut comp = [0; 256];

        for (v, a) in comp.iter_mut().enumerate() {
            *a = v as u8;
        }

        // IUPAC DNA alphabet
        for (&a, &b) in b"AGCTYRWSKMDVHBN".iter().zip(b"TCGARYWSMKHBDVN".iter()) {
            comp[a as usize] = b; // upper case
            comp[a as usize + 32] = b + 32; // lower case
        }

        // RNA uracil pairs like thymine
        comp[b'U' as usize] = b'A';
        comp[b'u' as usize] = b'a';

        comp
    };
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&c| COMPLEMENT[c as usize]).collect()
}

pub fn revcomp_in_place(seq: &mut [u8]) {
    seq.reverse();
    seq.iter_mut().for_each(|c| *c = COMPLEMENT[*c as usize]);
}

pub fn rna_to_dna(seq: &mut [u8]) {
    for c in seq.iter_mut() {
        match *c {
            b'U' => *c = b'T',
            b'u' => *c = b't',
            _ => (),
        }
    }
}

pub fn is_iupac(c: u8) -> bool {
    matches!(
        c.to_ascii_uppercase(),
        b'A' | b'C' | b'G' | b'T' | b'U' | b'Y' | b'R' | b'W' | b'S' | b'K' | b'M' | b'D'
            | b'V' | b'H' | b'B' | b'N'
    )
}

/// Length of the prefix shared by every sequence.
pub fn common_prefix_len<S: AsRef<[u8]>>(seqs: &[S]) -> usize {
    let Some(first) = seqs.first() else {
        return 0;
    };
    let first = first.as_ref();

    seqs[1..].iter().fold(first.len(), |len, s| {
        first[..len]
            .iter()
            .zip(s.as_ref())
            .take_while(|(a, b)| a == b)
            .count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revcomp_handles_iupac_and_case() {
        assert_eq!(revcomp(b"ACGTN"), b"NACGT");
        assert_eq!(revcomp(b"aacR"), b"Ygtt");
        assert_eq!(revcomp(b"ACGU"), b"ACGT");

        let mut s = b"GATTACA".to_vec();
        revcomp_in_place(&mut s);
        assert_eq!(s, b"TGTAATC");
    }

    #[test]
    fn rna_is_translated() {
        let mut s = b"GGAUCu*UU".to_vec();
        rna_to_dna(&mut s);
        assert_eq!(s, b"GGATCt*TT");
    }

    #[test]
    fn common_prefix() {
        assert_eq!(common_prefix_len(&[b"ACGTT", b"ACGAA", b"ACGTA"]), 3);
        assert_eq!(common_prefix_len(&[b"ACG"]), 3);
        assert_eq!(common_prefix_len(&[b"ACG", b"TCG"]), 0);
        assert_eq!(common_prefix_len(&[&b"ACGT"[..], &b"AC"[..]]), 2);
        assert_eq!(common_prefix_len::<&[u8]>(&[]), 0);
    }
}
