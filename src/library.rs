//! Immutable reference tables: library members and experimental IDs.

use memchr::memchr;

use crate::errors::*;
use crate::fastq::Record;
use crate::seq::*;

/// Prefix and suffix around the single wildcard of a library sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardSplit {
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct LibraryMember {
    pub id: usize,
    pub name: String,
    /// DNA sequence. The wildcard, if any, is kept so that exact lookups never match across it.
    pub sequence: Vec<u8>,
    pub reverse_complement: Vec<u8>,
    pub wildcard_split: Option<WildcardSplit>,
}

impl LibraryMember {
    pub fn new(id: usize, name: impl Into<String>, mut sequence: Vec<u8>) -> Result<Self> {
        let name = name.into();
        sequence.make_ascii_uppercase();
        rna_to_dna(&mut sequence);

        let wildcard_split = match memchr(WILDCARD, &sequence) {
            Some(i) => {
                if memchr(WILDCARD, &sequence[i + 1..]).is_some() {
                    return Err(Error::TooManyWildcards {
                        name,
                        seq: utf8(&sequence),
                    });
                }

                Some(WildcardSplit {
                    prefix: sequence[..i].to_owned(),
                    suffix: sequence[i + 1..].to_owned(),
                })
            }
            None => None,
        };

        let reverse_complement = revcomp(&sequence);

        Ok(Self {
            id,
            name,
            sequence,
            reverse_complement,
            wildcard_split,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentalId {
    pub id: usize,
    pub short_sequence: Vec<u8>,
}

/// All library members, in file order.
#[derive(Debug, Clone)]
pub struct Library {
    members: Vec<LibraryMember>,
    wildcard_ids: Vec<usize>,
    max_len: usize,
}

impl Library {
    pub fn new(members: Vec<LibraryMember>) -> Self {
        let wildcard_ids = members
            .iter()
            .filter(|m| m.wildcard_split.is_some())
            .map(|m| m.id)
            .collect();
        let max_len = members.iter().map(|m| m.len()).max().unwrap_or(0);

        Self {
            members,
            wildcard_ids,
            max_len,
        }
    }

    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let members = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| LibraryMember::new(i, utf8(&r.id), r.seq))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(members))
    }

    pub fn from_sequences<S: AsRef<[u8]>>(seqs: &[S]) -> Result<Self> {
        let members = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| LibraryMember::new(i, format!("seq{}", i + 1), s.as_ref().to_owned()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(members))
    }

    pub fn members(&self) -> &[LibraryMember] {
        &self.members
    }

    pub fn member(&self, id: usize) -> &LibraryMember {
        &self.members[id]
    }

    /// Ids of the members containing a wildcard, in library order.
    pub fn wildcard_ids(&self) -> &[usize] {
        &self.wildcard_ids
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_translated_and_split() {
        let lib = Library::from_sequences(&[&b"GGAUC"[..], &b"ggaa*CCUU"[..]]).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.max_len(), 9);

        let m0 = lib.member(0);
        assert_eq!(m0.sequence, b"GGATC");
        assert_eq!(m0.reverse_complement, b"GATCC");
        assert!(m0.wildcard_split.is_none());

        let m1 = lib.member(1);
        assert_eq!(m1.sequence, b"GGAA*CCTT");
        assert_eq!(
            m1.wildcard_split,
            Some(WildcardSplit {
                prefix: b"GGAA".to_vec(),
                suffix: b"CCTT".to_vec(),
            })
        );
        assert_eq!(lib.wildcard_ids(), &[1]);
    }

    #[test]
    fn two_wildcards_are_fatal() {
        let res = Library::from_sequences(&[b"GG*AA*CC"]);
        assert!(matches!(res, Err(Error::TooManyWildcards { .. })));
    }
}
