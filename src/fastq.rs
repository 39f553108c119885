use needletail::*;

use std::fmt;

use crate::errors::*;
use crate::seq::revcomp_in_place;

/// Where a batch of records was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(String),
    Bytes,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Origin::*;
        match self {
            File(file) => write!(f, "file \"{file}\""),
            Bytes => write!(f, "bytes"),
        }
    }
}

/// A FASTA or FASTQ record. FASTA records have no quality string.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
}

/// One paired-end read, with the first mate already reverse complemented.
#[derive(Debug, Clone)]
pub struct ReadPair {
    pub id1: Vec<u8>,
    pub read1: Vec<u8>,
    pub id2: Vec<u8>,
    pub read2: Vec<u8>,
}

impl ReadPair {
    pub fn new(record1: Record, record2: Record) -> Self {
        let mut read1 = record1.seq;
        revcomp_in_place(&mut read1);

        Self {
            id1: record1.id,
            read1,
            id2: record2.id,
            read2: record2.seq,
        }
    }
}

/// Load every record from a FASTA or FASTQ file (optionally compressed).
///
/// The format is detected from the first byte of the file.
pub fn read_records(file: impl AsRef<str>) -> Result<Vec<Record>> {
    let origin = Origin::File(file.as_ref().to_owned());
    let reader = parse_fastx_file(file.as_ref()).map_err(|e| Error::FileIo {
        file: file.as_ref().to_owned(),
        source: Box::new(e),
    })?;

    collect_records(reader, &origin)
}

/// Load every record from FASTA or FASTQ bytes.
pub fn records_from_bytes(bytes: &[u8]) -> Result<Vec<Record>> {
    let reader = parse_fastx_reader(bytes).map_err(|e| Error::BytesIo(Box::new(e)))?;
    collect_records(reader, &Origin::Bytes)
}

fn collect_records<'a>(
    mut reader: Box<dyn FastxReader + 'a>,
    origin: &Origin,
) -> Result<Vec<Record>> {
    let mut res = Vec::new();

    while let Some(record) = reader.next() {
        let record = record.map_err(|e| Error::ParseRecord {
            origin: origin.clone(),
            idx: res.len(),
            source: Box::new(e),
        })?;

        let mut seq = record.seq().into_owned();
        seq.make_ascii_uppercase();

        res.push(Record {
            id: record.id().to_owned(),
            seq,
            qual: record.qual().map(|q| q.to_owned()),
        });
    }

    Ok(res)
}

/// Zip the records of two mate files into read pairs.
pub fn pair_records(
    records1: Vec<Record>,
    origin1: Origin,
    records2: Vec<Record>,
    origin2: Origin,
) -> Result<Vec<ReadPair>> {
    if records1.len() != records2.len() {
        return Err(Error::UnpairedRead {
            file1: origin1,
            count1: records1.len(),
            file2: origin2,
            count2: records2.len(),
        });
    }

    Ok(records1
        .into_iter()
        .zip(records2)
        .map(|(r1, r2)| ReadPair::new(r1, r2))
        .collect())
}

/// Load both mate files completely and pair them up.
pub fn read_pairs(file1: impl AsRef<str>, file2: impl AsRef<str>) -> Result<Vec<ReadPair>> {
    let records1 = read_records(file1.as_ref())?;
    let records2 = read_records(file2.as_ref())?;

    pair_records(
        records1,
        Origin::File(file1.as_ref().to_owned()),
        records2,
        Origin::File(file2.as_ref().to_owned()),
    )
}
