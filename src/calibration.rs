//! One-time inference of the adapter, constant region, experimental IDs and
//! the sequence ID length from the primers and the library.

use log::{info, warn};
use rustc_hash::FxHashSet;

use crate::errors::*;
use crate::library::*;
use crate::seq::*;

/// Where the experimental IDs come from.
#[derive(Debug, Clone)]
pub enum BarcodeSource {
    /// Full reverse transcription primers: `adapter + ID + primer binding site`.
    Primers(Vec<Vec<u8>>),
    /// Bare experimental IDs. The constant region must then be given explicitly.
    Barcodes(Vec<Vec<u8>>),
}

/// User-supplied values that take precedence over inferred ones.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub adapter: Option<Vec<u8>>,
    pub constant: Option<Vec<u8>>,
    pub sequence_id_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Calibration {
    /// Shared 5' end of the primers, appended after the experimental ID when reconstructing read 2.
    pub adapter5: Vec<u8>,
    /// Primer binding site, in the orientation it appears in the reverse complemented read 1.
    pub constant_region: Vec<u8>,
    pub sequence_id_length: usize,
    pub experimental_ids: Vec<ExperimentalId>,
}

impl Calibration {
    pub fn new(library: &Library, source: &BarcodeSource, overrides: &Overrides) -> Result<Self> {
        let (adapter5, constant_region, ids) = match source {
            BarcodeSource::Primers(primers) => infer_from_primers(primers, overrides)?,
            BarcodeSource::Barcodes(barcodes) => {
                let Some(constant) = overrides.constant.clone() else {
                    return Err(Error::MissingBarcodeSource);
                };
                let adapter = overrides
                    .adapter
                    .clone()
                    .unwrap_or_else(|| UNIVERSAL_ADAPTER.to_vec());
                info!("Getting {} experimental IDs from barcode file", barcodes.len());
                (adapter, constant, barcodes.clone())
            }
        };

        if ids.is_empty() {
            return Err(Error::EmptyInput {
                kind: "primer or barcode",
                file: String::from("(experimental IDs)"),
            });
        }

        let experimental_ids = ids
            .into_iter()
            .enumerate()
            .map(|(id, short_sequence)| ExperimentalId { id, short_sequence })
            .collect();

        let inferred = infer_sequence_id_length(library, &constant_region);
        let sequence_id_length = resolve_sequence_id_length(inferred, overrides.sequence_id_length);

        Ok(Self {
            adapter5,
            constant_region,
            sequence_id_length,
            experimental_ids,
        })
    }
}

fn infer_from_primers(
    primers: &[Vec<u8>],
    overrides: &Overrides,
) -> Result<(Vec<u8>, Vec<u8>, Vec<Vec<u8>>)> {
    if primers.is_empty() {
        return Err(Error::EmptyInput {
            kind: "primer",
            file: String::from("(primers)"),
        });
    }
    info!("Number of primers: {}", primers.len());

    let primers_rc = primers.iter().map(|p| revcomp(p)).collect::<Vec<_>>();

    let mut match_5prime = common_prefix_len(primers);
    if primers
        .iter()
        .all(|p| p.len() > UNIVERSAL_ADAPTER.len() && p.starts_with(UNIVERSAL_ADAPTER))
    {
        info!("Identified universal Illumina adapter sequence in primers");
        match_5prime = UNIVERSAL_ADAPTER.len();
    }

    let adapter_inferred = &primers[0][..match_5prime];
    let adapter5 = prefer_user("adapter", overrides.adapter.as_deref(), adapter_inferred);
    info!("Adapter sequence shared by primers: {}", utf8(&adapter5));

    let match_3prime = common_prefix_len(&primers_rc);
    let constant_inferred = &primers_rc[0][..match_3prime];
    let constant_region = prefer_user(
        "constant sequence",
        overrides.constant.as_deref(),
        constant_inferred,
    );
    info!(
        "Constant sequence shared by primers (reverse complement): {}",
        utf8(&constant_region)
    );

    let ids = primers_rc
        .iter()
        .enumerate()
        .map(|(i, rc)| {
            let end = rc.len() - match_5prime;
            let id = rc[match_3prime.min(end)..end].to_vec();
            if id.is_empty() {
                warn!("Experimental ID of primer {} is empty", i + 1);
            }
            info!("Experimental ID inferred for primer {}: {}", i + 1, utf8(&id));
            id
        })
        .collect();

    Ok((adapter5, constant_region, ids))
}

fn prefer_user(what: &str, user: Option<&[u8]>, inferred: &[u8]) -> Vec<u8> {
    match user {
        Some(user) => {
            if user != inferred {
                warn!(
                    "User {what} {} does not match inferred {what} {}, using user input",
                    utf8(user),
                    utf8(inferred)
                );
            }
            user.to_vec()
        }
        None => inferred.to_vec(),
    }
}

/// Result of searching for the shortest disambiguating sequence ID.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InferredLength {
    pub len: usize,
    /// Some members could not be told apart at any length.
    pub redundant: bool,
}

/// Find the smallest `L >= 1` such that the `L + |constant_region|` prefixes of
/// the reverse complemented library members are pairwise distinct.
///
/// The search stops at the shortest member. A member that ends inside a longer
/// one cannot be told apart and makes the library redundant.
pub fn infer_sequence_id_length(library: &Library, constant_region: &[u8]) -> InferredLength {
    let shortest = library.members().iter().map(|m| m.len()).min().unwrap_or(0);
    let limit = shortest.saturating_sub(constant_region.len()).max(1);
    let mut seen = FxHashSet::default();

    for len in 1..=limit {
        seen.clear();
        let prefix_len = len + constant_region.len();
        let distinct = library.members().iter().all(|m| {
            let rc = &m.reverse_complement;
            seen.insert(&rc[..prefix_len.min(rc.len())])
        });

        if distinct {
            info!("Inferred sequence ID length needed to ensure disambiguation: {len}");
            return InferredLength {
                len,
                redundant: false,
            };
        }
    }

    warn!("Redundant library members detected, some sequences cannot be told apart");
    InferredLength {
        len: limit,
        redundant: true,
    }
}

/// The user value always wins, but disagreements are reported.
pub fn resolve_sequence_id_length(inferred: InferredLength, user: Option<usize>) -> usize {
    match user.filter(|&l| l > 0) {
        None => {
            info!("Sequence ID length not given, using inferred length {}", inferred.len);
            inferred.len
        }
        Some(user) if user < inferred.len => {
            warn!(
                "User sequence ID length {user} is shorter than inferred length {}; \
                 identical regions exist in the library and will be disambiguated per read",
                inferred.len
            );
            user
        }
        Some(user) => {
            if user > inferred.len {
                warn!(
                    "User sequence ID length {user} is longer than needed (inferred {}), using user input",
                    inferred.len
                );
            }
            user
        }
    }
}
