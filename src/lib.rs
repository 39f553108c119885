//! Demultiplex paired-end reads from chemical probing experiments into
//! per-condition histograms of reverse transcription stops.
//!
//! # Overview
//! Each read pair comes from one cDNA fragment. Read 1 starts at the reverse
//! transcription primer: it holds the experimental ID, the primer binding site
//! (the *constant region*) and then the 3' end of the RNA. Read 2 starts where
//! reverse transcription stopped.
//!
//! MAPseeker assigns every pair to
//! * an experimental ID (the assay condition),
//! * a member of the RNA library,
//! * the position in that member where reverse transcription stopped,
//!
//! and accumulates weighted counts into one matrix per experimental ID.
//!
//! ## Read 1 layout
//! After reverse complementing read 1, a typical read looks like
//! ```text
//!   ...GCATTCCAGTGCTGAGCTA AAAGAAACAACAACAACAAC TCGA CCTTAGGA...
//!      |--- RNA 3' end ---| |-- constant region -| |ID| |adapter
//!                  |------|
//!               sequence ID window
//! ```
//! The sequence ID window is the shortest stretch before the constant region
//! that tells all library members apart. Its length is inferred from the
//! library unless given explicitly.
//!
//! ## Pipeline
//! Setup happens once: [`Library`] is loaded, [`Calibration`] infers the
//! adapter, constant region, experimental IDs and sequence ID length from the
//! primers, and the [`Classifier`] indexes the library.
//!
//! Then, for every read pair, [`Classifier::classify`] locates the primer
//! binding site, resolves the experimental ID and collects the candidate library
//! members. [`StopSiteLocalizer::localize`] aligns read 2 against each candidate
//! and the resulting stop positions go into a [`CountMatrix`]. Each stage a read
//! passes is tallied in [`PurificationCounters`].
//!
//! [`run`] wires all of this together from a [`Config`].

pub mod align;
pub mod calibration;
pub mod candidates;
pub mod classify;
pub mod config;
pub mod counts;
pub mod errors;
pub mod fastq;
pub mod index;
pub mod library;
pub mod pipeline;
pub mod seq;
pub mod stop_site;
pub mod variants;

mod parse_utils;

// commonly used functions and types

pub use crate::calibration::*;
pub use crate::classify::*;
pub use crate::config::*;
pub use crate::counts::*;
pub use crate::errors::*;
pub use crate::fastq::*;
pub use crate::library::*;
pub use crate::pipeline::*;
pub use crate::stop_site::*;
