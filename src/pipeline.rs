//! Setup, the per-read loop and the final report.

use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;
use log::info;

use crate::calibration::*;
use crate::classify::*;
use crate::config::*;
use crate::counts::*;
use crate::errors::*;
use crate::fastq::*;
use crate::library::*;
use crate::seq::*;
use crate::stop_site::*;

/// Everything needed to turn a read pair into weighted stop counts.
pub struct Demultiplexer {
    classifier: Classifier,
    localizer: StopSiteLocalizer,
}

impl Demultiplexer {
    pub fn new(library: Library, calibration: Calibration, config: &Config) -> Self {
        let options = ClassifyOptions {
            try_harder: config.try_harder || config.align_null,
            align_null: config.align_null,
            match_single_nt_variants: config.match_single_nt_variants,
        };

        let localizer = StopSiteLocalizer::new(
            config.stop_site_strategy(),
            &calibration.constant_region,
            &calibration.adapter5,
            calibration.sequence_id_length,
            options.try_harder,
            library.max_len(),
        );

        let ligation_adapter = config
            .adapter2
            .as_ref()
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_else(|| LIGATION_ADAPTER.to_vec());

        Self {
            classifier: Classifier::new(library, calibration, ligation_adapter, options),
            localizer,
        }
    }

    pub fn library(&self) -> &Library {
        self.classifier.library()
    }

    pub fn calibration(&self) -> &Calibration {
        self.classifier.calibration()
    }

    /// An empty count matrix sized for this library and these experimental IDs.
    pub fn new_counts(&self) -> CountMatrix {
        CountMatrix::new(
            self.calibration().experimental_ids.len(),
            self.library().len(),
            self.library().max_len(),
        )
    }

    /// Classify one read pair and add its stop sites to `counts`.
    pub fn process(
        &mut self,
        pair: &ReadPair,
        counts: &mut CountMatrix,
        counters: &mut PurificationCounters,
    ) -> Result<()> {
        let Some(classification) = self.classifier.classify(&pair.read1, counters)? else {
            return Ok(());
        };

        let sites = self.localizer.localize(
            &pair.read2,
            &classification.candidates,
            self.classifier
                .experimental_id(classification.experimental_id),
            self.classifier.library(),
        );
        if sites.is_empty() {
            return Ok(());
        }

        counters.record(Stage::LibraryMatchRead2);
        if sites.iter().any(|s| s.is_strict()) {
            counters.record(Stage::StrictMatchRead2);
        }

        for s in &sites {
            let weight = s.weight();
            for &pos in &s.positions {
                counts.add(
                    classification.experimental_id,
                    s.library_id,
                    pos,
                    weight,
                    s.is_strict(),
                );
            }
        }

        Ok(())
    }
}

/// Result of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    pub counters: PurificationCounters,
    pub counts: CountMatrix,
    pub outputs: Vec<PathBuf>,
}

/// Load all inputs, process this shard of read pairs, print the report and write the matrices.
pub fn run(mut config: Config) -> Result<RunSummary> {
    config.validate()?;

    let load_start = Instant::now();
    let (pairs, mut demux) = setup(&config)?;
    info!(
        "Reading read, library and primer files took {:.3} seconds",
        load_start.elapsed().as_secs_f64()
    );

    let mut counts = demux.new_counts();
    let mut counters = PurificationCounters::new();

    info!("Running alignment");
    let align_start = Instant::now();

    for pair in pairs.iter().skip(config.start_at_read).step_by(config.stride) {
        demux.process(pair, &mut counts, &mut counters)?;
    }

    info!(
        "Aligning {} read pairs took {:.3} seconds",
        counters.get(Stage::Total),
        align_start.elapsed().as_secs_f64()
    );

    counters.report(config.try_harder);
    let outputs = counts.write_stats(&config.outpath, config.gzip)?;

    Ok(RunSummary {
        counters,
        counts,
        outputs,
    })
}

fn setup(config: &Config) -> Result<(Vec<ReadPair>, Demultiplexer)> {
    let read1 = required(&config.read1, "read1")?;
    let read2 = required(&config.read2, "read2")?;
    let library_file = required(&config.library, "library")?;

    info!("Reading file: {read1}");
    info!("Reading file: {read2}");
    let pairs = read_pairs(read1, read2)?;
    println!("{} {}", "Total pairs:".bold(), pairs.len());

    info!("Reading file: {library_file}");
    let library = Library::from_records(read_records(library_file)?)?;
    if library.is_empty() {
        return Err(Error::EmptyInput {
            kind: "library",
            file: library_file.to_owned(),
        });
    }
    info!(
        "Indexed {} library sequences (max length {})",
        library.len(),
        library.max_len()
    );

    let source = match (&config.primers, &config.barcodes) {
        (Some(primers), _) if !primers.is_empty() => {
            BarcodeSource::Primers(read_sequences(primers, "primer")?)
        }
        (_, Some(barcodes)) if !barcodes.is_empty() => {
            BarcodeSource::Barcodes(read_sequences(barcodes, "barcode")?)
        }
        _ => return Err(Error::MissingBarcodeSource),
    };

    let calibration = Calibration::new(&library, &source, &config.overrides())?;
    Ok((pairs, Demultiplexer::new(library, calibration, config)))
}

fn required<'a>(path: &'a Option<String>, name: &str) -> Result<&'a str> {
    path.as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::Config(format!("missing {name} file")))
}

fn read_sequences(file: &str, kind: &'static str) -> Result<Vec<Vec<u8>>> {
    let seqs = read_records(file)?
        .into_iter()
        .map(|r| {
            let mut seq = r.seq;
            rna_to_dna(&mut seq);
            seq
        })
        .collect::<Vec<_>>();

    if seqs.is_empty() {
        return Err(Error::EmptyInput {
            kind,
            file: file.to_owned(),
        });
    }
    Ok(seqs)
}
