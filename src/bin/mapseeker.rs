use clap::Parser;

use mapseeker::{run, Config, StrategyKind};

/// Demultiplex chemical probing reads into per-condition stop count matrices.
#[derive(Parser, Debug, Clone)]
#[command(name = "mapseeker", version)]
struct Args {
    /// YAML file with run parameters; flags below override it
    #[arg(long = "config")]
    config: Option<String>,

    /// Read 1 FASTQ, containing the primer and experimental ID
    #[arg(short = '1', long = "miseq1")]
    read1: Option<String>,
    /// Read 2 FASTQ, starting at the reverse transcription stop
    #[arg(short = '2', long = "miseq2")]
    read2: Option<String>,
    /// FASTA library of RNA sequences to align against
    #[arg(short = 'l', long = "library")]
    library: Option<String>,
    /// FASTA of experimental primers
    #[arg(short = 'p', long = "primers")]
    primers: Option<String>,
    /// FASTA of experimental barcodes, requires --cseq
    #[arg(short = 'b', long = "barcodes")]
    barcodes: Option<String>,
    /// Sequence ID length (nts 3' of the shared primer binding site)
    #[arg(short = 'n', long = "sid_length")]
    sequence_id_length: Option<usize>,

    /// Constant sequence (primer binding site, reverse complemented)
    #[arg(short = 'c', long = "cseq")]
    constant: Option<String>,
    /// 5' DNA sequence shared by all primers
    #[arg(short = 'a', long = "adapter")]
    adapter: Option<String>,
    /// 3' DNA sequence introduced by ligation
    #[arg(short = 'z', long = "adapter2")]
    adapter2: Option<String>,

    /// Retry the sequence ID with every single nucleotide variant
    #[arg(short = 'x', long = "match_single_nt_variants")]
    match_single_nt_variants: bool,
    /// Use dynamic programming to place read 2 (allows indels)
    #[arg(short = 'D', long = "match_DP")]
    match_dp: bool,
    /// Try to align short reads, even if ambiguous
    #[arg(short = 'A', long = "align_all")]
    try_harder: bool,
    /// Require read 2 to match without mismatches
    #[arg(short = 's', long = "strict")]
    strict: bool,
    /// Align null ligations too (implies --align_all)
    #[arg(short = '0', long = "align_null")]
    align_null: bool,

    /// Output directory for the stats files
    #[arg(short = 'O', long = "outpath")]
    outpath: Option<String>,
    /// Start at this read, counting from 0 (e.g. job ID)
    #[arg(short = 'N', long = "start_at_read")]
    start_at_read: Option<usize>,
    /// Take every n-th read from the start (e.g. total number of jobs)
    #[arg(short = 'j', long = "increment_between_reads")]
    stride: Option<usize>,
    /// Gzip the stats files
    #[arg(long = "gzip")]
    gzip: bool,
}

impl Args {
    fn into_config(self) -> mapseeker::Result<Config> {
        let mut config = match &self.config {
            Some(file) => Config::from_yaml_file(file)?,
            None => Config::default(),
        };

        macro_rules! set_if_some {
            ($($field:ident),*) => {
                $(
                    if self.$field.is_some() {
                        config.$field = self.$field;
                    }
                )*
            };
        }
        set_if_some!(
            read1,
            read2,
            library,
            primers,
            barcodes,
            sequence_id_length,
            constant,
            adapter,
            adapter2
        );

        if let Some(outpath) = self.outpath {
            config.outpath = outpath;
        }
        if let Some(start) = self.start_at_read {
            config.start_at_read = start;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }

        config.match_single_nt_variants |= self.match_single_nt_variants;
        config.try_harder |= self.try_harder;
        config.strict |= self.strict;
        config.align_null |= self.align_null;
        config.gzip |= self.gzip;
        if self.match_dp {
            config.strategy = StrategyKind::Dp;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    run(config)?;
    Ok(())
}
