use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::calibration::Overrides;
use crate::errors::*;
use crate::parse_utils::*;
use crate::stop_site::*;

/// Which scoring is used to place read 2 on the construct.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    EditDistance,
    Dp,
}

/// Every parameter of a run. Can be loaded from YAML; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mate 1, reverse complemented on load.
    pub read1: Option<String>,
    pub read2: Option<String>,
    /// FASTA of library sequences, optionally with one `*` marking a junk insert.
    pub library: Option<String>,
    /// FASTA of full reverse transcription primers.
    pub primers: Option<String>,
    /// FASTA of bare experimental IDs, used together with `constant`.
    pub barcodes: Option<String>,

    /// 5' sequence shared by all primers.
    pub adapter: Option<String>,
    /// 3' adapter introduced by ligation.
    pub adapter2: Option<String>,
    /// Primer binding site, reverse complemented.
    pub constant: Option<String>,
    pub sequence_id_length: Option<usize>,

    pub match_single_nt_variants: bool,
    /// Also try short inserts, junk inserts and all wildcard members when the sequence ID window has no hit.
    pub try_harder: bool,
    /// Align null ligations too. Implies `try_harder`.
    pub align_null: bool,
    /// Forbid mismatches in read 2 when using edit distance.
    pub strict: bool,
    pub strategy: StrategyKind,

    pub read2_cutoff: i32,
    pub read2_strict_cutoff: i32,
    pub read2_dp_cutoff: i32,

    pub start_at_read: usize,
    pub stride: usize,

    pub outpath: String,
    pub gzip: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read1: None,
            read2: None,
            library: None,
            primers: None,
            barcodes: None,
            adapter: None,
            adapter2: None,
            constant: None,
            sequence_id_length: None,
            match_single_nt_variants: false,
            try_harder: false,
            align_null: false,
            strict: false,
            strategy: StrategyKind::default(),
            read2_cutoff: INDEL_FREE_CUTOFF,
            read2_strict_cutoff: STRICT_CUTOFF,
            read2_dp_cutoff: INDEL_TOLERANT_CUTOFF,
            start_at_read: 0,
            stride: 1,
            outpath: String::from("."),
            gzip: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_yaml_file(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let yaml = std::fs::read_to_string(file).map_err(|e| Error::FileIo {
            file: file.display().to_string(),
            source: Box::new(e),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check required inputs and normalize user sequences in place.
    pub fn validate(&mut self) -> Result<()> {
        for (name, path) in [
            ("read1", &self.read1),
            ("read2", &self.read2),
            ("library", &self.library),
        ] {
            if path.as_deref().map_or(true, str::is_empty) {
                return Err(Error::Config(format!("missing {name} file")));
            }
        }

        normalize_field(&mut self.adapter, "adapter")?;
        normalize_field(&mut self.adapter2, "adapter2")?;
        normalize_field(&mut self.constant, "constant")?;

        let has_primers = self.primers.as_deref().map_or(false, |p| !p.is_empty());
        let has_barcodes = self.barcodes.as_deref().map_or(false, |p| !p.is_empty());
        if !has_primers && !(has_barcodes && self.constant.is_some()) {
            return Err(Error::MissingBarcodeSource);
        }

        if self.stride == 0 {
            return Err(Error::Config(String::from("stride must be at least 1")));
        }

        for (name, cutoff) in [
            ("read2_cutoff", self.read2_cutoff),
            ("read2_strict_cutoff", self.read2_strict_cutoff),
            ("read2_dp_cutoff", self.read2_dp_cutoff),
        ] {
            if cutoff > 0 {
                return Err(Error::Config(format!(
                    "{name} is {cutoff}, but scores are never positive"
                )));
            }
        }

        if self.align_null && !self.try_harder {
            warn!("Setting try_harder since align_null is set");
            self.try_harder = true;
        }

        Ok(())
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            adapter: self.adapter.as_ref().map(|s| s.as_bytes().to_vec()),
            constant: self.constant.as_ref().map(|s| s.as_bytes().to_vec()),
            sequence_id_length: self.sequence_id_length,
        }
    }

    pub fn stop_site_strategy(&self) -> Strategy {
        match self.strategy {
            StrategyKind::Dp => Strategy::IndelTolerant {
                cutoff: self.read2_dp_cutoff,
            },
            StrategyKind::EditDistance => Strategy::IndelFree {
                cutoff: if self.strict {
                    self.read2_strict_cutoff
                } else {
                    self.read2_cutoff
                },
            },
        }
    }
}

/// Blank sequences are treated as not given.
fn normalize_field(field: &mut Option<String>, context: &str) -> Result<()> {
    if let Some(s) = field.as_deref() {
        let seq = normalize_sequence(s.as_bytes(), context)?;
        *field = if seq.is_empty() {
            None
        } else {
            Some(utf8(&seq))
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        Config {
            read1: Some(String::from("r1.fq")),
            read2: Some(String::from("r2.fq")),
            library: Some(String::from("lib.fa")),
            primers: Some(String::from("primers.fa")),
            ..Default::default()
        }
    }

    #[test]
    fn yaml_with_defaults() {
        let config = Config::from_yaml_str(
            "read1: a.fq\nread2: b.fq\nlibrary: lib.fa\nbarcodes: bc.fa\nconstant: aaagaaacaacaacaacaac\nstrategy: dp\nstride: 4\n",
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::Dp);
        assert_eq!(config.stride, 4);
        assert_eq!(config.read2_cutoff, -2);
        assert_eq!(config.outpath, ".");
        assert_eq!(
            config.stop_site_strategy(),
            Strategy::IndelTolerant { cutoff: -4 }
        );

        let mut config = config;
        config.validate().unwrap();
        assert_eq!(config.constant.as_deref(), Some("AAAGAAACAACAACAACAAC"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            Config::from_yaml_str("read_1: a.fq\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn validation() {
        let mut config = minimal();
        config.align_null = true;
        config.adapter = Some(String::from(" ccuu "));
        config.adapter2 = Some(String::from("  "));
        config.validate().unwrap();
        assert!(config.try_harder);
        assert_eq!(config.adapter.as_deref(), Some("CCTT"));
        assert_eq!(config.adapter2, None);

        let mut config = minimal();
        config.stride = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.primers = None;
        config.barcodes = Some(String::from("bc.fa"));
        assert!(matches!(
            config.validate(),
            Err(Error::MissingBarcodeSource)
        ));

        let mut config = minimal();
        config.library = None;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.constant = Some(String::from("ACGX"));
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidSequence { .. })
        ));
    }

    #[test]
    fn strict_edit_distance() {
        let mut config = minimal();
        config.strict = true;
        assert_eq!(config.stop_site_strategy(), Strategy::IndelFree { cutoff: 0 });
        config.strict = false;
        assert_eq!(config.stop_site_strategy(), Strategy::IndelFree { cutoff: -2 });
    }
}
