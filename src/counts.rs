use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use flate2::{write::GzEncoder, Compression};

use crate::errors::*;

/// Purification stages in the order reads pass through them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Total,
    PrimerSite,
    ExperimentalId,
    LibraryMatchRead1,
    LibraryMatchRead2,
    StrictMatchRead2,
}

impl Stage {
    pub const COUNT: usize = 6;
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Total,
        Stage::PrimerSite,
        Stage::ExperimentalId,
        Stage::LibraryMatchRead1,
        Stage::LibraryMatchRead2,
        Stage::StrictMatchRead2,
    ];

    pub fn label(&self) -> &'static str {
        use Stage::*;
        match self {
            Total => "total",
            PrimerSite => "found primer binding site",
            ExperimentalId => "found expt ID site",
            LibraryMatchRead1 => "found match in RNA sequence (read 1)",
            LibraryMatchRead2 => "found match in RNA sequence (read 2)",
            StrictMatchRead2 => "found strict match in RNA sequence (read 2)",
        }
    }
}

/// How many reads reached each stage, plus side tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurificationCounters {
    counts: [u64; Stage::COUNT],
    /// Reads whose primer binding site matched without penalty.
    pub perfect: u64,
    /// Reads where the ligation adapter directly abuts the primer binding site.
    pub null_ligations: u64,
}

impl PurificationCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage) {
        self.counts[stage as usize] += 1;
    }

    pub fn get(&self, stage: Stage) -> u64 {
        self.counts[stage as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, u64)> + '_ {
        Stage::ALL.iter().map(|&s| (s, self.get(s)))
    }

    /// Print the purification table and side tallies to stdout.
    pub fn report(&self, show_null_ligations: bool) {
        println!();
        println!("{}", "Purification table".bold());
        for (stage, count) in self.iter() {
            println!("{count} {}", stage.label());
        }
        println!();
        println!("Perfect constant sequence: {}", self.perfect);
        if show_null_ligations {
            println!("Null ligations           : {}", self.null_ligations);
        }
    }
}

/// Weighted stop counts, `[experimental ID][library member][position]`, with a
/// parallel matrix that only receives zero-mismatch read 2 matches.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    num_ids: usize,
    num_members: usize,
    width: usize,
    counts: Vec<f64>,
    strict_counts: Vec<f64>,
}

impl CountMatrix {
    /// Positions run from 0 to `max_len` inclusive.
    pub fn new(num_ids: usize, num_members: usize, max_len: usize) -> Self {
        let width = max_len + 1;
        let size = num_ids * num_members * width;

        Self {
            num_ids,
            num_members,
            width,
            counts: vec![0.0; size],
            strict_counts: vec![0.0; size],
        }
    }

    #[inline]
    fn idx(&self, expt: usize, member: usize, pos: usize) -> usize {
        debug_assert!(expt < self.num_ids && member < self.num_members && pos < self.width);
        (expt * self.num_members + member) * self.width + pos
    }

    pub fn add(&mut self, expt: usize, member: usize, pos: usize, weight: f64, strict: bool) {
        let i = self.idx(expt, member, pos);
        self.counts[i] += weight;
        if strict {
            self.strict_counts[i] += weight;
        }
    }

    pub fn get(&self, expt: usize, member: usize, pos: usize) -> f64 {
        self.counts[self.idx(expt, member, pos)]
    }

    pub fn get_strict(&self, expt: usize, member: usize, pos: usize) -> f64 {
        self.strict_counts[self.idx(expt, member, pos)]
    }

    /// Sum of all weight added for one experimental ID.
    pub fn total(&self, expt: usize) -> f64 {
        let len = self.num_members * self.width;
        self.counts[expt * len..(expt + 1) * len].iter().sum()
    }

    pub fn num_ids(&self) -> usize {
        self.num_ids
    }

    pub fn num_members(&self) -> usize {
        self.num_members
    }

    pub fn max_len(&self) -> usize {
        self.width - 1
    }

    /// One row per library member, one ` %11.3f` column per position.
    pub fn write_matrix<W: Write>(&self, writer: &mut W, expt: usize, strict: bool) -> std::io::Result<()> {
        let data = if strict {
            &self.strict_counts
        } else {
            &self.counts
        };

        for member in 0..self.num_members {
            let start = self.idx(expt, member, 0);
            for v in &data[start..start + self.width] {
                write!(writer, " {v:11.3}")?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    /// Write `stats_ID<k>.txt` and `strict_stats_ID<k>.txt` for every experimental ID, `k` starting at 1.
    pub fn write_stats(&self, dir: impl AsRef<Path>, gzip: bool) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| Error::FileIo {
            file: dir.display().to_string(),
            source: Box::new(e),
        })?;

        let mut paths = Vec::with_capacity(self.num_ids * 2);
        println!();

        for (prefix, strict) in [("stats", false), ("strict_stats", true)] {
            for expt in 0..self.num_ids {
                let mut name = format!("{prefix}_ID{}.txt", expt + 1);
                if gzip {
                    name.push_str(".gz");
                }
                let path = dir.join(name);
                println!("{} {}", "Outputting counts to:".bold(), path.display());

                self.write_file(&path, expt, strict, gzip)
                    .map_err(|e| Error::FileIo {
                        file: path.display().to_string(),
                        source: Box::new(e),
                    })?;
                paths.push(path);
            }
        }

        Ok(paths)
    }

    fn write_file(&self, path: &Path, expt: usize, strict: bool, gzip: bool) -> std::io::Result<()> {
        let file = File::create(path)?;

        if gzip {
            let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
            self.write_matrix(&mut writer, expt, strict)?;
            writer.into_inner().map_err(|e| e.into_error())?.finish()?;
        } else {
            let mut writer = BufWriter::new(file);
            self.write_matrix(&mut writer, expt, strict)?;
            writer.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_strict() {
        let mut m = CountMatrix::new(2, 3, 4);
        m.add(1, 2, 4, 0.5, false);
        m.add(1, 2, 4, 0.5, true);
        m.add(0, 0, 0, 1.0, true);

        assert_eq!(m.get(1, 2, 4), 1.0);
        assert_eq!(m.get_strict(1, 2, 4), 0.5);
        assert_eq!(m.get(0, 0, 0), 1.0);
        assert_eq!(m.get(0, 2, 4), 0.0);
        assert_eq!(m.total(0), 1.0);
        assert_eq!(m.total(1), 1.0);
        assert_eq!(m.max_len(), 4);
    }

    #[test]
    fn matrix_format() {
        let mut m = CountMatrix::new(1, 2, 2);
        m.add(0, 1, 2, 1.0 / 3.0, false);
        m.add(0, 0, 0, 12.0, false);

        let mut out = Vec::new();
        m.write_matrix(&mut out, 0, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "      12.000       0.000       0.000\n       0.000       0.000       0.333\n"
        );

        let mut out = Vec::new();
        m.write_matrix(&mut out, 0, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().matches("0.000").count(), 6);
    }

    #[test]
    fn counters_follow_stage_order() {
        let mut c = PurificationCounters::new();
        c.record(Stage::Total);
        c.record(Stage::Total);
        c.record(Stage::PrimerSite);

        let counts = c.iter().map(|(_, n)| n).collect::<Vec<_>>();
        assert_eq!(counts, vec![2, 1, 0, 0, 0, 0]);
        assert_eq!(c.iter().next().unwrap().0.label(), "total");
    }

    #[test]
    fn gzip_output() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let mut m = CountMatrix::new(2, 1, 1);
        m.add(1, 0, 1, 2.0, true);

        let paths = m.write_stats(dir.path(), true).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths[1].ends_with("stats_ID2.txt.gz"));
        assert!(paths[3].ends_with("strict_stats_ID2.txt.gz"));

        let mut content = String::new();
        GzDecoder::new(File::open(&paths[3]).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "       0.000       2.000\n");
    }
}
