//! Result Sink — output path resolution and CSV writing
//!
//! The configured output may name a file or a directory. A trailing path
//! separator or an existing directory means "put an auto-named file in
//! here": the name is synthesized from the coder, modem, and channel
//! selectors as `<coder>_<modem>_<channel>.csv` with each token slugged
//! (lowercased, non-alphanumeric characters replaced by underscores).
//! A literal file path gets its parent directories created.
//!
//! Records are fixed-format CSV with six fractional digits on floats:
//!
//! ```text
//! snr_db,ber,num_bits,num_errors,ci_low,ci_high
//! 4.000000,0.012414,161792,2009,0.000000,0.000000
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::BerResult;

/// Filesystem-safe token: lowercase, non-alphanumerics become `_`.
fn slug(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolve the configured output location to a concrete file path,
/// creating any needed directories.
pub fn resolve_output_path(
    outfile: &str,
    coder: &str,
    modem: &str,
    channel: &str,
) -> io::Result<PathBuf> {
    let ends_with_sep = outfile.ends_with('/') || outfile.ends_with('\\');
    let path = Path::new(outfile);

    if ends_with_sep || path.is_dir() {
        fs::create_dir_all(path)?;
        let name = format!("{}_{}_{}.csv", slug(coder), slug(modem), slug(channel));
        return Ok(path.join(name));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(path.to_path_buf())
}

/// Buffered CSV writer for per-SNR-point records.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    /// Create (truncating) the output file and write the header.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "snr_db,ber,num_bits,num_errors,ci_low,ci_high")?;
        Ok(Self { writer })
    }

    /// Append one record.
    pub fn write_record(&mut self, snr_db: f64, result: &BerResult) -> io::Result<()> {
        writeln!(
            self.writer,
            "{:.6},{:.6},{},{},{:.6},{:.6}",
            snr_db, result.ber, result.bits, result.errs, result.ci_lo, result.ci_hi
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
