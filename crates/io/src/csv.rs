// CSV table import and reconciliation row export

use std::io::{Read, Write};
use std::path::Path;

use ledgerpair_recon::{OutputRow, RawTable, OUTPUT_COLUMNS};

use crate::error::IoError;

/// Read a delimited file as a raw table named `name`. The first record is the header row.
pub fn read_csv_table(path: &Path, name: &str) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    log::debug!(
        "reading {} as table '{name}' (delimiter {:?})",
        path.display(),
        delimiter as char
    );
    Ok(RawTable::from_csv_str_with_delimiter(name, &content, delimiter)?)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();

        let Some(&target) = counts.first() else {
            break;
        };
        if target <= 1 {
            continue;
        }

        // Lines agreeing with the header, weighted by width
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read a file as UTF-8, falling back to Windows-1252 (Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let file_err = |source| IoError::File {
        path: path.to_path_buf(),
        source,
    };
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(file_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

/// Write the 17-column header followed by every row.
pub fn write_rows<W: Write>(
    rows: &[OutputRow],
    minor_unit_digits: u32,
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        writer.write_record(row.to_record(minor_unit_digits))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv(rows: &[OutputRow], minor_unit_digits: u32, path: &Path) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    write_rows(rows, minor_unit_digits, std::io::BufWriter::new(file)).map_err(|source| {
        IoError::Csv {
            path: path.to_path_buf(),
            source,
        }
    })
}
