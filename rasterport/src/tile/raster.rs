//! Raster-layer records in DSFTool text output.
//!
//! In the text form of a DSF tile, raster layers are declared by lines
//! starting with `RASTER_` (`RASTER_DEF`, `RASTER_SCALE`, `RASTER_DATA`, ...).
//! X-Plane 12 tiles carry season, soundscape and elevation rasters that
//! Ortho4XP and AutoOrtho tiles lack; those are the lines spliced over.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Prefix of raster-layer records.
pub const RASTER_PREFIX: &str = "RASTER_";

/// Raster records containing one of these are spliced into the target tile.
///
/// Season rasters (`spr`, `sum`, `win`, `fal`), the soundscape raster and
/// the elevation raster. Everything else stays behind.
pub const SPLICE_KEYWORDS: &[&str] = &["spr", "sum", "win", "fal", "soundscape", "elevation"];

/// Whether a cached raster line belongs in the converted tile.
pub fn should_splice(line: &str) -> bool {
    SPLICE_KEYWORDS.iter().any(|keyword| line.contains(keyword))
}

/// Collect every raster-layer record from DSFTool text output.
///
/// Lines are returned without their line terminator. The rest of the text
/// need not be valid UTF-8.
pub fn extract_raster_lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let prefix = RASTER_PREFIX.as_bytes();
    let mut lines = Vec::new();

    for line in reader.split(b'\n') {
        let line = line?;
        if line.starts_with(prefix) {
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches('\r').to_string());
        }
    }

    Ok(lines)
}

/// Read raster lines from the text file produced for a reference tile.
pub fn extract_raster_file(path: &Path) -> io::Result<Vec<String>> {
    extract_raster_lines(BufReader::new(File::open(path)?))
}

/// Read a raster cache written by [`write_cache`].
pub fn read_cache(path: &Path) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    reader
        .lines()
        .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
        .collect()
}

/// Write a raster cache.
///
/// The lines go to `tmp` first and are renamed onto `path`, so an
/// interrupted write never leaves a truncated cache behind. `tmp` must be
/// on the same filesystem as `path`.
pub fn write_cache(path: &Path, tmp: &Path, lines: &[String]) -> io::Result<()> {
    {
        let mut writer = BufWriter::new(File::create(tmp)?);
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
    }

    fs::rename(tmp, path)
}

/// Append the allow-listed raster lines to a DSFTool text file.
///
/// Returns the number of lines appended.
pub fn splice_into(text_path: &Path, lines: &[String]) -> io::Result<usize> {
    let needs_newline = !ends_with_newline(text_path)?;
    let mut writer = BufWriter::new(OpenOptions::new().append(true).open(text_path)?);

    if needs_newline {
        writeln!(writer)?;
    }

    let mut count = 0;
    for line in lines.iter().filter(|l| should_splice(l)) {
        writeln!(writer, "{}", line)?;
        count += 1;
    }
    writer.flush()?;

    Ok(count)
}

/// True for empty files and files whose last byte is `\n`.
fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REFERENCE_TEXT: &str = "\
A\r
800\r
DSF2TEXT\r
PROPERTY sim/west 8\r
RASTER_DEF spr\r
RASTER_DEF soundscape\r
RASTER_DEF bathymetry\r
TERRAIN_DEF terrain/lib.ter\r
 RASTER_DEF indented\r
RASTER_DATA bpp=2 flags=1 width=1201 height=1201 scale=1.0 offset=0 +50+008.elevation.raw\r
";

    #[test]
    fn test_extract_keeps_only_raster_records() {
        let lines = extract_raster_lines(REFERENCE_TEXT.as_bytes()).unwrap();
        assert_eq!(
            lines,
            [
                "RASTER_DEF spr",
                "RASTER_DEF soundscape",
                "RASTER_DEF bathymetry",
                "RASTER_DATA bpp=2 flags=1 width=1201 height=1201 scale=1.0 offset=0 +50+008.elevation.raw",
            ]
        );
    }

    #[test]
    fn test_extract_tolerates_non_utf8() {
        let mut text = b"PROPERTY name \xff\xfe\n".to_vec();
        text.extend_from_slice(b"RASTER_DEF fal\n");
        let lines = extract_raster_lines(text.as_slice()).unwrap();
        assert_eq!(lines, ["RASTER_DEF fal"]);
    }

    #[test]
    fn test_should_splice_allow_list() {
        assert!(should_splice("RASTER_DEF spr"));
        assert!(should_splice("RASTER_DEF sum"));
        assert!(should_splice("RASTER_DEF win"));
        assert!(should_splice("RASTER_DEF fal"));
        assert!(should_splice("RASTER_DEF soundscape"));
        assert!(should_splice("RASTER_DEF elevation"));
        assert!(!should_splice("RASTER_DEF bathymetry"));
        assert!(!should_splice("RASTER_DEF terrain_type"));
    }

    #[test]
    fn test_cache_write_then_read() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("+50+008.rdata");
        let tmp = temp.path().join("+50+008.pack.rdata.tmp");
        let lines = vec!["RASTER_DEF spr".to_string(), "RASTER_DEF sum".to_string()];

        write_cache(&cache, &tmp, &lines).unwrap();

        assert_eq!(read_cache(&cache).unwrap(), lines);
        assert!(!tmp.exists());
    }

    #[test]
    fn test_splice_appends_only_allowed_lines() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("+50+008.txt-o4xp");
        fs::write(&text, "A\n800\nDSF2TEXT\n").unwrap();

        let lines: Vec<String> = [
            "RASTER_DEF spr",
            "RASTER_DEF bathymetry",
            "RASTER_DEF elevation",
            "RASTER_DEF terrain_type",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let count = splice_into(&text, &lines).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(&text).unwrap(),
            "A\n800\nDSF2TEXT\nRASTER_DEF spr\nRASTER_DEF elevation\n"
        );
    }

    #[test]
    fn test_splice_starts_on_fresh_line() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("tile.txt");
        fs::write(&text, "DSF2TEXT").unwrap();

        splice_into(&text, &["RASTER_DEF win".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(&text).unwrap(), "DSF2TEXT\nRASTER_DEF win\n");
    }

    #[test]
    fn test_splice_into_empty_file() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("tile.txt");
        fs::write(&text, "").unwrap();

        splice_into(&text, &["RASTER_DEF win".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(&text).unwrap(), "RASTER_DEF win\n");
    }
}
