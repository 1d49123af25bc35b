//! Plain-text I/Q buffer dump, used for offline plotting and debugging.
//!
//! Mirrors the source's two-column real/imaginary dump convention: writes
//! `{prefix}_re.txt` and `{prefix}_im.txt`, one sample per line. Plotting
//! itself is out of scope; these files are meant to be consumed by whatever
//! external tool the operator prefers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use num_complex::Complex32;

pub fn dump_iq(path_prefix: &Path, samples: &[Complex32]) -> io::Result<()> {
    let re_path = with_suffix(path_prefix, "_re.txt");
    let im_path = with_suffix(path_prefix, "_im.txt");

    let mut re_writer = BufWriter::new(File::create(re_path)?);
    let mut im_writer = BufWriter::new(File::create(im_path)?);
    for sample in samples {
        writeln!(re_writer, "{}", sample.re)?;
        writeln!(im_writer, "{}", sample.im)?;
    }
    Ok(())
}

fn with_suffix(prefix: &Path, suffix: &str) -> std::path::PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(suffix);
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn dump_writes_matching_line_counts() {
        let dir = std::env::temp_dir().join(format!("ranging-persist-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prefix = dir.join("burst");
        let samples = vec![
            Complex32::new(1.0, 2.0),
            Complex32::new(-0.5, 0.25),
        ];
        dump_iq(&prefix, &samples).unwrap();

        let re_lines: Vec<String> = io::BufReader::new(File::open(with_suffix(&prefix, "_re.txt")).unwrap())
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        let im_lines: Vec<String> = io::BufReader::new(File::open(with_suffix(&prefix, "_im.txt")).unwrap())
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(re_lines.len(), 2);
        assert_eq!(im_lines.len(), 2);
        assert_eq!(re_lines[0], "1");
        assert_eq!(im_lines[1], "0.25");

        std::fs::remove_dir_all(&dir).ok();
    }
}
