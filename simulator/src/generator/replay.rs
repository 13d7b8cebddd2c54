use anyhow::Context;
use std::fs;
use std::path::Path;

/// Splits a recorded CSV file into batches of `batch_len` rows.
///
/// With `has_headers`, the header line is repeated at the top of every batch
/// so each batch stays a self-contained CSV document.
pub fn load_batches<P: AsRef<Path>>(
    path: P,
    batch_len: usize,
    has_headers: bool,
) -> anyhow::Result<Vec<String>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading telemetry {}", path_ref.display()))?;
    Ok(split_batches(&contents, batch_len, has_headers))
}

pub fn split_batches(contents: &str, batch_len: usize, has_headers: bool) -> Vec<String> {
    let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
    let header = if has_headers { lines.next() } else { None };
    let rows: Vec<&str> = lines.collect();

    rows.chunks(batch_len.max(1))
        .map(|chunk| {
            let mut batch = String::new();
            if let Some(header) = header {
                batch.push_str(header);
                batch.push('\n');
            }
            for row in chunk {
                batch.push_str(row);
                batch.push('\n');
            }
            batch
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn split_repeats_header_per_batch() {
        let contents = "ts,heading,speed\na\nb\n\nc\n";
        let batches = split_batches(contents, 2, true);
        assert_eq!(batches, vec!["ts,heading,speed\na\nb\n", "ts,heading,speed\nc\n"]);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"2024-03-01 08:00:00,90,40\n2024-03-01 08:00:01,91,40\n")
            .unwrap();
        let batches = load_batches(temp.path(), 10, false).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].lines().count(), 2);
    }
}
