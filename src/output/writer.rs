use super::record::ensure_parent_dir;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use url::Url;

/// Writes the visited URLs, one per line, replacing any previous file
pub fn write_visited_urls<'a>(
    path: &Path,
    urls: impl IntoIterator<Item = &'a Url>,
) -> io::Result<usize> {
    ensure_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);

    let mut count = 0;
    for url in urls {
        writeln!(writer, "{}", url)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
