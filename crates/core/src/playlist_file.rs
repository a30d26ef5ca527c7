//! Parsing of uploaded playlist files (one URL per line, m3u style).

/// A non-comment line of an uploaded playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistLine<'a> {
    /// 1-based position among the non-comment lines.
    pub index: usize,
    /// The trimmed line content.
    pub url: &'a str,
}

/// Split an uploaded playlist body into numbered URL lines.
///
/// Blank lines and lines starting with `#` (including `#EXTM3U` headers and
/// `#EXTINF` entries) are skipped and do not consume an index.
pub fn parse_lines(body: &str) -> Vec<PlaylistLine<'_>> {
    body.lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(i, url)| PlaylistLine { index: i + 1, url })
        .collect()
}
