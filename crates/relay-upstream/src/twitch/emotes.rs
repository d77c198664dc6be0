//! Emote tag normalization
//!
//! The `emotes` tag lists each emote id with every position it occupies:
//! `25:0-4,12-16/1902:6-10`. Positions are code-point offsets into the text.

use relay_core::Emote;

/// Build one [`Emote`] per id, named by the text at its first position
///
/// Entries with out-of-range or malformed positions are skipped.
pub fn parse_emotes(tag: &str, text: &str) -> Vec<Emote> {
    if tag.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();

    tag.split('/')
        .filter_map(|entry| {
            let (id, positions) = entry.split_once(':')?;
            let (start, end) = positions.split(',').next()?.split_once('-')?;
            let start: usize = start.parse().ok()?;
            let end: usize = end.parse().ok()?;

            if id.is_empty() || start > end || end >= chars.len() {
                return None;
            }

            Some(Emote {
                name: chars[start..=end].iter().collect(),
                id: id.to_string(),
            })
        })
        .collect()
}
