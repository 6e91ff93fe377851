//! Transcript file naming and writing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;

use chatlog_render::Transcript;
use chatlog_shared::constants::TIME_FORMAT;

const UNSAFE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters that are not allowed in file names.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// `YYYY_M_D` for a transcript time, or `unknown` when it does not parse.
fn file_date(time: Option<&str>) -> String {
    time.and_then(|t| NaiveDateTime::parse_from_str(t, TIME_FORMAT).ok())
        .map(|t| t.format("%Y_%-m_%-d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `<self>_<counterpart><start>_<end>.json`
pub fn transcript_file_name(self_name: &str, counterpart: &str, transcript: &Transcript) -> String {
    format!(
        "{}_{}{}_{}.json",
        sanitize_name(self_name),
        sanitize_name(counterpart),
        file_date(transcript.first_time()),
        file_date(transcript.last_time()),
    )
}

/// Write `transcript` as a pretty-printed single-element JSON array.
pub fn write_transcript(dir: &Path, file_name: &str, transcript: &Transcript) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let json = serde_json::to_string_pretty(std::slice::from_ref(transcript))?;
    let path = dir.join(file_name);
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
