use std::time::Duration;

pub const WORDS_PER_CUE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// 1-based, sequential.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Partition narration text into timed caption chunks.
///
/// Words are grouped five per cue in original order; each word gets an equal
/// share of the total duration, so the last cue ends at `duration_seconds`
/// (up to float rounding). Zero words produce zero cues.
pub fn build_cues(text: &str, duration_seconds: f64) -> Vec<SubtitleCue> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || duration_seconds <= 0.0 {
        return Vec::new();
    }

    let per_word = duration_seconds / words.len() as f64;
    let mut cues = Vec::with_capacity(words.len().div_ceil(WORDS_PER_CUE));
    let mut elapsed = 0.0_f64;

    for (i, chunk) in words.chunks(WORDS_PER_CUE).enumerate() {
        let start = elapsed;
        elapsed += chunk.len() as f64 * per_word;
        cues.push(SubtitleCue {
            index: i + 1,
            start: Duration::from_secs_f64(start),
            end: Duration::from_secs_f64(elapsed),
            text: chunk.join(" "),
        });
    }

    cues
}

/// Serialize cues to SRT (`HH:MM:SS,mmm` timestamps, blank line between cues).
pub fn to_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        ));
    }
    out
}

fn format_timestamp(d: Duration) -> String {
    let total_ms = d.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
