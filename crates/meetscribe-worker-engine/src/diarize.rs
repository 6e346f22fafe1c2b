//! Speaker diarization is out of scope for this crate's own logic
//! (spec.md §1), modeled as a trait so a real model (e.g. `pyannote`
//! via an HTTP call, or a native binding) plugs in directly.
//! [`NullDiarizer`] reports "unavailable", matching the "keep default
//! labels and log a warning, not fatal" contract when no diarizer is
//! configured.

use std::path::Path;

use meetscribe_types::TranscriptionError;

/// One diarization turn: a contiguous interval attributed to one
/// speaker label, independent of the words spoken.
#[derive(Debug, Clone)]
pub struct Turn {
    pub start: f64,
    pub end: f64,
    pub label: String,
}

#[async_trait::async_trait]
pub trait Diarizer: Send + Sync {
    /// `Ok(turns)` on success; `Err` means diarization failed or is
    /// unavailable — callers keep the default speaker labels and log a
    /// warning rather than failing the job.
    async fn diarize(&self, pcm_path: &Path) -> Result<Vec<Turn>, TranscriptionError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiarizer;

#[async_trait::async_trait]
impl Diarizer for NullDiarizer {
    async fn diarize(&self, _pcm_path: &Path) -> Result<Vec<Turn>, TranscriptionError> {
        Err(TranscriptionError::ModelError("diarization not configured".to_owned()))
    }
}

/// Normalizes a `SPEAKER_NN`-shaped diarization label to `Speaker
/// {n+1}`. Any label that doesn't parse as `SPEAKER_<digits>` is
/// passed through unchanged, matching the original's
/// catch-`ValueError`-and-fall-back-to-raw-label behavior.
pub fn friendly_label(raw: &str) -> String {
    match raw.strip_prefix("SPEAKER_").and_then(|n| n.parse::<u32>().ok()) {
        Some(n) => format!("Speaker {}", n + 1),
        None => raw.to_owned(),
    }
}

/// Assigns a speaker label to each STT segment by the diarization turn
/// with maximum temporal overlap. Ties go to the first turn
/// encountered. Segments with no overlapping turn keep their existing
/// label.
pub fn assign_speakers(
    segments: &mut [crate::stt::RawSegment],
    turns: &[Turn],
) -> Vec<String> {
    let mut labels = Vec::with_capacity(segments.len());
    for segment in segments.iter() {
        let mut best: Option<(&Turn, f64)> = None;
        for turn in turns {
            let overlap = overlap_duration(segment.start, segment.end, turn.start, turn.end);
            if overlap <= 0.0 {
                continue;
            }
            match &best {
                Some((_, best_overlap)) if overlap <= *best_overlap => {}
                _ => best = Some((turn, overlap)),
            }
        }
        labels.push(match best {
            Some((turn, _)) => friendly_label(&turn.label),
            None => String::new(),
        });
    }
    labels
}

fn overlap_duration(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::RawSegment;

    #[test]
    fn friendly_label_normalizes_speaker_nn() {
        assert_eq!(friendly_label("SPEAKER_00"), "Speaker 1");
        assert_eq!(friendly_label("SPEAKER_03"), "Speaker 4");
    }

    #[test]
    fn friendly_label_passes_through_unparseable_labels() {
        assert_eq!(friendly_label("host"), "host");
        assert_eq!(friendly_label("SPEAKER_x"), "SPEAKER_x");
    }

    #[test]
    fn assign_speakers_picks_maximum_overlap_turn() {
        let mut segments = vec![RawSegment { start: 0.0, end: 2.0, text: "hi".into() }];
        let turns = vec![
            Turn { start: 0.0, end: 0.5, label: "SPEAKER_00".into() },
            Turn { start: 0.5, end: 2.0, label: "SPEAKER_01".into() },
        ];
        let labels = assign_speakers(&mut segments, &turns);
        assert_eq!(labels[0], "Speaker 2");
    }

    #[test]
    fn ties_go_to_first_turn_encountered() {
        let mut segments = vec![RawSegment { start: 0.0, end: 2.0, text: "hi".into() }];
        let turns = vec![
            Turn { start: 0.0, end: 1.0, label: "SPEAKER_00".into() },
            Turn { start: 1.0, end: 2.0, label: "SPEAKER_01".into() },
        ];
        let labels = assign_speakers(&mut segments, &turns);
        assert_eq!(labels[0], "Speaker 1");
    }
}
