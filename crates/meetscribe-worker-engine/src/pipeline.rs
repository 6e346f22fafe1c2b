//! Deterministic stage sequence: convert -> transcribe(mic) ->
//! transcribe(tab) -> diarize -> merge -> save. Each step fires a
//! progress callback `(step, detail)` before it runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_sidecar::command::FfmpegCommand;
use meetscribe_types::{ResultSegment, Stats, TranscriptionError, TranscriptionMetadata, TranscriptionResult};
use tracing::warn;

use crate::diarize::{assign_speakers, Diarizer};
use crate::stt::{RawSegment, SpeechRecognizer};

const DEFAULT_FFMPEG_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_DIARIZATION_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_LOCAL_SPEAKER: &str = "local_speaker";
const DEFAULT_REMOTE_SPEAKER: &str = "remote_speaker";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub local_speaker_name: String,
    pub ffmpeg_timeout: Duration,
    pub diarization_timeout: Duration,
    pub device: String,
    pub model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            local_speaker_name: DEFAULT_LOCAL_SPEAKER.to_owned(),
            ffmpeg_timeout: DEFAULT_FFMPEG_TIMEOUT,
            diarization_timeout: DEFAULT_DIARIZATION_TIMEOUT,
            device: "cpu".to_owned(),
            model: "reference".to_owned(),
        }
    }
}

/// Invoked as `(step, detail)` after each stage transition.
pub type ProgressCallback = Arc<dyn Fn(&str, Option<&str>) + Send + Sync>;

pub struct WorkerPipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    diarizer: Arc<dyn Diarizer>,
    config: PipelineConfig,
}

struct LabeledSegment {
    speaker: String,
    text: String,
    start: f64,
    end: f64,
}

impl WorkerPipeline {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        diarizer: Arc<dyn Diarizer>,
        config: PipelineConfig,
    ) -> Self {
        Self { recognizer, diarizer, config }
    }

    pub async fn run(
        &self,
        job_dir: &Path,
        mic_path: Option<PathBuf>,
        tab_path: Option<PathBuf>,
        metadata: &TranscriptionMetadata,
        progress: ProgressCallback,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let local_speaker = metadata
            .local_speaker
            .clone()
            .unwrap_or_else(|| self.config.local_speaker_name.clone());
        let remote_speaker = metadata
            .remote_speaker
            .clone()
            .unwrap_or_else(|| DEFAULT_REMOTE_SPEAKER.to_owned());
        let mic_offset = metadata.mic_start_offset.unwrap_or(0.0);
        let tab_offset = metadata.tab_start_offset.unwrap_or(0.0);

        let mic_pcm = match &mic_path {
            Some(path) => {
                progress("converting_mic", None);
                Some(self.convert(path, job_dir, "mic").await?)
            }
            None => None,
        };
        let tab_pcm = match &tab_path {
            Some(path) => {
                progress("converting_tab", None);
                Some(self.convert(path, job_dir, "tab").await?)
            }
            None => None,
        };

        let mut mic_raw = Vec::new();
        if let Some(pcm) = &mic_pcm {
            progress("transcribing_mic", None);
            mic_raw = self.recognizer.transcribe(pcm).await?;
        }
        let mut tab_raw = Vec::new();
        if let Some(pcm) = &tab_pcm {
            progress("transcribing_tab", None);
            tab_raw = self.recognizer.transcribe(pcm).await?;
        }

        progress("diarizing", None);
        // Primary track: tab if present, else mic. Diarization turns are
        // derived from, and applied only to, the primary track's own
        // segments — the non-primary track (mic, when tab is present)
        // keeps its default speaker label rather than being relabeled
        // from a timeline it wasn't diarized against.
        let primary = tab_pcm.as_deref().or(mic_pcm.as_deref());
        let (mic_labels, tab_labels) = if let Some(primary_pcm) = primary {
            match tokio::time::timeout(
                self.config.diarization_timeout,
                self.diarizer.diarize(primary_pcm),
            )
            .await
            {
                Ok(Ok(turns)) => {
                    if tab_pcm.is_some() {
                        (Vec::new(), assign_speakers(&mut tab_raw, &turns))
                    } else {
                        (assign_speakers(&mut mic_raw, &turns), Vec::new())
                    }
                }
                Ok(Err(err)) => {
                    warn!(%err, "diarization unavailable, keeping default speaker labels");
                    (Vec::new(), Vec::new())
                }
                Err(_) => {
                    warn!("diarization timed out, keeping default speaker labels");
                    (Vec::new(), Vec::new())
                }
            }
        } else {
            (Vec::new(), Vec::new())
        };

        progress("merging", None);
        let mut merged: Vec<LabeledSegment> = Vec::with_capacity(mic_raw.len() + tab_raw.len());
        for (i, seg) in mic_raw.iter().enumerate() {
            let speaker = mic_labels.get(i).filter(|l| !l.is_empty()).cloned().unwrap_or_else(|| local_speaker.clone());
            merged.push(LabeledSegment {
                speaker,
                text: seg.text.clone(),
                start: seg.start + mic_offset,
                end: seg.end + mic_offset,
            });
        }
        for (i, seg) in tab_raw.iter().enumerate() {
            let speaker = tab_labels.get(i).filter(|l| !l.is_empty()).cloned().unwrap_or_else(|| remote_speaker.clone());
            merged.push(LabeledSegment {
                speaker,
                text: seg.text.clone(),
                start: seg.start + tab_offset,
                end: seg.end + tab_offset,
            });
        }
        merged.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

        progress("saving", None);
        let formatted = format_transcript(&merged);
        let segments: Vec<ResultSegment> = merged
            .iter()
            .map(|s| ResultSegment { speaker: s.speaker.clone(), text: s.text.clone(), start: s.start, end: s.end })
            .collect();
        let stats = Stats {
            total_segments: segments.len(),
            mic_segments: mic_raw.len(),
            tab_segments: tab_raw.len(),
            device: self.config.device.clone(),
            model: self.config.model.clone(),
        };

        let result = TranscriptionResult {
            success: true,
            segments: Some(segments),
            formatted: Some(formatted),
            stats: Some(stats),
            error: None,
            used_fallback: false,
        };

        let output_path = job_dir.join("output.json");
        match serde_json::to_value(&result) {
            Ok(mut artifact) => {
                if let serde_json::Value::Object(map) = &mut artifact {
                    map.insert(
                        "meeting".to_owned(),
                        serde_json::json!({
                            "title": metadata.title,
                            "date": metadata.date,
                            "duration": metadata.duration,
                            "platform": metadata.platform,
                            "url": metadata.url,
                        }),
                    );
                }
                match serde_json::to_string_pretty(&artifact) {
                    Ok(json) => {
                        if let Err(err) = tokio::fs::write(&output_path, json).await {
                            warn!(%err, path = %output_path.display(), "failed to write pipeline output file");
                        }
                    }
                    Err(err) => warn!(%err, "failed to serialize pipeline output file"),
                }
            }
            Err(err) => warn!(%err, "failed to serialize pipeline result"),
        }

        Ok(result)
    }

    async fn convert(&self, input: &Path, job_dir: &Path, label: &str) -> Result<PathBuf, TranscriptionError> {
        let output = job_dir.join(format!("{label}_16k_mono.wav"));
        let input = input.to_owned();
        let output_for_task = output.clone();

        let convert = tokio::task::spawn_blocking(move || run_ffmpeg(&input, &output_for_task));

        match tokio::time::timeout(self.config.ffmpeg_timeout, convert).await {
            Ok(Ok(Ok(()))) => Ok(output),
            Ok(Ok(Err(err))) => Err(TranscriptionError::AudioError(err)),
            Ok(Err(join_err)) => Err(TranscriptionError::AudioError(join_err.to_string())),
            Err(_) => Err(TranscriptionError::TranscriptionTimeout(format!("{label} conversion"))),
        }
    }
}

fn run_ffmpeg(input: &Path, output: &Path) -> Result<(), String> {
    let mut child = FfmpegCommand::new()
        .input(input.to_string_lossy())
        .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
        .output(output.to_string_lossy())
        .spawn()
        .map_err(|e| e.to_string())?;

    let status = child.wait().map_err(|e| e.to_string())?;
    if !status.success() {
        return Err(format!("ffmpeg exited with {status}"));
    }
    Ok(())
}

fn format_timestamp(seconds: f64) -> String {
    let total = seconds.floor().max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

fn format_transcript(segments: &[LabeledSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("[{}] {}: {}", format_timestamp(s.start), s.speaker, s.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_integer_floored() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(65.9), "00:01:05");
        assert_eq!(format_timestamp(3661.2), "01:01:01");
    }

    #[test]
    fn formatted_transcript_joins_with_newlines() {
        let segments = vec![
            LabeledSegment { speaker: "A".into(), text: "hi".into(), start: 0.0, end: 1.0 },
            LabeledSegment { speaker: "B".into(), text: "there".into(), start: 1.0, end: 2.0 },
        ];
        assert_eq!(
            format_transcript(&segments),
            "[00:00:00] A: hi\n[00:00:01] B: there"
        );
    }
}
