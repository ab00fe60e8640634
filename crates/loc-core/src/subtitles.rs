//! SRT/VTT subtitle rendering shared by the `asr` and `subs` stage workers.

use serde::{Deserialize, Serialize};

/// One transcribed or translated line with its on-screen time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Format a timestamp in seconds as `HH:MM:SS<sep>mmm`. `sep` is `,` for
/// SRT and `.` for VTT — the two formats are identical otherwise.
fn format_ts(seconds: f64, sep: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as i64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    let s = total_s % 60;
    let total_m = total_s / 60;
    let m = total_m % 60;
    let h = total_m / 60;
    format!("{h:02}:{m:02}:{s:02}{sep}{ms:03}")
}

/// Render `segments` as an SRT transcript.
pub fn to_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_ts(seg.start, ','),
            format_ts(seg.end, ',')
        ));
        out.push_str(&seg.text);
        out.push_str("\n\n");
    }
    out
}

/// Render `segments` as a WebVTT transcript.
pub fn to_vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for seg in segments {
        out.push_str(&format!(
            "{} --> {}\n",
            format_ts(seg.start, '.'),
            format_ts(seg.end, '.')
        ));
        out.push_str(&seg.text);
        out.push_str("\n\n");
    }
    out
}

/// Parse a timestamp of the form `HH:MM:SS<sep>mmm` back to seconds.
fn parse_ts(s: &str, sep: char) -> Option<f64> {
    let (hms, ms) = s.split_once(sep)?;
    let mut parts = hms.split(':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let s: i64 = parts.next()?.parse().ok()?;
    let ms: i64 = ms.parse().ok()?;
    Some((h * 3600 + m * 60 + s) as f64 + ms as f64 / 1000.0)
}

/// Parse an SRT transcript back into [`Segment`]s — the inverse of
/// [`to_srt`]. Blocks are separated by a blank line; the leading numeric
/// index is ignored. Malformed blocks are skipped rather than failing the
/// whole parse, since a worker re-reading its own just-written artifact
/// should never fail on trailing whitespace.
pub fn parse_srt(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for block in input.split("\n\n") {
        let mut lines = block.trim().lines();
        let Some(first) = lines.next() else { continue };
        // Skip the index line unless this block omitted it (starts with a timestamp).
        let timing_line = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) => line,
                None => continue,
            }
        };
        let Some((start_str, end_str)) = timing_line.split_once(" --> ") else {
            continue;
        };
        let (Some(start), Some(end)) = (parse_ts(start_str.trim(), ','), parse_ts(end_str.trim(), ','))
        else {
            continue;
        };
        let text = lines.collect::<Vec<_>>().join("\n");
        segments.push(Segment { start, end, text });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Segment> {
        vec![
            Segment {
                start: 0.0,
                end: 1.5,
                text: "hello".into(),
            },
            Segment {
                start: 61.25,
                end: 3661.0,
                text: "world".into(),
            },
        ]
    }

    #[test]
    fn srt_uses_comma_separator_and_one_based_index() {
        let srt = to_srt(&sample());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,500\nhello\n\n"));
        assert!(srt.contains("2\n00:01:01,250 --> 01:01:01,000\nworld\n\n"));
    }

    #[test]
    fn vtt_uses_dot_separator_and_header() {
        let vtt = to_vtt(&sample());
        assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nhello\n\n"));
    }

    #[test]
    fn format_ts_handles_hour_rollover() {
        assert_eq!(format_ts(3661.0, ','), "01:01:01,000");
    }

    #[test]
    fn srt_round_trips_through_parse() {
        let original = sample();
        let srt = to_srt(&original);
        let parsed = parse_srt(&srt);
        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(parsed.iter()) {
            assert!((a.start - b.start).abs() < 0.001);
            assert!((a.end - b.end).abs() < 0.001);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn parse_srt_ignores_trailing_blank_lines() {
        let srt = "1\n00:00:00,000 --> 00:00:01,000\nhi\n\n\n";
        let parsed = parse_srt(srt);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "hi");
    }
}
