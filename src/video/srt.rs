//! Subtitle track validation and canonical SRT serialization
//!
//! Model output is treated as untrusted: wrapper artifacts are stripped, the
//! remaining text is parsed cue by cue, and the result is always written back
//! in one canonical form (indices 1..N, `HH:MM:SS,mmm` timecodes, one blank
//! line between cues). Parsing either yields a whole track or an error.

use std::fmt;
use std::time::Duration;

use super::error::ValidationError;

const TIMECODE_MARKER: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// A validated subtitle track. Only [`validate`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    cues: Vec<Cue>,
}

impl SubtitleTrack {
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cue in &self.cues {
            write!(
                f,
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_timecode(cue.start),
                format_timecode(cue.end),
                cue.text
            )?;
        }
        Ok(())
    }
}

/// Parse, check and renumber a subtitle track.
pub fn validate(raw: &str) -> Result<SubtitleTrack, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let cleaned = strip_wrappers(raw);
    if !cleaned.contains(TIMECODE_MARKER) {
        return Err(ValidationError::NoTimecodeMarker);
    }

    let mut cues = parse_cues(&cleaned).map_err(ValidationError::Parse)?;

    // Captions with no text would render as empty boxes
    cues.retain(|cue| !cue.text.is_empty());
    if cues.is_empty() {
        return Err(ValidationError::Parse(
            "track contains no captions with text".to_string(),
        ));
    }

    cues.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    for (position, cue) in cues.iter_mut().enumerate() {
        cue.index = position + 1;
    }

    Ok(SubtitleTrack { cues })
}

/// Remove the chat framing models wrap around a track.
fn strip_wrappers(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    let body = trimmed.strip_prefix("PATCH:").unwrap_or(trimmed);

    body.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_cues(input: &str) -> Result<Vec<Cue>, String> {
    let mut cues = Vec::new();
    let mut lines = input.lines().enumerate().peekable();

    while let Some((line_no, line)) = lines.next() {
        let first = line.trim();
        if first.is_empty() {
            continue;
        }

        // The index line may be missing; a block can start with its timing line
        let (index, timing) = if first.contains(TIMECODE_MARKER) {
            (None, first.to_string())
        } else {
            let index = first.parse::<usize>().map_err(|_| {
                format!(
                    "line {}: expected a cue number or timing line, found '{}'",
                    line_no + 1,
                    first
                )
            })?;
            let (timing_no, timing) = lines
                .next()
                .ok_or_else(|| format!("cue {} is missing its timing line", index))?;
            let timing = timing.trim();
            if !timing.contains(TIMECODE_MARKER) {
                return Err(format!(
                    "line {}: cue {} timing line must contain '-->', found '{}'",
                    timing_no + 1,
                    index,
                    timing
                ));
            }
            (Some(index), timing.to_string())
        };

        let (start, end) = parse_timing_line(&timing)
            .map_err(|e| format!("line {}: {}", line_no + 1, e))?;

        let mut text_lines = Vec::new();
        while let Some((_, next)) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            if let Some((_, text)) = lines.next() {
                text_lines.push(text.trim().to_string());
            }
        }

        cues.push(Cue {
            index: index.unwrap_or(cues.len() + 1),
            start,
            end,
            text: text_lines.join("\n"),
        });
    }

    Ok(cues)
}

fn parse_timing_line(line: &str) -> Result<(Duration, Duration), String> {
    let (start_raw, end_raw) = line
        .split_once(TIMECODE_MARKER)
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| "timing line must contain '-->'".to_string())?;

    // Anything after the end timecode is positioning metadata
    let end_raw = end_raw.split_whitespace().next().unwrap_or_default();

    let start = parse_timecode(start_raw)
        .map_err(|e| format!("invalid start timecode '{}': {}", start_raw, e))?;
    let end =
        parse_timecode(end_raw).map_err(|e| format!("invalid end timecode '{}': {}", end_raw, e))?;

    if end <= start {
        return Err(format!(
            "cue must end after it starts: {} --> {}",
            start_raw, end_raw
        ));
    }

    Ok((start, end))
}

/// Parse `HH:MM:SS,mmm`, also accepting `.` before the fraction, a missing
/// fraction, and the short `MM:SS,mmm` form models sometimes emit.
fn parse_timecode(value: &str) -> Result<Duration, String> {
    if value.is_empty() {
        return Err("empty timecode".to_string());
    }

    let cleaned = value.replace(',', ".");
    let (time_part, fractional_part) = match cleaned.split_once('.') {
        Some((time, fraction)) => (time, fraction),
        None => (cleaned.as_str(), "0"),
    };

    let fields = time_part
        .split(':')
        .map(|field| {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
                Err(format!("'{}' is not a number", field))
            } else {
                field.parse::<u64>().map_err(|e| e.to_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err("expected HH:MM:SS,mmm".to_string()),
    };

    if minutes >= 60 && fields.len() == 3 {
        return Err(format!("minutes out of range ({})", minutes));
    }
    if seconds >= 60 {
        return Err(format!("seconds out of range ({})", seconds));
    }

    if fractional_part.is_empty() || !fractional_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid milliseconds '{}'", fractional_part));
    }
    let mut millis_str: String = fractional_part.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis = millis_str.parse::<u64>().map_err(|e| e.to_string())?;

    let total_seconds = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| "timecode out of range".to_string())?;
    Duration::from_secs(total_seconds)
        .checked_add(Duration::from_millis(millis))
        .ok_or_else(|| "timecode out of range".to_string())
}

pub fn format_timecode(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis / 60_000) % 60;
    let seconds = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "1\n00:00:01,000 --> 00:00:03,500\nHello world!\n\n2\n00:00:04,000 --> 00:00:05,000\n<i>(Spanish) Good morning.</i>\n\n";

    #[test]
    fn parse_basic_srt() {
        let track = validate(CANONICAL).expect("valid track");
        assert_eq!(track.len(), 2);
        assert_eq!(track.cues()[0].text, "Hello world!");
        assert_eq!(track.cues()[1].start.as_millis(), 4000);
    }

    #[test]
    fn canonical_output_is_a_fixed_point() {
        let messy = "```srt\n3\n0:0:1.5 --> 0:0:2.25\n  Hi there  \n\n\n7\n00:00:03,000 --> 00:00:04,000 X1:10 X2:20\nSecond\nline\n```";
        let once = validate(messy).expect("repairable").to_string();
        let twice = validate(&once).expect("still valid").to_string();
        assert_eq!(once, twice);
        assert_eq!(
            once,
            "1\n00:00:01,500 --> 00:00:02,250\nHi there\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond\nline\n\n"
        );
        assert_eq!(validate(CANONICAL).expect("valid").to_string(), CANONICAL);
    }

    #[test]
    fn patch_prefix_and_missing_index_are_repaired() {
        let track = validate("PATCH:\n00:00:01,000 --> 00:00:02,000\nHi\n").expect("valid");
        assert_eq!(track.len(), 1);
        assert_eq!(track.cues()[0].index, 1);
        assert_eq!(track.cues()[0].start, Duration::from_secs(1));
        assert_eq!(track.cues()[0].end, Duration::from_secs(2));
    }

    #[test]
    fn short_timecodes_are_accepted() {
        let track = validate("1\n01:02,500 --> 01:04,000\nShort form\n").expect("valid");
        assert_eq!(track.cues()[0].start, Duration::from_millis(62_500));
        assert!(track.to_string().contains("00:01:02,500 --> 00:01:04,000"));
    }

    #[test]
    fn cues_are_sorted_and_renumbered() {
        let input = "5\n00:00:10,000 --> 00:00:11,000\nLater\n\n9\n00:00:01,000 --> 00:00:02,000\nEarlier\n";
        let track = validate(input).expect("valid");
        let texts: Vec<_> = track.cues().iter().map(|c| (c.index, c.text.as_str())).collect();
        assert_eq!(texts, vec![(1, "Earlier"), (2, "Later")]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(validate(""), Err(ValidationError::EmptyInput));
        assert_eq!(validate("  \n\t"), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn prose_without_marker_is_not_a_parse_error() {
        for prose in [
            "Sorry, I cannot watch this video.",
            "Error: something went wrong",
            "1\n00:00:01,000 00:00:02,000\nNo arrow",
            "PATCH:",
            "```\n```",
        ] {
            assert_eq!(validate(prose), Err(ValidationError::NoTimecodeMarker), "{prose}");
        }
    }

    #[test]
    fn malformed_tracks_are_parse_errors() {
        let cases = [
            "1\n00:00:0x,000 --> 00:00:02,000\nBad digits\n",
            "1\n00:00:03,000 --> 00:00:02,000\nBackwards\n",
            "1\n00:00:02,000 --> 00:00:02,000\nZero length\n",
            "1\n00:00:01,000 --> 00:00:02,000\nFine\n\nstray prose here\n",
            "1\n00:00:01,000 --> \nNo end\n",
            "1\n00:00:01,000 --> 00:00:02,000\n",
            "1\n00:61:01,000 --> 00:62:02,000\nMinutes\n",
        ];
        for case in cases {
            match validate(case) {
                Err(ValidationError::Parse(_)) => {}
                other => panic!("expected parse error for {case:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn huge_timecode_fields_are_parse_errors() {
        for case in [
            "1\n9999999999999999999:00:00,000 --> 9999999999999999999:00:01,000\nX\n",
            "1\n999999999999999999:00,000 --> 999999999999999999:01,000\nX\n",
        ] {
            match validate(case) {
                Err(ValidationError::Parse(msg)) => assert!(msg.contains("out of range"), "{msg}"),
                other => panic!("expected parse error for {case:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn every_repaired_track_is_a_fixed_point() {
        let repairable = [
            CANONICAL,
            "```srt\n3\n0:0:1.5 --> 0:0:2.25\n  Hi there  \n\n\n7\n00:00:03,000 --> 00:00:04,000 X1:10 X2:20\nSecond\nline\n```",
            "PATCH:\n00:00:01,000 --> 00:00:02,000\nHi\n",
            "1\n01:02,500 --> 01:04,000\nShort form\n",
            "5\n00:00:10,000 --> 00:00:11,000\nLater\n\n9\n00:00:01,000 --> 00:00:02,000\nEarlier\n",
            "\u{feff}1\n00:00:01.5 --> 00:00:02\nA\n\n2\n00:00:03,000 --> 00:00:04,000\n\n3\n00:00:05,000 --> 00:00:06,000\nB\n",
            "1\n75:00,000 --> 75:01,000\nLong minutes\n",
        ];
        for raw in repairable {
            let once = validate(raw).expect("repairable").to_string();
            let twice = validate(&once).expect("canonical output validates").to_string();
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn format_timecode_pads_fields() {
        assert_eq!(format_timecode(Duration::from_millis(3_723_004)), "01:02:03,004");
        assert_eq!(format_timecode(Duration::ZERO), "00:00:00,000");
    }
}
