//! Human-facing activity log. Has no influence on pause/resume decisions.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of rows kept before the oldest is evicted.
pub const STATUS_CAPACITY: usize = 8;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADERS: [&str; 3] = ["Timestamp", "Player", "Other Audio"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub timestamp: String,
    pub player: String,
    pub other_audio: String,
}

impl StatusRow {
    fn cells(&self) -> [&str; 3] {
        [&self.timestamp, &self.player, &self.other_audio].map(String::as_str)
    }
}

/// Fixed-capacity ring of status rows that only grows on change.
#[derive(Debug, Clone)]
pub struct StatusRecorder {
    rows: VecDeque<StatusRow>,
    capacity: usize,
    last_player: String,
    last_other_audio: String,
}

impl Default for StatusRecorder {
    fn default() -> Self {
        Self::with_capacity(STATUS_CAPACITY)
    }
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            last_player: String::new(),
            last_other_audio: String::new(),
        }
    }

    /// Appends a row when either label changed since the last appended row or
    /// an action is given; the action gets a row of its own. Returns whether
    /// anything was appended.
    pub fn record(
        &mut self,
        timestamp: NaiveDateTime,
        player: &str,
        other_audio: &str,
        action: Option<&str>,
    ) -> bool {
        let changed = player != self.last_player || other_audio != self.last_other_audio;
        if !changed && action.is_none() {
            return false;
        }

        let timestamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        self.push(StatusRow {
            timestamp: timestamp.clone(),
            player: player.to_string(),
            other_audio: other_audio.to_string(),
        });
        if let Some(action) = action {
            self.push(StatusRow {
                timestamp,
                player: action.to_string(),
                other_audio: String::new(),
            });
        }

        self.last_player = player.to_string();
        self.last_other_audio = other_audio.to_string();
        true
    }

    pub fn rows(&self) -> impl Iterator<Item = &StatusRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the rows as a bordered grid with centered cells.
    pub fn render_table(&self) -> String {
        let mut widths = HEADERS.map(|header| header.chars().count());
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&rule(&widths, '-'));
        out.push_str(&line(&widths, HEADERS));
        out.push_str(&rule(&widths, '='));
        for row in &self.rows {
            out.push_str(&line(&widths, row.cells()));
            out.push_str(&rule(&widths, '-'));
        }
        out
    }

    fn push(&mut self, row: StatusRow) {
        while self.rows.len() >= self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back(row);
    }
}

fn rule(widths: &[usize; 3], fill: char) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.extend(std::iter::repeat(fill).take(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line(widths: &[usize; 3], cells: [&str; 3]) -> String {
    let mut out = String::from("|");
    for (width, cell) in widths.iter().zip(cells) {
        let pad = width - cell.chars().count();
        let left = pad / 2;
        out.push(' ');
        out.extend(std::iter::repeat(' ').take(left));
        out.push_str(cell);
        out.extend(std::iter::repeat(' ').take(pad - left));
        out.push(' ');
        out.push('|');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, second)
            .unwrap()
    }

    #[test]
    fn skips_unchanged_labels() {
        let mut recorder = StatusRecorder::new();
        assert!(recorder.record(at(0), "Playing", "No Other Audio", None));
        assert!(!recorder.record(at(2), "Playing", "No Other Audio", None));
        assert!(recorder.record(at(4), "Paused", "No Other Audio", None));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn action_adds_second_row_even_without_change() {
        let mut recorder = StatusRecorder::new();
        recorder.record(at(0), "Playing", "Chrome", None);
        assert!(recorder.record(at(2), "Playing", "Chrome", Some("Pausing Spotify")));

        let rows: Vec<_> = recorder.rows().cloned().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].player, "Pausing Spotify");
        assert_eq!(rows[2].other_audio, "");
        assert_eq!(rows[2].timestamp, "2024-05-01 12:00:02");
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest() {
        let mut recorder = StatusRecorder::new();
        for i in 0..20 {
            recorder.record(at(i), "Playing", &format!("Source {i}"), None);
            assert!(recorder.len() <= STATUS_CAPACITY);
        }

        let others: Vec<_> = recorder.rows().map(|row| row.other_audio.clone()).collect();
        assert_eq!(others.len(), STATUS_CAPACITY);
        assert_eq!(others.first().map(String::as_str), Some("Source 12"));
        assert_eq!(others.last().map(String::as_str), Some("Source 19"));
    }

    #[test]
    fn action_pair_respects_capacity() {
        let mut recorder = StatusRecorder::with_capacity(2);
        recorder.record(at(0), "Playing", "No Other Audio", None);
        recorder.record(at(1), "Playing", "Zoom", Some("Pausing Spotify"));

        let players: Vec<_> = recorder.rows().map(|row| row.player.as_str()).collect();
        assert_eq!(players, vec!["Playing", "Pausing Spotify"]);
    }

    #[test]
    fn renders_grid_table() {
        let mut recorder = StatusRecorder::new();
        recorder.record(at(0), "Playing", "Vlc", None);

        let expected = "\
+---------------------+---------+-------------+
|      Timestamp      | Player  | Other Audio |
+=====================+=========+=============+
| 2024-05-01 12:00:00 | Playing |     Vlc     |
+---------------------+---------+-------------+
";
        assert_eq!(recorder.render_table(), expected);
    }

    #[test]
    fn empty_table_has_header_only() {
        let table = StatusRecorder::new().render_table();
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("Other Audio"));
    }
}
