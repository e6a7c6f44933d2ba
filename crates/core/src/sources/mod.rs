//! Discovery of the processes that are currently producing audio.
//!
//! On macOS every process that plays sound holds a power assertion with an
//! `audio-out` resource. `pmset -g assertions` lists them; each PID is then
//! resolved to a display name with `ps`.

use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const AUDIO_OUT_MARKER: &str = "Resources: audio-out";

static PID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Created for PID: (\d+)").expect("PID pattern is valid"));

/// A running process currently asserting audio output. Rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub pid: u32,
    pub name: String,
}

impl AudioSource {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }

    /// Last path component of the name, used for the status table.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Anything able to list the processes that hold an audio assertion.
///
/// Implementations fail soft: an unavailable backend yields an empty list and
/// a process that vanished before it could be named is left out.
pub trait AudioSourceEnumerator {
    fn list_active_audio_sources(&self) -> Vec<AudioSource>;
}

/// Enumerator backed by `pmset` and `ps`.
#[derive(Debug, Clone)]
pub struct PmsetEnumerator {
    pmset: String,
    ps: String,
}

impl Default for PmsetEnumerator {
    fn default() -> Self {
        Self::with_programs("pmset", "ps")
    }
}

impl PmsetEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given executables in place of `pmset` and `ps`.
    pub fn with_programs(pmset: impl Into<String>, ps: impl Into<String>) -> Self {
        Self {
            pmset: pmset.into(),
            ps: ps.into(),
        }
    }

    fn audio_pids(&self) -> Vec<u32> {
        let output = match Command::new(&self.pmset).args(["-g", "assertions"]).output() {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(error = %err, "pmset unavailable, assuming no audio sources");
                return Vec::new();
            }
        };

        if !output.status.success() {
            tracing::warn!(status = ?output.status.code(), "pmset reported a failure");
            return Vec::new();
        }

        parse_audio_pids(&String::from_utf8_lossy(&output.stdout))
    }

    fn resolve_name(&self, pid: u32) -> Option<String> {
        let output = match Command::new(&self.ps)
            .args(["-p", &pid.to_string(), "-o", "comm="])
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(pid, error = %err, "could not run ps, dropping source");
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!(pid, "process exited before it could be named");
            return None;
        }

        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(title_case(&name))
        }
    }

    /// Names each PID, leaving out those that cannot be resolved.
    fn resolve_all(&self, pids: Vec<u32>) -> Vec<AudioSource> {
        pids.into_iter()
            .filter_map(|pid| self.resolve_name(pid).map(|name| AudioSource::new(pid, name)))
            .collect()
    }
}

impl AudioSourceEnumerator for PmsetEnumerator {
    fn list_active_audio_sources(&self) -> Vec<AudioSource> {
        self.resolve_all(self.audio_pids())
    }
}

/// Extracts the PIDs of audio-out assertions from `pmset -g assertions` output.
///
/// The resource line follows the line naming the owning PID, so a marker on
/// the very first line has no owner and is skipped.
pub fn parse_audio_pids(assertions: &str) -> Vec<u32> {
    let lines: Vec<&str> = assertions.lines().collect();
    lines
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| line.contains(AUDIO_OUT_MARKER))
        .filter_map(|(index, _)| {
            PID_PATTERN
                .captures(lines[index - 1])
                .and_then(|caps| caps[1].parse().ok())
        })
        .collect()
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the
/// rest, so `/applications/SPOTIFY.app` becomes `/Applications/Spotify.App`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Assertion status system-wide:
   PreventUserIdleSystemSleep     1
Listed by owning process:
   pid 412(coreaudiod): [0x0001] 00:10:02 PreventUserIdleSystemSleep named: \"com.apple.audio.context.preventuseridlesleep\"
\tCreated for PID: 901.
\tResources: audio-out BuiltInSpeakerDevice
   pid 412(coreaudiod): [0x0002] 00:00:12 PreventUserIdleSystemSleep named: \"com.apple.audio.context.preventuseridlesleep\"
\tCreated for PID: 1337.
\tResources: audio-out BuiltInSpeakerDevice
   pid 77(powerd): [0x0003] 01:00:00 PreventSystemSleep named: \"com.apple.powermanagement\"
\tCreated for PID: 55.
\tResources: network
";

    #[test]
    fn extracts_audio_out_pids_in_order() {
        assert_eq!(parse_audio_pids(SAMPLE), vec![901, 1337]);
    }

    #[test]
    fn ignores_markers_without_owner_line() {
        let text = "\tResources: audio-out\nsomething else\n\tResources: audio-out";
        assert!(parse_audio_pids(text).is_empty());
    }

    #[test]
    fn empty_output_yields_no_pids() {
        assert!(parse_audio_pids("").is_empty());
    }

    #[test]
    fn title_cases_each_alphabetic_run() {
        assert_eq!(
            title_case("/applications/google chrome.app/contents/google chrome helper"),
            "/Applications/Google Chrome.App/Contents/Google Chrome Helper"
        );
        assert_eq!(title_case("VLC"), "Vlc");
        assert_eq!(title_case("mp3player"), "Mp3Player");
    }

    #[test]
    fn missing_pmset_yields_no_sources() {
        let enumerator = PmsetEnumerator::with_programs("autopause-no-such-pmset", "ps");
        assert!(enumerator.list_active_audio_sources().is_empty());
    }

    #[test]
    fn failing_pmset_yields_no_sources() {
        let enumerator = PmsetEnumerator::with_programs("false", "ps");
        assert!(enumerator.list_active_audio_sources().is_empty());
    }

    #[test]
    fn vanished_pid_is_dropped_without_losing_others() {
        let enumerator = PmsetEnumerator::new();
        let own_pid = std::process::id();
        assert_eq!(enumerator.resolve_name(2_000_000_000), None);

        let sources = enumerator.resolve_all(vec![2_000_000_000, own_pid]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].pid, own_pid);
        assert!(!sources[0].name.is_empty());
    }

    #[test]
    fn missing_ps_drops_every_pid() {
        let enumerator = PmsetEnumerator::with_programs("pmset", "autopause-no-such-ps");
        assert!(enumerator.resolve_all(vec![std::process::id()]).is_empty());
    }

    #[test]
    fn short_name_strips_directories() {
        let source = AudioSource::new(1, "/Applications/Vlc.App/Contents/Macos/Vlc");
        assert_eq!(source.short_name(), "Vlc");
        assert_eq!(AudioSource::new(2, "Zoom").short_name(), "Zoom");
    }
}
