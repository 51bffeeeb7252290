//! Best-effort call-site capture for measured invocations

use std::backtrace::{Backtrace, BacktraceStatus};

use serde::{Deserialize, Serialize};

/// Module path prefix of this crate's own frames
const CRATE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// Where a measured invocation came from
///
/// `file` and `line` point at the first frame outside this crate when the
/// backtrace could be parsed; `frames` always carries the raw rendered stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Source file of the caller, when resolvable
    pub file: Option<String>,
    /// Line number within `file`, when resolvable
    pub line: Option<u32>,
    /// Raw captured stack frames
    pub frames: Vec<String>,
}

impl CallSite {
    /// Capture the current call stack
    ///
    /// Returns `None` when no usable stack is available. Parsing is
    /// best-effort: a failed parse yields a record without `file`/`line`,
    /// and a capture never disturbs the surrounding measurement.
    pub fn capture() -> Option<CallSite> {
        let backtrace = Backtrace::force_capture();
        if !matches!(backtrace.status(), BacktraceStatus::Captured) {
            return None;
        }

        let frames: Vec<String> = backtrace
            .to_string()
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();
        if frames.is_empty() {
            return None;
        }

        let location = parse_location(&frames);
        Some(CallSite {
            file: location.as_ref().map(|(file, _)| file.clone()),
            line: location.map(|(_, line)| line),
            frames,
        })
    }
}

/// Find the source location of the first frame that is not ours
fn parse_location(frames: &[String]) -> Option<(String, u32)> {
    let mut external_symbol = false;
    for frame in frames {
        let trimmed = frame.trim_start();
        if let Some(rest) = trimmed.strip_prefix("at ") {
            if external_symbol {
                if let Some(parsed) = parse_file_line(rest) {
                    return Some(parsed);
                }
            }
        } else if let Some((_, symbol)) = trimmed.split_once(": ") {
            external_symbol = !is_internal(symbol);
        }
    }
    None
}

fn is_internal(symbol: &str) -> bool {
    symbol.contains(CRATE_PREFIX) || symbol.contains("backtrace::")
}

/// Parse `path/to/file.rs:line:column`
fn parse_file_line(rest: &str) -> Option<(String, u32)> {
    let mut parts = rest.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse::<u32>().ok()?;
    let file = parts.next()?;
    if file.is_empty() {
        return None;
    }
    Some((file.to_string(), line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_yields_frames() {
        let site = CallSite::capture().expect("backtraces are available in tests");
        assert!(!site.frames.is_empty());
    }

    #[test]
    fn test_parse_file_line() {
        assert_eq!(
            parse_file_line("src/main.rs:42:9"),
            Some(("src/main.rs".to_string(), 42))
        );
        assert_eq!(parse_file_line("no line info"), None);
        assert_eq!(parse_file_line(""), None);
    }

    #[test]
    fn test_parse_location_skips_internal_frames() {
        let frames = vec![
            format!("   0: {}callsite::CallSite::capture", CRATE_PREFIX),
            "             at src/callsite.rs:30:9".to_string(),
            "   1: app::load_config".to_string(),
            "             at src/app.rs:12:5".to_string(),
        ];
        assert_eq!(
            parse_location(&frames),
            Some(("src/app.rs".to_string(), 12))
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let site = CallSite {
            file: Some("src/app.rs".to_string()),
            line: Some(12),
            frames: vec!["0: app::load_config".to_string()],
        };
        let json = serde_json::to_string(&site).unwrap();
        let back: CallSite = serde_json::from_str(&json).unwrap();
        assert_eq!(back, site);
    }
}
