use podrace_core::view::{LeaderboardRow, Renderer, ViewModel};

/// Writes race progress to stderr so stdout stays free for the result.
///
/// Results are not rendered here; the `race` command prints them once the
/// race returns.
pub struct TerminalRenderer {
    quiet: bool,
}

impl TerminalRenderer {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

/// `1. Racer 5 (30)  2. Racer 7 (you) (25)`
pub fn leaderboard_line(rows: &[LeaderboardRow]) -> String {
    rows.iter()
        .map(|r| format!("{}. {} ({})", r.rank, r.label, r.segment))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn describe(view: &ViewModel) -> Option<String> {
    match view {
        ViewModel::RaceStart {
            track_name,
            countdown,
        } => Some(format!("Race starting on {track_name}... {countdown}")),
        ViewModel::Countdown { remaining } => Some(format!("{remaining}...")),
        ViewModel::Leaderboard { rows } => Some(leaderboard_line(rows)),
        ViewModel::Failure { kind, message } => Some(format!("race failed ({kind}): {message}")),
        ViewModel::Tracks { .. } | ViewModel::Racers { .. } | ViewModel::Results { .. } => None,
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, view: &ViewModel) {
        if self.quiet {
            return;
        }
        if let Some(line) = describe(view) {
            eprintln!("{line}");
        }
    }
}
