//! HTML markup for every view model, plus a renderer that keeps the markup
//! attached to each mount point.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use crate::types::{Racer, Track};
use crate::view::{LeaderboardRow, Mount, Renderer, ViewModel};

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_markup(view: &ViewModel) -> String {
    match view {
        ViewModel::Tracks { tracks } => track_cards(tracks),
        ViewModel::Racers { racers } => racer_cards(racers),
        ViewModel::RaceStart {
            track_name,
            countdown,
        } => race_start(track_name, *countdown),
        ViewModel::Countdown { remaining } => remaining.to_string(),
        ViewModel::Leaderboard { rows } => leaderboard(rows),
        ViewModel::Results { rows } => format!(
            "<header><h1>Race Results</h1></header>\n<main>\n{}\n<a href=\"/race\">Start a new race</a>\n</main>",
            leaderboard(rows)
        ),
        ViewModel::Failure { kind, message } => format!(
            "<header><h1>Race stopped</h1></header>\n<main>\n<p class=\"error\" data-kind=\"{kind}\">{}</p>\n<a href=\"/race\">Start a new race</a>\n</main>",
            escape(message)
        ),
    }
}

fn track_cards(tracks: &[Track]) -> String {
    if tracks.is_empty() {
        return "<h4>Loading Tracks...</h4>".to_string();
    }
    let mut out = String::from("<ul id=\"tracks\">\n");
    for t in tracks {
        let _ = writeln!(
            out,
            "<li id=\"{}\" class=\"card track\"><h3>{}</h3><img src=\"assets/images/{}.png\"/></li>",
            t.id,
            escape(&t.name),
            escape(&t.image_ref)
        );
    }
    out.push_str("</ul>");
    out
}

fn racer_cards(racers: &[Racer]) -> String {
    if racers.is_empty() {
        return "<h4>Loading Racers...</h4>".to_string();
    }
    let mut out = String::from("<ul id=\"racers\">\n");
    for r in racers {
        let _ = writeln!(
            out,
            "<li class=\"card podracer\" id=\"{}\"><img src=\"assets/images/{}.webp\"/><h3>{}</h3>\
             <p>Max speed: {}</p><p>Acceleration: {}</p><p>Handling: {}</p></li>",
            r.id,
            escape(&r.image_ref),
            escape(&r.display_name),
            r.top_speed,
            r.acceleration,
            r.handling
        );
    }
    out.push_str("</ul>");
    out
}

fn countdown(count: u32) -> String {
    format!("<h2>Race Starts In...</h2>\n<p id=\"big-numbers\">{count}</p>")
}

fn race_start(track_name: &str, count: u32) -> String {
    format!(
        "<header><h1>Race: {}</h1></header>\n\
         <main id=\"two-columns\">\n\
         <section id=\"leaderBoard\">\n{}\n</section>\n\
         <section id=\"accelerate\"><h2>Directions</h2>\
         <p>Click the button as fast as you can to make your racer go faster!</p>\
         <button id=\"gas-peddle\">Click Me To Win!</button></section>\n\
         </main>",
        escape(track_name),
        countdown(count)
    )
}

fn leaderboard(rows: &[LeaderboardRow]) -> String {
    let mut out = String::from("<main>\n<h3>Leaderboard</h3>\n<section id=\"leaderBoard\">\n");
    for row in rows {
        let _ = writeln!(
            out,
            "<tr><td><h3>{} - {}</h3></td></tr>",
            row.rank,
            escape(&row.label)
        );
    }
    out.push_str("</section>\n</main>");
    out
}

// ---------------------------------------------------------------------------
// HtmlRenderer
// ---------------------------------------------------------------------------

/// Keeps the latest markup per mount point, the way assigning `innerHTML`
/// would. Rendering into `#race` replaces the whole race section, so the
/// nested leaderboard and countdown mounts are cleared with it.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    page: Mutex<BTreeMap<Mount, String>>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markup_at(&self, mount: Mount) -> Option<String> {
        self.page
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mount)
            .cloned()
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, view: &ViewModel) {
        let mount = view.mount();
        let markup = render_markup(view);
        let mut page = self.page.lock().unwrap_or_else(PoisonError::into_inner);
        if mount == Mount::Race {
            page.remove(&Mount::LeaderBoard);
            page.remove(&Mount::Countdown);
        }
        page.insert(mount, markup);
    }
}
