use crate::cmd::{runtime, Context};
use crate::output::{print_json, print_table};
use podrace_client::RaceService;
use podrace_core::config::ClientConfig;
use podrace_core::markup::render_markup;
use podrace_core::reference::{load_racers, load_tracks, or_empty};
use podrace_core::types::{Racer, Track};
use podrace_core::view::ViewModel;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Tracks from `reference.tracks_path`, or from the service when unset.
/// Failures degrade to an empty list.
pub async fn fetch_tracks<S: RaceService>(config: &ClientConfig, service: &S) -> Vec<Track> {
    match &config.reference.tracks_path {
        Some(path) => or_empty("tracks", load_tracks(path)),
        None => or_empty("tracks", service.list_tracks().await),
    }
}

pub async fn fetch_racers<S: RaceService>(config: &ClientConfig, service: &S) -> Vec<Racer> {
    match &config.reference.racers_path {
        Some(path) => or_empty("racers", load_racers(path)),
        None => or_empty("racers", service.list_racers().await),
    }
}

// ---------------------------------------------------------------------------
// tracks / racers
// ---------------------------------------------------------------------------

pub fn tracks(ctx: &Context, html: bool) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let service = ctx.service(&config)?;
    let rt = runtime()?;
    let tracks = rt.block_on(fetch_tracks(&config, &service));

    if html {
        println!("{}", render_markup(&ViewModel::Tracks { tracks }));
        return Ok(());
    }
    if ctx.json {
        return print_json(&tracks);
    }
    if tracks.is_empty() {
        println!("No tracks available.");
        return Ok(());
    }
    let rows = tracks
        .iter()
        .map(|t| vec![t.id.to_string(), t.name.clone()])
        .collect();
    print_table(&["ID", "NAME"], rows);
    Ok(())
}

pub fn racers(ctx: &Context, html: bool) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let service = ctx.service(&config)?;
    let rt = runtime()?;
    let racers = rt.block_on(fetch_racers(&config, &service));

    if html {
        println!("{}", render_markup(&ViewModel::Racers { racers }));
        return Ok(());
    }
    if ctx.json {
        return print_json(&racers);
    }
    if racers.is_empty() {
        println!("No racers available.");
        return Ok(());
    }
    let rows = racers
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.display_name.clone(),
                r.top_speed.to_string(),
                r.acceleration.to_string(),
                r.handling.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "DRIVER", "TOP SPEED", "ACCEL", "HANDLING"], rows);
    Ok(())
}
