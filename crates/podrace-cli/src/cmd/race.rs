use crate::cmd::reference::{fetch_racers, fetch_tracks};
use crate::cmd::{runtime, Context};
use crate::output::{print_json, print_table};
use crate::render::TerminalRenderer;
use anyhow::Context as _;
use podrace_client::{HttpRaceService, RaceOrchestrator};
use podrace_core::config::WarnLevel;
use podrace_core::store::{SharedStore, Store, StorePatch};
use podrace_core::types::{RaceOutcome, RacerId, Selection, TrackId};
use podrace_core::view::{self, ViewModel};
use podrace_core::RaceError;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub fn run(ctx: &Context, track: Option<TrackId>, racer: Option<RacerId>) -> anyhow::Result<()> {
    let selection = Selection {
        track_id: track,
        player_id: racer,
    };
    if selection.resolve().is_none() {
        return Err(RaceError::InvalidSelection).context("pass --track and --racer");
    }

    let config = ctx.load_config()?;
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message)
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("invalid config: {}", errors.join("; "));
    }
    let service = Arc::new(ctx.service(&config)?);
    let rt = runtime()?;

    rt.block_on(async {
        let mut store = Store::default();
        store.update(StorePatch::tracks(fetch_tracks(&config, service.as_ref()).await));
        store.update(StorePatch::racers(fetch_racers(&config, service.as_ref()).await));
        let store = SharedStore::new(store);

        let orchestrator = RaceOrchestrator::new(
            service,
            store.clone(),
            Arc::new(TerminalRenderer::new(ctx.json)),
            config.timing.clone(),
        )?;
        let outcome = drive(&orchestrator, selection).await.context("race did not finish")?;

        if ctx.json {
            return print_json(&outcome);
        }
        print_results(&outcome, &store);
        Ok(())
    })
}

/// Run the race while forwarding Enter presses as accelerate and Ctrl-C as
/// cancel.
async fn drive(
    orchestrator: &RaceOrchestrator<HttpRaceService>,
    selection: Selection,
) -> podrace_core::Result<RaceOutcome> {
    let race = orchestrator.start_race(selection);
    tokio::pin!(race);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            outcome = &mut race => return outcome,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => {
                    let _ = orchestrator.accelerate();
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed, accelerate disabled");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                orchestrator.cancel_race();
            }
        }
    }
}

fn print_results(outcome: &RaceOutcome, store: &SharedStore) {
    let results = store.read(|s| view::results(&outcome.positions, s));
    let ViewModel::Results { rows } = results else {
        return;
    };
    println!("Race Results");
    let rows = rows
        .iter()
        .map(|r| {
            vec![
                r.final_position
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".into()),
                r.label.clone(),
                r.segment.to_string(),
            ]
        })
        .collect();
    print_table(&["POS", "RACER", "SEGMENT"], rows);
    if let Some(place) = outcome.player_position() {
        println!("You finished #{place}.");
    }
}
