//! bitBond terminal client
//!
//! Resolves the session, then walks the discovery feed one card at a time.
//!
//! Usage: bitbond [--config <path>]
//!
//! Commands: like, pass, drag <dx>, refresh, inbox, quit

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use bitbond::discovery::Point;
use bitbond::{AppContext, AuthState, Config, FeedView, SubmissionStatus, Verdict};

enum Command {
    Like,
    Pass,
    Drag(f32),
    Refresh,
    Inbox,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "like" | "l" => Command::Like,
        "pass" | "p" => Command::Pass,
        "drag" | "d" => Command::Drag(words.next()?.parse().ok()?),
        "refresh" | "r" => Command::Refresh,
        "inbox" | "i" => Command::Inbox,
        "quit" | "q" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn config_path_from_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => match args.next() {
            Some(path) => Ok(Some(PathBuf::from(path))),
            None => bail!("--config needs a path"),
        },
        Some(other) => bail!("Unknown argument: {}\nUsage: bitbond [--config <path>]", other),
    }
}

fn show(view: FeedView<'_>) {
    match view {
        FeedView::CheckingSession | FeedView::Loading => println!("Loading..."),
        FeedView::SignedOut => println!("Not signed in. Set BITBOND_SESSION_COOKIE and restart."),
        FeedView::Exhausted => println!("No more profiles. Type 'refresh' to look again."),
        FeedView::Card {
            candidate,
            pose,
            remaining,
        } => {
            println!();
            println!("  {}  ({} left)", candidate.display_name(), remaining);
            let summary = candidate.summary();
            if !summary.is_empty() {
                println!("  {}", summary);
            }
            if let Some(about) = candidate.profile.about.as_deref().filter(|a| !a.is_empty()) {
                println!("  {}", about);
            }
            if pose.offset.dx != 0.0 {
                println!("  [card at dx={:.0}, {:.1} deg]", pose.offset.dx, pose.rotation_deg);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    bitbond::init_logging();

    let config = match config_path_from_args()? {
        Some(path) => Config::load_from(Some(&path), |var| std::env::var(var).ok()),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let ctx = AppContext::http(config).context("Failed to set up the API client")?;

    if let AuthState::Anonymous = ctx.resolve_session().await {
        show(FeedView::SignedOut);
        return Ok(());
    }

    let badge = ctx.notifications();
    let (mut engine, submitter) = ctx.discovery_engine();
    let mut outcomes = submitter.subscribe();

    if let Err(e) = engine.when_ready().await {
        println!("Could not load the feed: {}", e);
    }
    show(engine.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_command(&line) else {
                    println!("Commands: like, pass, drag <dx>, refresh, inbox, quit");
                    continue;
                };
                match command {
                    Command::Like => {
                        engine.tap(Verdict::Interested);
                    }
                    Command::Pass => {
                        engine.tap(Verdict::Ignored);
                    }
                    Command::Drag(dx) => {
                        engine.pointer_down(Point::new(0.0, 0.0));
                        engine.pointer_move(Point::new(dx, 0.0));
                        if engine.pointer_up().is_none() {
                            println!("  (not far enough, card snaps back)");
                        }
                    }
                    Command::Refresh => {
                        if let Err(e) = engine.refill().await {
                            println!("Refresh failed: {}", e);
                        }
                    }
                    Command::Inbox => {
                        match badge.unread() {
                            Some(n) => println!("{} unread notifications", n),
                            None => println!("Notifications not loaded yet"),
                        }
                        badge.refresh();
                        continue;
                    }
                    Command::Quit => break,
                }
                show(engine.view());
            }
            outcome = outcomes.recv() => match outcome {
                Ok(decision) if decision.status == SubmissionStatus::Failed => {
                    println!("  ! Could not send '{}' for {}", decision.verdict, decision.candidate_id);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => log::debug!("Missed {} submission outcomes", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    if submitter.pending() > 0 {
        log::info!("Exiting with {} submissions still in flight", submitter.pending());
    }
    Ok(())
}
