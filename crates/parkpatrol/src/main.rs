//! `parkpatrol` - CLI for parkpatrol
//!
//! This binary sends patrol alerts from the command line and manages the
//! local alert history and profile.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info, warn};

use parkpatrol::cli::{
    AlertCommand, AlertTarget, Cli, Command, ConfigCommand, HistoryCommand, OutputFormat,
    ProfileCommand, WatchCommand,
};
use parkpatrol::{
    build_geocoder, init_logging, Config, LocationSource, MapSession, Profile, ReplayLocationSource,
    Report, ReportFeed, ReportStore, SessionSettings, StoreChange,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    debug!(database = %config.database_path().display(), "Configuration loaded");

    match cli.command {
        Command::Alert(cmd) => handle_alert(&config, &cmd).await,
        Command::History(cmd) => handle_history(&config, &cmd),
        Command::Delete(cmd) => handle_delete(&config, &cmd.ids),
        Command::Clear(cmd) => handle_clear(&config, cmd.yes),
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Profile(cmd) => handle_profile(&config, cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Arc<ReportStore>> {
    let path = config.database_path();
    let store = ReportStore::open(&path)
        .with_context(|| format!("failed to open report store at {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn handle_alert(config: &Config, cmd: &AlertCommand) -> anyhow::Result<()> {
    let Some(target) = cmd.target() else {
        bail!("give a latitude and longitude, or --screen X Y");
    };

    let store = open_store(config)?;
    let geocoder = build_geocoder(&config.geocoder)?;
    let mut session = MapSession::new(
        Arc::clone(&store),
        geocoder,
        SessionSettings::from_config(config),
    );

    let replay = start_location_replay(config, &session);

    let placed = match target {
        AlertTarget::Coordinate(coordinate) => {
            session.tap_coordinate(coordinate)?;
            true
        }
        AlertTarget::Screen(point) => session.tap(point).is_some(),
    };
    if !placed {
        bail!("that point is outside the map view");
    }
    info!(pin = %session.coordinates_text(), "Pin placed");

    let report = session.submit().await?;
    if let Some(source) = replay {
        source.stop();
    }

    let Some(report) = report else {
        bail!("no pin to send");
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(banner) = session.banner() {
            println!("{banner}");
        }
        print_report(&report);
    }
    Ok(())
}

/// Feed configured replay positions into the session, if any.
fn start_location_replay(
    config: &Config,
    session: &MapSession,
) -> Option<Arc<ReplayLocationSource>> {
    if !config.location.enabled || config.location.replay.is_empty() {
        return None;
    }

    let source = Arc::new(ReplayLocationSource::new(
        config.location.replay.clone(),
        config.replay_interval(),
    ));
    let runner = Arc::clone(&source);
    let tx = session.location_sender();
    tokio::spawn(async move {
        if let Err(e) = runner.start(tx).await {
            warn!(error = %e, "Location replay failed");
        }
    });
    Some(source)
}

fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut reports = match cmd.limit {
        Some(limit) => store.recent(limit)?,
        None => store.list()?,
    };
    if !cmd.all {
        reports.retain(Report::has_position);
    }

    print_reports(&reports, cmd.format)
}

fn handle_delete(config: &Config, ids: &[i64]) -> anyhow::Result<()> {
    let store = open_store(config)?;

    if let [id] = ids {
        if store.delete(*id)? {
            println!("Deleted report {id}.");
        } else {
            println!("No report with id {id}.");
        }
        return Ok(());
    }

    let deleted = store.delete_many(ids)?;
    println!("Deleted {deleted} of {} reports.", ids.len());
    Ok(())
}

fn handle_clear(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!("This will delete every report in your history.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let store = open_store(config)?;
    let removed = store.clear()?;
    println!("Cleared {removed} reports.");
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut feed = ReportFeed::new(store)?.with_poll_interval(cmd.poll_interval());

    print_reports(&visible(feed.reports(), cmd.limit), cmd.format)?;

    loop {
        tokio::select! {
            change = feed.changed() => {
                match change? {
                    Some(StoreChange::Created(report)) => {
                        info!(id = report.id, "New report");
                    }
                    Some(StoreChange::Deleted(ids)) => {
                        info!(count = ids.len(), "Reports deleted");
                    }
                    Some(StoreChange::Cleared(count)) => {
                        info!(count, "History cleared");
                    }
                    None => {
                        info!("Reports changed");
                    }
                }
                print_reports(&visible(feed.reports(), cmd.limit), cmd.format)?;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping watch");
                return Ok(());
            }
        }
    }
}

fn visible(reports: &[Report], limit: usize) -> Vec<Report> {
    reports
        .iter()
        .filter(|report| report.has_position())
        .take(limit)
        .cloned()
        .collect()
}

fn handle_profile(config: &Config, cmd: ProfileCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    match cmd {
        ProfileCommand::Show { json } => {
            let profile = Profile::load(&store)?;
            print_profile(&profile, json)?;
        }
        ProfileCommand::Set { field, value } => {
            let mut profile = Profile::load(&store)?;
            profile.set(field.into(), value);
            profile.save(&store)?;
            print_profile(&profile, false)?;
        }
        ProfileCommand::Reset { yes } => {
            if !yes {
                println!("This will log out and restore the default profile.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let profile = Profile::reset(&store)?;
            println!("Logged out.");
            print_profile(&profile, false)?;
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
    } else {
        println!("Name:      {}", profile.full_name());
        println!("Username:  {}", profile.username);
        println!("Email:     {}", profile.email);
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "total_reports": stats.total_reports,
            "oldest_report": stats.oldest_report,
            "newest_report": stats.newest_report,
            "db_size_bytes": stats.db_size_bytes,
            "geocoder": config.geocoder.provider,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("parkpatrol status");
        println!("-----------------");
        println!("Database:      {}", store.path().display());
        println!("Reports:       {}", stats.total_reports);
        if let Some(oldest) = stats.oldest_report {
            println!("Oldest:        {}", oldest.format("%Y-%m-%d %H:%M:%S"));
        }
        if let Some(newest) = stats.newest_report {
            println!("Newest:        {}", newest.format("%Y-%m-%d %H:%M:%S"));
        }
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Geocoder:      {:?}", config.geocoder.provider);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Map]");
                println!(
                    "  Center:             {}, {}",
                    config.map.center_latitude, config.map.center_longitude
                );
                println!(
                    "  Span:               {} x {}",
                    config.map.span_latitude, config.map.span_longitude
                );
                println!("  Confirmation (ms):  {}", config.map.confirmation_ms);
                println!();
                println!("[Geocoder]");
                println!("  Provider:           {:?}", config.geocoder.provider);
                println!("  Endpoint:           {}", config.geocoder.endpoint);
                println!("  Timeout (ms):       {}", config.geocoder.timeout_ms);
                println!("  Gazetteer places:   {}", config.geocoder.places.len());
                println!();
                println!("[Location]");
                println!("  Enabled:            {}", config.location.enabled);
                println!("  Replay points:      {}", config.location.replay.len());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("#{}  {}", report.id, report.display_location());
    println!("    {}", report.coordinate());
    println!(
        "    {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn print_reports(reports: &[Report], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
        OutputFormat::Plain => {
            if reports.is_empty() {
                println!("No alerts sent yet.");
            }
            for report in reports {
                print_report(report);
            }
        }
        OutputFormat::Table => {
            if reports.is_empty() {
                println!("No alerts sent yet.");
                return Ok(());
            }
            let mut out = std::io::stdout().lock();
            writeln!(
                out,
                "{:>6}  {:<20}  {:<24}  {}",
                "ID", "SENT (UTC)", "COORDINATES", "LOCATION"
            )?;
            for report in reports {
                writeln!(
                    out,
                    "{:>6}  {:<20}  {:<24}  {}",
                    report.id,
                    report.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    report.coordinate().to_string(),
                    report.display_location()
                )?;
            }
        }
    }
    Ok(())
}
