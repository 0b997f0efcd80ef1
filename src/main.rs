use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use curl_sentinel::config::Config;
use curl_sentinel::report::Report;
use curl_sentinel::reps::RepCounter;
use curl_sentinel::session::{Session, SessionSummary, Tracker};
use curl_sentinel::store::SessionStore;
use curl_sentinel::trace;

const DEFAULT_CONFIG_PATH: &str = "curl-sentinel.toml";

#[derive(Parser, Debug)]
#[command(name = "curl-sentinel", version, about = "Biceps curl rep counter")]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Config file (defaults are used if it does not exist)"
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count reps live from the camera
    Run,
    /// Count reps over a recorded arm trace
    Replay {
        trace: PathBuf,
        #[arg(long, default_value_t = false, help = "Store the result like a live session")]
        save: bool,
    },
    /// List stored sessions
    History {
        #[arg(long, help = "Output machine-readable JSON")]
        json: bool,
    },
    /// Write the default config file
    InitConfig {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { force } => init_config(&cli.config, force),
        Commands::History { json } => {
            let config = Config::load_or_default(&cli.config)?;
            history(&config, json)
        }
        Commands::Replay { trace, save } => {
            let config = Config::load_or_default(&cli.config)?;
            replay(&config, &trace, save)
        }
        Commands::Run => {
            let config = Config::load_or_default(&cli.config)?;
            run_live(&config)
        }
    }
}

fn tracker(config: &Config) -> Result<Tracker> {
    let thresholds = config.thresholds()?;
    info!(
        "counting reps between {:.0}° (extended) and {:.0}° (flexed)",
        thresholds.extension(),
        thresholds.flexion()
    );
    let counter = RepCounter::new(thresholds);
    Ok(Tracker::new(counter, config.arm, config.min_visibility))
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save(path)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn history(config: &Config, json: bool) -> Result<()> {
    let sessions = SessionStore::open(&config.store_path).list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }

    println!("{:<12} {:>6}  Session Time", "Session No.", "Reps");
    for s in &sessions {
        println!(
            "{:<12} {:>6}  {}",
            s.id,
            s.reps,
            s.session_time.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn replay(config: &Config, path: &Path, save: bool) -> Result<()> {
    let ticks = trace::read(path)?;
    let mut session = Session::start(tracker(config)?);

    for joints in &ticks {
        session.observe_joints(joints.as_ref());
    }

    let phase = session.state().phase;
    let summary = session.finish();
    info!("replayed {} ticks from {}", ticks.len(), path.display());
    println!("Final phase:    {:?}", phase);
    finish(config, summary, save)
}

fn finish(config: &Config, summary: SessionSummary, save: bool) -> Result<()> {
    if save {
        let record = SessionStore::open(&config.store_path).record(summary.reps, summary.ended_at)?;
        println!("Saved as session {}", record.id);
    }

    let report = Report::new(summary, config.target_reps, &mut rand::thread_rng());
    print!("{}", report.render());
    Ok(())
}

#[cfg(not(feature = "camera"))]
fn run_live(_config: &Config) -> Result<()> {
    anyhow::bail!("live capture needs the `camera` feature (cargo build --features camera)")
}

#[cfg(feature = "camera")]
fn run_live(config: &Config) -> Result<()> {
    use std::ops::ControlFlow;

    use curl_sentinel::camera::Camera;
    use curl_sentinel::inference::PoseDetector;
    use curl_sentinel::overlay::CounterWindow;
    use curl_sentinel::session::run_session;

    let tracker = tracker(config)?;
    let mut detector = PoseDetector::new(&config.model_path, config.min_presence)?;
    let mut camera = Camera::new(config.camera_id)?;
    let window = CounterWindow::new(config.frame_interval_ms)?;

    println!("Press q or Esc in the video window to stop.");
    let summary = run_session(&mut camera, &mut detector, tracker, |frame, landmarks, tick, state| {
        // A broken window ends the session but keeps its count.
        let stop = window
            .present(frame, landmarks, tick.angle(), state)
            .unwrap_or_else(|err| {
                log::warn!("display failed, stopping session: {:#}", err);
                true
            });
        Ok(if stop {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        })
    })?;

    drop(window);
    drop(camera);
    finish(config, summary, true)
}
