use std::{
    env,
    io::{self, BufRead},
    path::PathBuf,
    process::ExitCode,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use commands::{parse_command, Command, HELP};
use config::{BackendName, NarratorConfig};
use dirs::{get_config_file, get_config_path};
use render::{status_line, voice_list};
use speech_panel::{
    native::{self, NativeDirectory, NativeEngine, NativeSpeechError},
    SpeakOutcome, SpeechPanel,
};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod dirs;
mod render;

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

type Panel = SpeechPanel<NativeEngine, NativeDirectory>;

#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("Failed to get HOME directory")]
    Home(#[source] env::VarError),
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("Failed to parse config file")]
    Config(#[from] toml::de::Error),
    #[error("Failed to start speech engine")]
    Speech(#[from] NativeSpeechError),
}

#[derive(Parser, Debug)]
#[command(name = "narrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Speak text through the system text-to-speech engine")]
struct Args {
    /// Config file (defaults to ~/.config/narrator/narrator.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// TTS backend to use
    #[arg(long, value_enum)]
    backend: Option<BackendName>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "narrator failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), NarratorError> {
    let config_path = match args.config {
        Some(path) => path,
        None => get_config_file(&get_config_path()?, "narrator.toml"),
    };
    let mut config = NarratorConfig::load(&config_path)?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    setup_tracing(&config.log_level);
    info!(?config_path, ?config, "Starting narrator");

    let (engine, directory) = native::open(config.backend.into())?;
    let mut panel = SpeechPanel::mount(engine, directory, config.panel_config());
    panel.subscribe(|state| println!("{}", status_line(&state.view())));
    println!("{}", status_line(&panel.view()));
    println!("Type 'help' for commands.");

    let lines = spawn_stdin_reader();
    loop {
        match lines.recv_timeout(PUMP_INTERVAL) {
            Ok(line) => match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => apply(&mut panel, command),
                Err(e) => println!("{e}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                let timeout = config.drain_timeout(&panel.state().text);
                finish_speaking(&mut panel, timeout);
                break;
            }
        }
        panel.pump();
    }

    panel.stop();
    info!("Narrator stopped");
    Ok(())
}

fn apply(panel: &mut Panel, command: Command) {
    match command {
        Command::Text(text) => panel.set_text(text),
        Command::Voices => println!("{}", voice_list(&panel.view())),
        Command::Voice(index) => {
            if let Err(e) = panel.select_voice(index) {
                println!("{e}");
            }
        }
        Command::Rate(rate) => panel.set_rate(rate),
        Command::Pitch(pitch) => panel.set_pitch(pitch),
        Command::Volume(volume) => panel.set_volume(volume),
        Command::Play => match panel.speak() {
            SpeakOutcome::Submitted { .. } => {}
            SpeakOutcome::Rejected(reason) => println!("{reason}"),
            // already logged by the panel
            SpeakOutcome::Failed(_) => println!("Speech synthesis failed"),
        },
        Command::Stop => panel.stop(),
        Command::Status => println!("{}", status_line(&panel.view())),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Keep pumping until the last request has finished, so piped input is spoken before exiting.
fn finish_speaking(panel: &mut Panel, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while panel.is_busy() {
        if Instant::now() >= deadline {
            warn!(?timeout, "Speech did not finish in time, exiting anyway");
            return;
        }
        panel.pump();
        thread::sleep(PUMP_INTERVAL);
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });
    rx
}

fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}
