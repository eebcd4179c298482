//! wavemark-label - line-driven annotation shell
//!
//! The engine's rendering collaborator is a GUI in the full product; this
//! shell stands in for it on a terminal. It owns the control thread and the
//! 50 ms tick source, translates input lines into engine commands, and
//! prints engine events as they arrive. Selections are entered as ranges
//! and replayed to the engine as the pointer gestures a waveform view
//! would deliver.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use crossbeam::channel::{select, tick, unbounded, Receiver};
use wavemark_core::config::{default_config_path, load_config, SessionConfig};
use wavemark_core::{Command, EngineEvent, LabelSession};

fn main() -> Result<()> {
    env_logger::init();

    let config: SessionConfig = match default_config_path() {
        Some(path) => load_config(&path),
        None => SessionConfig::default(),
    };
    let (mut session, events) = LabelSession::new(config);

    // Optional startup target: a folder to scan or a single file
    if let Some(arg) = std::env::args().nth(1) {
        let path = PathBuf::from(arg);
        if !path.exists() {
            bail!("No such path: {}", path.display());
        }
        log::info!("Opening {:?}", path);
        if path.is_dir() {
            session.handle(Command::OpenFolder(path));
        } else {
            session.handle(Command::OpenFile(path));
        }
    }
    drain_events(&events);

    println!("wavemark-label ready; type `help` for commands");

    let ticker = tick(Duration::from_millis(50));
    let lines = spawn_stdin_reader();

    loop {
        select! {
            recv(ticker) -> _ => session.handle(Command::Tick),
            recv(lines) -> line => {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break, // stdin closed
                };
                match parse_line(line.trim()) {
                    Action::Engine(commands) => {
                        for command in commands {
                            session.handle(command);
                        }
                    }
                    Action::ListLabels => list_labels(&session),
                    Action::Help => print_help(),
                    Action::Quit => break,
                    Action::Empty => {}
                    Action::Unknown(word) => println!("unknown command `{}`; try `help`", word),
                }
            }
        }
        drain_events(&events);
    }

    // Leaving mid-session must not lose work
    if !session.labels().is_empty() {
        session.handle(Command::Save);
    }
    drain_events(&events);
    Ok(())
}

/// What an input line asks for
enum Action {
    Engine(Vec<Command>),
    ListLabels,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_line(line: &str) -> Action {
    let mut parts = line.splitn(2, char::is_whitespace);
    let word = match parts.next() {
        Some("") | None => return Action::Empty,
        Some(word) => word,
    };
    let rest = parts.next().unwrap_or("").trim();

    let engine = |commands| Action::Engine(commands);
    match word {
        "open" => engine(vec![Command::OpenFile(PathBuf::from(rest))]),
        "folder" => engine(vec![Command::OpenFolder(PathBuf::from(rest))]),
        "next" | "n" => engine(vec![Command::NextFile]),
        "prev" | "p" => engine(vec![Command::PreviousFile]),
        "play" => engine(vec![Command::Play]),
        "stop" => engine(vec![Command::Stop]),
        "seek" => match rest.parse::<f64>() {
            Ok(t) => engine(vec![Command::SeekTo(t)]),
            Err(_) => {
                println!("usage: seek <seconds>");
                Action::Empty
            }
        },
        // A typed range becomes the drag gesture a waveform view would send
        "sel" => match parse_range(rest) {
            Some((start, end)) => engine(vec![
                Command::PointerDown(start),
                Command::PointerMove(end),
                Command::PointerUp(end),
            ]),
            None => {
                println!("usage: sel <start> <end>");
                Action::Empty
            }
        },
        // A click with no movement, which clears the selection
        "click" => match rest.parse::<f64>() {
            Ok(t) => engine(vec![Command::PointerDown(t), Command::PointerUp(t)]),
            Err(_) => {
                println!("usage: click <seconds>");
                Action::Empty
            }
        },
        "add" => engine(vec![Command::AddLabel(rest.to_string())]),
        "edit" => engine(vec![Command::EditLabel(rest.to_string())]),
        "del" => engine(vec![Command::DeleteLabel]),
        "clear" => engine(vec![Command::ClearLabels]),
        "save" => engine(vec![Command::Save]),
        "labels" | "ls" => Action::ListLabels,
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => Action::Unknown(other.to_string()),
    }
}

fn parse_range(rest: &str) -> Option<(f64, f64)> {
    let mut parts = rest.split_whitespace();
    let start = parts.next()?.parse().ok()?;
    let end = parts.next()?.parse().ok()?;
    Some((start, end))
}

fn list_labels(session: &LabelSession) {
    if session.labels().is_empty() {
        println!("(no labels)");
        return;
    }
    for (i, label) in session.labels().iter().enumerate() {
        println!("  [{}] {:.6}-{:.6}: {}", i, label.start, label.end, label.text);
    }
}

fn drain_events(events: &Receiver<EngineEvent>) {
    for event in events.try_iter() {
        render_event(&event);
    }
}

/// Terminal rendition of what the GUI would draw
fn render_event(event: &EngineEvent) {
    match event {
        EngineEvent::FileActivated { index, total, path } => {
            println!("── {}/{}: {}", index + 1, total, path.display());
        }
        EngineEvent::WaveformReady(buffer) => {
            println!(
                "waveform: {} samples @ {} Hz ({:.3}s)",
                buffer.len(),
                buffer.sample_rate,
                buffer.duration()
            );
        }
        EngineEvent::SpectrogramReady(spec) => {
            let extent = spec.extent();
            println!(
                "spectrogram: {} bins x {} frames, 0-{:.0} Hz",
                spec.n_bins(),
                spec.n_frames(),
                extent.f_max
            );
        }
        EngineEvent::LabelAdded { index, label } => {
            println!("label [{}] {:.6}-{:.6}: {}", index, label.start, label.end, label.text);
        }
        EngineEvent::LabelUpdated { index, label } => {
            println!("label [{}] -> {:.6}-{:.6}: {}", index, label.start, label.end, label.text);
        }
        EngineEvent::LabelRemoved { index } => {
            println!("label [{}] removed (later indices shifted down)", index);
        }
        EngineEvent::LabelsCleared => println!("labels cleared"),
        EngineEvent::SelectionChanged(Some((start, end))) => {
            println!("selection {:.6}-{:.6}", start, end);
        }
        EngineEvent::SelectionChanged(None) => println!("selection cleared"),
        EngineEvent::PlaybackPosition(t) => print!("\rpos {:.2}s ", t),
        EngineEvent::PlaybackCleared => println!("\rplayback stopped"),
        EngineEvent::SidecarSaved(path) => println!("saved {}", path.display()),
        EngineEvent::Warning(message) => println!("! {}", message),
    }
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!(
        "\
commands:
  folder <path>     scan a folder of recordings and open the first
  open <path>       open a single recording
  next / prev       step through the folder (labels autosave)
  sel <start> <end> mark a time range (seconds)
  click <t>         clear the current selection
  add <text>        label the selected range
  edit <text>       rename the label under the selection
  del               delete the label under the selection
  clear             drop all labels for this file
  save              write the sidecar now
  labels            list labels for this file
  play / stop       run the playback marker (selection bounds it)
  seek <t>          move the playback marker
  quit"
    );
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}
