use std::io::{self, BufRead, Stdout};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use ddl_core::{update, AppState, Command, KeyChord, Msg};
use ddl_engine::{
    EngineSetup, FallbackClipboard, FileKeyValueStore, HarvestOptions, Harvester, PostProcessor,
    QueueStore, ReqwestHttpClient, RuleTable,
};
use engine_logging::{engine_debug, engine_info};

use super::args::Args;
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::logging;
use super::render::TerminalRenderer;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum Input {
    Msg(Msg),
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;
    logging::initialize(&config.log);
    engine_info!("Starting ddl_harvester page={}", args.page);

    let bindings = config.key_bindings()?;
    let setup = engine_setup(&args, &config)?;
    let runner = EffectRunner::new(setup).context("failed to start engine")?;

    let mut app = App {
        state: AppState::with_settings(bindings.clone(), config.notice_settings()),
        runner,
        renderer: TerminalRenderer::new(io::stdout()),
        clock: Instant::now(),
    };
    app.dispatch(Msg::Started)?;

    if args.keys.is_empty() {
        app.renderer.print_bindings(&bindings)?;
        app.run_interactive()
    } else {
        app.run_scripted(&args.keys)
    }
}

fn engine_setup(args: &Args, config: &AppConfig) -> anyhow::Result<EngineSetup> {
    let source = args.page_source()?;
    let client = ReqwestHttpClient::new(config.http.settings())?;
    let rules = RuleTable::default_table()?;
    let store = FileKeyValueStore::new(&config.store_path);
    engine_info!("Queue store at {:?}", store.path());

    let harvester = Harvester::new(
        Arc::new(rules),
        PostProcessor::with_default_rules(),
        Arc::new(client),
        QueueStore::new(Arc::new(store)),
        HarvestOptions {
            post_process: config.post_process,
        },
    );

    Ok(EngineSetup {
        source,
        harvester,
        clipboard: Box::new(FallbackClipboard::platform(config.clipboard_file.clone())),
    })
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer<Stdout>,
    clock: Instant,
}

impl App {
    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty {
            self.renderer.render(&view)?;
        }
        self.runner.enqueue(effects);
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn pump_engine(&mut self) -> anyhow::Result<()> {
        while let Some(msg) = self.runner.try_next() {
            self.dispatch(msg)?;
        }
        Ok(())
    }

    /// Blocks until every effect issued so far has reported back.
    fn drain_pending(&mut self) -> anyhow::Result<()> {
        while self.runner.pending() > 0 {
            if let Some(msg) = self.runner.wait_next(POLL_INTERVAL) {
                self.dispatch(msg)?;
            }
            let now_ms = self.now_ms();
            self.dispatch(Msg::Tick { now_ms })?;
        }
        Ok(())
    }

    /// Presses each chord in turn, letting its work finish before the next one.
    fn run_scripted(&mut self, chords: &[KeyChord]) -> anyhow::Result<()> {
        self.drain_pending()?;
        for chord in chords {
            engine_debug!("Scripted chord {}", chord);
            for event in chord.key_events() {
                self.dispatch(Msg::Key(event))?;
            }
            self.drain_pending()?;
        }
        Ok(())
    }

    fn run_interactive(&mut self) -> anyhow::Result<()> {
        let (input_tx, input_rx) = mpsc::channel::<Input>();
        spawn_stdin_reader(input_tx.clone());
        spawn_ticker(input_tx, self.clock);

        loop {
            self.pump_engine()?;
            match input_rx.recv_timeout(POLL_INTERVAL) {
                Ok(Input::Msg(msg)) => self.dispatch(msg)?,
                Ok(Input::Quit) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {}
            }
        }

        engine_info!("Shutting down; waiting for {} effect(s)", self.runner.pending());
        self.drain_pending()
    }
}

fn spawn_ticker(input_tx: mpsc::Sender<Input>, clock: Instant) {
    thread::spawn(move || loop {
        let now_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        if input_tx.send(Input::Msg(Msg::Tick { now_ms })).is_err() {
            break;
        }
        thread::sleep(TICK_INTERVAL);
    });
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let inputs = match parse_line(&line) {
                Ok(inputs) => inputs,
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            };
            for input in inputs {
                if input_tx.send(input).is_err() {
                    return;
                }
            }
        }
        let _ = input_tx.send(Input::Quit);
    });
}

/// One typed line: a quit word, a command name, or a key chord.
fn parse_line(line: &str) -> Result<Vec<Input>, String> {
    let trimmed = line.trim();
    let command = match trimmed.to_ascii_lowercase().as_str() {
        "" => return Ok(Vec::new()),
        "q" | "quit" | "exit" => return Ok(vec![Input::Quit]),
        "harvest" => Some(Command::Harvest),
        "copy" => Some(Command::CopyQueue),
        "clear" => Some(Command::ClearQueue),
        "preview" => Some(Command::PreviewQueue),
        _ => None,
    };
    if let Some(command) = command {
        return Ok(vec![Input::Msg(Msg::Command(command))]);
    }

    let chord: KeyChord = trimmed
        .parse()
        .map_err(|err| format!("Unrecognized input {trimmed:?}: {err}"))?;
    Ok(chord
        .key_events()
        .into_iter()
        .map(|event| Input::Msg(Msg::Key(event)))
        .collect())
}
