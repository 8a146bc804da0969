use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_warn};

use crate::clipboard::ClipboardWriter;
use crate::harvest::{HarvestReport, Harvester};
use crate::page::{load_page, PageSource};

enum EngineCommand {
    LoadQueue,
    Harvest,
    Copy { text: String, count: usize },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    QueueLoaded(Result<Vec<String>, String>),
    HarvestCompleted(Result<HarvestReport, String>),
    ClipboardWritten(Result<usize, String>),
    QueueCleared(Result<(), String>),
}

/// Everything the background worker needs to serve commands.
pub struct EngineSetup {
    pub source: PageSource,
    pub harvester: Harvester,
    pub clipboard: Box<dyn ClipboardWriter>,
}

struct EngineContext {
    source: PageSource,
    harvester: Harvester,
    clipboard: Box<dyn ClipboardWriter>,
}

/// Handle to a worker thread that owns the async runtime.
///
/// Each command runs as its own task, so two harvests issued back to back
/// overlap and race on the queue store.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(setup: EngineSetup) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let context = Arc::new(EngineContext {
            source: setup.source,
            harvester: setup.harvester,
            clipboard: setup.clipboard,
        });

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let context = context.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = handle_command(&context, command).await;
                    if event_tx.send(event).is_err() {
                        engine_warn!("Engine event dropped; receiver is gone");
                    }
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn load_queue(&self) {
        self.send(EngineCommand::LoadQueue);
    }

    pub fn harvest(&self) {
        self.send(EngineCommand::Harvest);
    }

    pub fn copy(&self, text: impl Into<String>, count: usize) {
        self.send(EngineCommand::Copy {
            text: text.into(),
            count,
        });
    }

    pub fn clear(&self) {
        self.send(EngineCommand::Clear);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("Engine worker is not running; command dropped");
        }
    }
}

async fn handle_command(context: &EngineContext, command: EngineCommand) -> EngineEvent {
    let store = context.harvester.store();
    match command {
        EngineCommand::LoadQueue => {
            EngineEvent::QueueLoaded(store.get().await.map_err(|err| err.to_string()))
        }
        EngineCommand::Harvest => {
            let client = context.harvester.client().clone();
            let result = match load_page(&context.source, client.as_ref()).await {
                Ok(page) => context
                    .harvester
                    .harvest(&page)
                    .await
                    .map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            EngineEvent::HarvestCompleted(result)
        }
        EngineCommand::Copy { text, count } => EngineEvent::ClipboardWritten(
            context
                .clipboard
                .write_text(&text)
                .await
                .map(|()| count)
                .map_err(|err| err.to_string()),
        ),
        EngineCommand::Clear => {
            EngineEvent::QueueCleared(store.clear().await.map_err(|err| err.to_string()))
        }
    }
}
