use std::time::Duration;

use ddl_core::{Effect, Msg};
use ddl_engine::{EngineEvent, EngineHandle, EngineSetup};
use engine_logging::{engine_info, engine_warn};

/// Forwards core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    pending: usize,
}

impl EffectRunner {
    pub fn new(setup: EngineSetup) -> std::io::Result<Self> {
        Ok(Self {
            engine: EngineHandle::new(setup)?,
            pending: 0,
        })
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadQueue => self.engine.load_queue(),
                Effect::Harvest => {
                    engine_info!("Harvest requested");
                    self.engine.harvest();
                }
                Effect::CopyToClipboard { text, count } => {
                    engine_info!("Copy requested count={} text_len={}", count, text.len());
                    self.engine.copy(text, count);
                }
                Effect::ClearQueue => self.engine.clear(),
            }
            self.pending += 1;
        }
    }

    /// Effects sent to the engine whose results have not come back yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn try_next(&mut self) -> Option<Msg> {
        let event = self.engine.try_recv()?;
        Some(self.complete(event))
    }

    pub fn wait_next(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(self.complete(event))
    }

    fn complete(&mut self, event: EngineEvent) -> Msg {
        self.pending = self.pending.saturating_sub(1);
        map_event(event)
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::QueueLoaded(Ok(queue)) => Msg::QueueLoaded(queue),
        EngineEvent::QueueLoaded(Err(reason)) => {
            engine_warn!("Queue load failed: {}", reason);
            Msg::StoreFailed { reason }
        }
        EngineEvent::HarvestCompleted(Ok(report)) => Msg::HarvestCompleted {
            added: report.added,
            queue: report.queue,
        },
        EngineEvent::HarvestCompleted(Err(reason)) => {
            engine_warn!("Harvest failed: {}", reason);
            Msg::HarvestFailed { reason }
        }
        EngineEvent::ClipboardWritten(Ok(count)) => Msg::ClipboardWritten { count },
        EngineEvent::ClipboardWritten(Err(reason)) => {
            engine_warn!("Clipboard write failed: {}", reason);
            Msg::ClipboardFailed { reason }
        }
        EngineEvent::QueueCleared(Ok(())) => Msg::QueueCleared,
        EngineEvent::QueueCleared(Err(reason)) => {
            engine_warn!("Queue clear failed: {}", reason);
            Msg::StoreFailed { reason }
        }
    }
}
