use crate::notice::NoticeBoard;
use crate::view_model::AppViewModel;
use crate::{InputState, KeyBindings, NoticeSettings, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    input: InputState,
    bindings: KeyBindings,
    notices: NoticeBoard,
    queue: Vec<String>,
    harvests_in_flight: usize,
    now_ms: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(KeyBindings::default(), NoticeSettings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(bindings: KeyBindings, notice_settings: NoticeSettings) -> Self {
        Self {
            input: InputState::new(),
            bindings,
            notices: NoticeBoard::new(notice_settings),
            queue: Vec::new(),
            harvests_in_flight: 0,
            now_ms: 0,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            queue_len: self.queue.len(),
            harvesting: self.harvests_in_flight > 0,
            notices: self.notices.visible().to_vec(),
            dirty: self.dirty,
        }
    }

    /// Last known queue contents, as reported by the store.
    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Returns whether a redraw is pending and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn input_and_bindings(&mut self) -> (&mut InputState, &KeyBindings) {
        (&mut self.input, &self.bindings)
    }

    pub(crate) fn notify(&mut self, text: impl Into<String>, severity: Severity) {
        self.notices.push(text, severity, self.now_ms);
        self.dirty = true;
    }

    pub(crate) fn set_queue(&mut self, queue: Vec<String>) {
        self.queue = queue;
        self.dirty = true;
    }

    pub(crate) fn begin_harvest(&mut self) {
        self.harvests_in_flight += 1;
        self.dirty = true;
    }

    pub(crate) fn finish_harvest(&mut self) {
        self.harvests_in_flight = self.harvests_in_flight.saturating_sub(1);
        self.dirty = true;
    }

    pub(crate) fn advance_clock(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        if self.notices.prune(self.now_ms) {
            self.dirty = true;
        }
    }
}
