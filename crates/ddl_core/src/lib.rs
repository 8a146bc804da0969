//! Harvester core: pure state machine, key dispatch and queue presentation.
mod effect;
mod input;
mod msg;
mod notice;
mod presentation;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use input::{
    dispatch, Command, InputState, Key, KeyBindings, KeyChord, KeyEvent, Modifiers,
    ParseChordError,
};
pub use msg::Msg;
pub use notice::{Notice, NoticeSettings, Severity, DEFAULT_NOTICE_TIMEOUT_MS};
pub use presentation::{
    group_by_hostname, preview_summary, to_clipboard_text, HostGroup, UNKNOWN_HOST,
};
pub use state::AppState;
pub use update::update;
pub use view_model::AppViewModel;
