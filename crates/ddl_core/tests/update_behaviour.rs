use std::sync::Once;

use ddl_core::{
    update, AppState, Command, Effect, KeyBindings, KeyChord, Msg, NoticeSettings, Severity,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn press(state: AppState, chord: &str) -> (AppState, Vec<Effect>) {
    let chord: KeyChord = chord.parse().unwrap();
    let mut state = state;
    let mut effects = Vec::new();
    for event in chord.key_events() {
        let (next, mut produced) = update(state, Msg::Key(event));
        state = next;
        effects.append(&mut produced);
    }
    (state, effects)
}

fn loaded(urls: &[&str]) -> AppState {
    let queue = urls.iter().map(|url| url.to_string()).collect();
    let (state, _) = update(AppState::new(), Msg::QueueLoaded(queue));
    state
}

fn last_notice(state: &AppState) -> (String, Severity) {
    let notice = state.view().notices.last().cloned().expect("notice");
    (notice.text, notice.severity)
}

#[test]
fn noop_and_unbound_keys_leave_state_untouched() {
    let state = loaded(&["https://a.example/1"]);
    let (next, effects) = update(state.clone(), Msg::NoOp);
    assert_eq!(next, state);
    assert!(effects.is_empty());

    let (next, effects) = press(state.clone(), "ctrl+alt+z");
    assert_eq!(next.queue(), state.queue());
    assert!(effects.is_empty());
    assert!(next.view().notices.is_empty());
}

#[test]
fn startup_requests_queue_load() {
    init_logging();
    let (_state, effects) = update(AppState::new(), Msg::Started);
    assert_eq!(effects, vec![Effect::LoadQueue]);
}

#[test]
fn harvest_chord_emits_harvest_effect_and_marks_busy() {
    init_logging();
    let (mut state, effects) = press(AppState::new(), "ctrl+alt+h");

    assert_eq!(effects, vec![Effect::Harvest]);
    assert!(state.view().harvesting);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn second_harvest_while_running_is_not_blocked() {
    init_logging();
    let (state, _) = press(AppState::new(), "ctrl+alt+h");
    let (state, effects) = press(state, "ctrl+alt+h");
    assert_eq!(effects, vec![Effect::Harvest]);

    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            added: vec![],
            queue: vec![],
        },
    );
    assert!(state.view().harvesting);
    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            added: vec![],
            queue: vec![],
        },
    );
    assert!(!state.view().harvesting);
}

#[test]
fn harvest_success_reports_count_and_queue_size() {
    init_logging();
    let state = loaded(&["https://a.com/0"]);
    let (state, _) = update(state, Msg::Command(Command::Harvest));
    let (state, effects) = update(
        state,
        Msg::HarvestCompleted {
            added: vec!["https://a.com/1".into(), "https://b.com/1".into()],
            queue: vec![
                "https://a.com/0".into(),
                "https://a.com/1".into(),
                "https://b.com/1".into(),
            ],
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.queue().len(), 3);
    assert_eq!(
        last_notice(&state),
        (
            "Added 2 link(s). Queue now holds 3.".to_string(),
            Severity::Success
        )
    );
}

#[test]
fn harvest_with_nothing_added_reports_nothing_found() {
    init_logging();
    let (state, _) = update(
        loaded(&["https://a.com/0"]),
        Msg::HarvestCompleted {
            added: vec![],
            queue: vec!["https://a.com/0".into()],
        },
    );

    assert_eq!(
        last_notice(&state),
        ("No new links found.".to_string(), Severity::Warning)
    );
}

#[test]
fn copy_with_empty_queue_is_an_error_without_effects() {
    init_logging();
    let (state, effects) = press(AppState::new(), "ctrl+alt+c");

    assert!(effects.is_empty());
    assert_eq!(last_notice(&state).1, Severity::Error);
    assert!(state.queue().is_empty());
}

#[test]
fn copy_emits_grouped_clipboard_text() {
    init_logging();
    let state = loaded(&["https://a.com/1", "https://b.com/1", "https://a.com/2"]);
    let (state, effects) = press(state, "ctrl+alt+c");

    assert_eq!(
        effects,
        vec![Effect::CopyToClipboard {
            text: "https://a.com/1\nhttps://a.com/2\n\nhttps://b.com/1".to_string(),
            count: 3,
        }]
    );

    let (state, _) = update(state, Msg::ClipboardWritten { count: 3 });
    assert_eq!(
        last_notice(&state),
        ("Copied 3 link(s) to clipboard.".to_string(), Severity::Success)
    );
}

#[test]
fn clipboard_failure_is_a_single_error_notice() {
    init_logging();
    let (state, _) = update(
        loaded(&["https://a.com/1"]),
        Msg::ClipboardFailed {
            reason: "no clipboard".into(),
        },
    );
    let view = state.view();
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].severity, Severity::Error);
    assert_eq!(view.queue_len, 1);
}

#[test]
fn clear_goes_through_store_then_empties_queue() {
    init_logging();
    let (state, effects) = press(loaded(&["https://a.com/1"]), "ctrl+alt+x");
    assert_eq!(effects, vec![Effect::ClearQueue]);
    assert_eq!(state.queue().len(), 1);

    let (state, _) = update(state, Msg::QueueCleared);
    assert!(state.queue().is_empty());
    assert_eq!(
        last_notice(&state),
        ("Queue cleared.".to_string(), Severity::Info)
    );
}

#[test]
fn preview_renders_summary_notice() {
    init_logging();
    let (state, effects) = press(loaded(&["https://a.com/1"]), "ctrl+alt+v");

    assert!(effects.is_empty());
    assert_eq!(
        last_notice(&state),
        (
            "Queue: 1 link(s)\n- https://a.com/1".to_string(),
            Severity::Info
        )
    );
}

#[test]
fn notices_expire_on_tick() {
    init_logging();
    let settings = NoticeSettings {
        timeout_ms: Some(1_000),
        ..NoticeSettings::default()
    };
    let state = AppState::with_settings(KeyBindings::default(), settings);
    let (state, _) = update(state, Msg::Tick { now_ms: 500 });
    let (mut state, _) = update(state, Msg::Command(Command::PreviewQueue));
    assert_eq!(state.view().notices[0].expires_at_ms, Some(1_500));
    state.consume_dirty();

    let (mut state, _) = update(state, Msg::Tick { now_ms: 1_499 });
    assert_eq!(state.view().notices.len(), 1);
    assert!(!state.consume_dirty());

    let (mut state, _) = update(state, Msg::Tick { now_ms: 1_500 });
    assert!(state.view().notices.is_empty());
    assert!(state.consume_dirty());
}

#[test]
fn persistent_notices_never_expire() {
    init_logging();
    let settings = NoticeSettings {
        timeout_ms: None,
        ..NoticeSettings::default()
    };
    let state = AppState::with_settings(KeyBindings::default(), settings);
    let (state, _) = update(state, Msg::Command(Command::PreviewQueue));
    let (state, _) = update(state, Msg::Tick { now_ms: u64::MAX });

    assert_eq!(state.view().notices.len(), 1);
    assert_eq!(state.view().notices[0].expires_at_ms, None);
}

#[test]
fn notice_board_keeps_only_newest_entries() {
    init_logging();
    let settings = NoticeSettings {
        timeout_ms: None,
        max_visible: 2,
    };
    let mut state = AppState::with_settings(KeyBindings::default(), settings);
    for _ in 0..3 {
        let (next, _) = update(state, Msg::Command(Command::PreviewQueue));
        state = next;
    }

    let ids: Vec<u64> = state.view().notices.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 3]);
}
