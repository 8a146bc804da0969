use crate::{dispatch, preview_summary, to_clipboard_text, AppState, Command, Effect, Msg, Severity};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::LoadQueue],
        Msg::Key(event) => {
            let (input, bindings) = state.input_and_bindings();
            match dispatch(input, event, bindings) {
                Some(command) => run_command(&mut state, command),
                None => Vec::new(),
            }
        }
        Msg::Command(command) => run_command(&mut state, command),
        Msg::QueueLoaded(queue) => {
            state.set_queue(queue);
            Vec::new()
        }
        Msg::HarvestCompleted { added, queue } => {
            state.finish_harvest();
            let queue_len = queue.len();
            state.set_queue(queue);
            if added.is_empty() {
                state.notify("No new links found.", Severity::Warning);
            } else {
                state.notify(
                    format!(
                        "Added {} link(s). Queue now holds {}.",
                        added.len(),
                        queue_len
                    ),
                    Severity::Success,
                );
            }
            Vec::new()
        }
        Msg::HarvestFailed { reason } => {
            state.finish_harvest();
            state.notify(format!("Harvest failed: {reason}"), Severity::Error);
            Vec::new()
        }
        Msg::ClipboardWritten { count } => {
            state.notify(
                format!("Copied {count} link(s) to clipboard."),
                Severity::Success,
            );
            Vec::new()
        }
        Msg::ClipboardFailed { reason } => {
            state.notify(format!("Copy failed: {reason}"), Severity::Error);
            Vec::new()
        }
        Msg::QueueCleared => {
            state.set_queue(Vec::new());
            state.notify("Queue cleared.", Severity::Info);
            Vec::new()
        }
        Msg::StoreFailed { reason } => {
            state.notify(format!("Queue storage error: {reason}"), Severity::Error);
            Vec::new()
        }
        Msg::Tick { now_ms } => {
            state.advance_clock(now_ms);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn run_command(state: &mut AppState, command: Command) -> Vec<Effect> {
    match command {
        Command::Harvest => {
            // A second harvest while one is running is allowed; both race on the store.
            state.begin_harvest();
            state.notify("Harvesting links...", Severity::Info);
            vec![Effect::Harvest]
        }
        Command::CopyQueue => {
            if state.queue().is_empty() {
                state.notify("Queue is empty, nothing to copy.", Severity::Error);
                return Vec::new();
            }
            vec![Effect::CopyToClipboard {
                text: to_clipboard_text(state.queue()),
                count: state.queue().len(),
            }]
        }
        Command::ClearQueue => vec![Effect::ClearQueue],
        Command::PreviewQueue => {
            let summary = preview_summary(state.queue());
            state.notify(summary, Severity::Info);
            Vec::new()
        }
    }
}
