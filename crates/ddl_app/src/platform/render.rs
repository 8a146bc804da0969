use std::io::{self, Write};

use ddl_core::{AppViewModel, Command, KeyBindings, Notice, Severity};

/// Prints each notice once, as it first becomes visible.
///
/// A terminal cannot take text back, so expiry only stops a notice from being
/// reprinted.
pub struct TerminalRenderer<W: Write> {
    out: W,
    last_notice_id: u64,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_notice_id: 0,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        for notice in view.notices.iter() {
            if notice.id <= self.last_notice_id {
                continue;
            }
            writeln!(self.out, "{}", format_notice(notice))?;
            self.last_notice_id = notice.id;
        }
        self.out.flush()
    }

    pub fn print_bindings(&mut self, bindings: &KeyBindings) -> io::Result<()> {
        writeln!(self.out, "Key bindings:")?;
        for (chord, command) in bindings.entries() {
            writeln!(self.out, "  {:<14} {}", chord.to_string(), command_label(*command))?;
        }
        writeln!(
            self.out,
            "Type a chord (ctrl+alt+h) or a command (harvest, copy, clear, preview); q quits."
        )?;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.severity {
        Severity::Info => "[info]",
        Severity::Success => "[ ok ]",
        Severity::Warning => "[warn]",
        Severity::Error => "[fail]",
    };
    let mut lines = notice.text.lines();
    let mut rendered = format!("{tag} {}", lines.next().unwrap_or_default());
    for line in lines {
        rendered.push_str("\n       ");
        rendered.push_str(line);
    }
    rendered
}

pub fn command_label(command: Command) -> &'static str {
    match command {
        Command::Harvest => "harvest links on the page",
        Command::CopyQueue => "copy queue to clipboard",
        Command::ClearQueue => "clear queue",
        Command::PreviewQueue => "preview queue",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notice(id: u64, text: &str, severity: Severity) -> Notice {
        Notice {
            id,
            text: text.to_string(),
            severity,
            expires_at_ms: None,
        }
    }

    #[test]
    fn notices_are_printed_once() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        let first = AppViewModel {
            notices: vec![notice(1, "Harvesting links...", Severity::Info)],
            ..AppViewModel::default()
        };
        let second = AppViewModel {
            notices: vec![
                notice(1, "Harvesting links...", Severity::Info),
                notice(2, "No new links found.", Severity::Warning),
            ],
            ..AppViewModel::default()
        };

        renderer.render(&first).unwrap();
        renderer.render(&second).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            output,
            "[info] Harvesting links...\n[warn] No new links found.\n"
        );
    }

    #[test]
    fn multi_line_notices_are_indented() {
        let rendered = format_notice(&notice(
            1,
            "Queue: 1 link(s)\n- https://a/1",
            Severity::Info,
        ));
        assert_eq!(rendered, "[info] Queue: 1 link(s)\n       - https://a/1");
    }

    #[test]
    fn bindings_are_listed() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.print_bindings(&KeyBindings::default()).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains("Ctrl+Alt+H"));
        assert!(output.contains("copy queue to clipboard"));
    }
}
