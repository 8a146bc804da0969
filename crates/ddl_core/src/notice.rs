pub const DEFAULT_NOTICE_TIMEOUT_MS: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

/// A transient on-screen message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub text: String,
    pub severity: Severity,
    /// `None` keeps the notice until it is replaced by the board's capacity limit.
    pub expires_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeSettings {
    /// Auto-dismiss delay; `None` makes notices persistent.
    pub timeout_ms: Option<u64>,
    pub max_visible: usize,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_NOTICE_TIMEOUT_MS),
            max_visible: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NoticeBoard {
    settings: NoticeSettings,
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub(crate) fn new(settings: NoticeSettings) -> Self {
        Self {
            settings,
            next_id: 1,
            notices: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, text: impl Into<String>, severity: Severity, now_ms: u64) {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            text: text.into(),
            severity,
            expires_at_ms: self
                .settings
                .timeout_ms
                .map(|timeout| now_ms.saturating_add(timeout)),
        });
        let max_visible = self.settings.max_visible.max(1);
        if self.notices.len() > max_visible {
            let overflow = self.notices.len() - max_visible;
            self.notices.drain(..overflow);
        }
    }

    /// Drops expired notices; returns true when anything was removed.
    pub(crate) fn prune(&mut self, now_ms: u64) -> bool {
        let before = self.notices.len();
        self.notices
            .retain(|notice| notice.expires_at_ms.is_none_or(|expires| expires > now_ms));
        before != self.notices.len()
    }

    pub(crate) fn visible(&self) -> &[Notice] {
        &self.notices
    }
}
