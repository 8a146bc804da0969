#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// App finished wiring; the persisted queue should be loaded.
    Started,
    /// Raw key press/release from the input surface.
    Key(crate::KeyEvent),
    /// A command issued directly, bypassing the key bindings.
    Command(crate::Command),
    /// Persisted queue read from the store.
    QueueLoaded(Vec<String>),
    /// Harvest finished; `added` lists new links in insertion order.
    HarvestCompleted {
        added: Vec<String>,
        queue: Vec<String>,
    },
    /// Harvest aborted before completion (page load or store failure).
    HarvestFailed { reason: String },
    ClipboardWritten { count: usize },
    ClipboardFailed { reason: String },
    QueueCleared,
    /// Store read or write failed outside of a harvest.
    StoreFailed { reason: String },
    /// Clock tick used to expire notices.
    Tick { now_ms: u64 },
    /// Fallback for placeholder wiring.
    NoOp,
}
