#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadQueue,
    Harvest,
    CopyToClipboard { text: String, count: usize },
    ClearQueue,
}
