use crate::Notice;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub queue_len: usize,
    pub harvesting: bool,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}
