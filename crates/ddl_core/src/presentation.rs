//! Queue formatting for notices and clipboard export.

use url::Url;

/// Bucket name for queue entries without a parseable hostname.
pub const UNKNOWN_HOST: &str = "unknown";

const PREVIEW_ENTRIES: usize = 4;
const PREVIEW_MAX_CHARS: usize = 60;
const PREVIEW_KEEP_CHARS: usize = 57;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroup {
    pub host: String,
    pub urls: Vec<String>,
}

/// Partitions URLs by hostname, keeping groups in first-seen order.
pub fn group_by_hostname(queue: &[String]) -> Vec<HostGroup> {
    let mut groups: Vec<HostGroup> = Vec::new();
    for url in queue {
        let host = hostname_of(url);
        match groups.iter_mut().find(|group| group.host == host) {
            Some(group) => group.urls.push(url.clone()),
            None => groups.push(HostGroup {
                host,
                urls: vec![url.clone()],
            }),
        }
    }
    groups
}

/// URLs one per line, host groups separated by a blank line.
pub fn to_clipboard_text(queue: &[String]) -> String {
    group_by_hostname(queue)
        .iter()
        .map(|group| group.urls.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn preview_summary(queue: &[String]) -> String {
    let mut lines = vec![format!("Queue: {} link(s)", queue.len())];
    if queue.is_empty() {
        lines.push("(Queue is empty)".to_string());
        return lines.join("\n");
    }

    lines.extend(
        queue
            .iter()
            .take(PREVIEW_ENTRIES)
            .map(|url| format!("- {}", truncate_for_preview(url))),
    );
    if queue.len() > PREVIEW_ENTRIES {
        lines.push("...and more".to_string());
    }
    lines.join("\n")
}

fn hostname_of(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

fn truncate_for_preview(url: &str) -> String {
    if url.chars().count() <= PREVIEW_MAX_CHARS {
        return url.to_string();
    }
    let kept: String = url.chars().take(PREVIEW_KEEP_CHARS).collect();
    format!("{kept}{ELLIPSIS}")
}
