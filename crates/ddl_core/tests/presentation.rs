use ddl_core::{group_by_hostname, preview_summary, to_clipboard_text, HostGroup, UNKNOWN_HOST};
use pretty_assertions::assert_eq;

fn queue(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| url.to_string()).collect()
}

#[test]
fn groups_follow_first_seen_host_order() {
    let queue = queue(&["https://a.com/1", "https://b.com/1", "https://a.com/2"]);

    assert_eq!(
        group_by_hostname(&queue),
        vec![
            HostGroup {
                host: "a.com".to_string(),
                urls: vec!["https://a.com/1".to_string(), "https://a.com/2".to_string()],
            },
            HostGroup {
                host: "b.com".to_string(),
                urls: vec!["https://b.com/1".to_string()],
            },
        ]
    );
}

#[test]
fn clipboard_text_separates_groups_with_blank_line() {
    let queue = queue(&["https://a.com/1", "https://b.com/1", "https://a.com/2"]);

    assert_eq!(
        to_clipboard_text(&queue),
        "https://a.com/1\nhttps://a.com/2\n\nhttps://b.com/1"
    );
}

#[test]
fn unparseable_entries_fall_into_unknown_bucket() {
    let queue = queue(&["not a url", "https://a.com/1", "mailto:someone"]);
    let groups = group_by_hostname(&queue);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].host, UNKNOWN_HOST);
    assert_eq!(groups[0].urls, vec!["not a url", "mailto:someone"]);
    assert_eq!(groups[1].host, "a.com");
}

#[test]
fn empty_queue_previews_placeholder() {
    assert_eq!(preview_summary(&[]), "Queue: 0 link(s)\n(Queue is empty)");
    assert_eq!(to_clipboard_text(&[]), "");
}

#[test]
fn preview_shows_four_entries_and_more_suffix() {
    let queue: Vec<String> = (1..=6).map(|i| format!("https://x.com/{i}")).collect();
    let summary = preview_summary(&queue);
    let lines: Vec<&str> = summary.lines().collect();

    assert_eq!(lines[0], "Queue: 6 link(s)");
    assert_eq!(
        &lines[1..5],
        &[
            "- https://x.com/1",
            "- https://x.com/2",
            "- https://x.com/3",
            "- https://x.com/4"
        ]
    );
    assert_eq!(lines[5], "...and more");
    assert_eq!(lines.len(), 6);
}

#[test]
fn long_urls_are_truncated_to_57_chars_plus_ellipsis() {
    let url = format!("https://files.example.com/{}", "a".repeat(80 - 26));
    assert_eq!(url.len(), 80);

    let summary = preview_summary(&[url.clone()]);
    let line = summary.lines().nth(1).unwrap();

    assert_eq!(line, format!("- {}...", &url[..57]));
    assert!(!summary.contains("...and more"));
}
