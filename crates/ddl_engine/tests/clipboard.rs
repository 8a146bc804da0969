use std::fs;

use ddl_engine::{
    ClipboardError, ClipboardWriter, CommandClipboard, FallbackClipboard, FileClipboard,
};

const MISSING_TOOL: &str = "ddl-harvester-no-such-clipboard-tool";

#[tokio::test]
async fn file_clipboard_writes_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.txt");

    FileClipboard::new(&path)
        .write_text("https://a/1\nhttps://a/2")
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "https://a/1\nhttps://a/2");
}

#[tokio::test]
async fn fallback_moves_past_missing_tool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.txt");
    let clipboard = FallbackClipboard::new(vec![
        Box::new(CommandClipboard::new(MISSING_TOOL, &[])),
        Box::new(FileClipboard::new(&path)),
    ]);

    clipboard.write_text("links").await.unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "links");
    assert!(clipboard.name().contains(MISSING_TOOL));
}

#[tokio::test]
async fn fallback_reports_every_failed_attempt() {
    let clipboard = FallbackClipboard::new(vec![
        Box::new(CommandClipboard::new(MISSING_TOOL, &[])),
        Box::new(CommandClipboard::new(format!("{MISSING_TOOL}-2"), &[])),
    ]);

    let err = clipboard.write_text("links").await.unwrap_err();

    match err {
        ClipboardError::AllFailed { attempts } => assert_eq!(attempts.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn command_clipboard_pipes_text_to_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("piped.txt");
    let script = format!("cat > '{}'", path.display());

    CommandClipboard::new("sh", &["-c", &script])
        .write_text("piped text")
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "piped text");
}

#[cfg(unix)]
#[tokio::test]
async fn command_clipboard_reports_non_zero_exit() {
    let err = CommandClipboard::new("sh", &["-c", "cat > /dev/null; exit 3"])
        .write_text("x")
        .await
        .unwrap_err();

    assert!(matches!(err, ClipboardError::Exit { ref program, .. } if program == "sh"));
}
