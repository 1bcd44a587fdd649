//! Session state through the persistence boundary: payload JSON shape and
//! file save/load.

use pretty_assertions::assert_eq;
use redline_engine::editing::{Session, SessionOptions, TextRange};
use redline_engine::io::{load_document, save_document};
use relative_path::RelativePath;
use tempfile::TempDir;

fn reviewed_session() -> Session {
    let mut s = Session::from_text(
        "hello world",
        SessionOptions {
            author: "ann".to_string(),
            ..SessionOptions::default()
        },
    );
    s.select(TextRange::new(0, 5));
    s.comment("too casual").unwrap();
    let thread_id = s.comments()[0].id;
    s.reply(thread_id, "works for me").unwrap();
    s.select(TextRange::new(6, 11));
    s.comment("which world?").unwrap();
    s
}

#[test]
fn session_survives_a_save_load_cycle_on_disk() {
    let s = reviewed_session();
    let temp_dir = TempDir::new().unwrap();
    let path = RelativePath::new("reviews/hello.json");

    save_document(path, temp_dir.path(), &s.to_payload()).unwrap();
    let payload = load_document(path, temp_dir.path()).unwrap();

    let mut restored = Session::new(SessionOptions::default());
    restored.load_payload(payload);

    assert_eq!(restored.content(), "hello world");
    let original = s.comments();
    let loaded = restored.comments();
    assert_eq!(loaded.len(), original.len());
    for (a, b) in original.iter().zip(&loaded) {
        assert_eq!(a.range, b.range);
        let texts =
            |t: &redline_engine::editing::CommentThread| -> Vec<(String, String, u64)> {
                t.replies
                    .iter()
                    .map(|r| (r.author.clone(), r.text.clone(), r.created_at))
                    .collect()
            };
        assert_eq!(texts(a), texts(b));
    }
}

#[test]
fn saved_json_matches_the_wire_contract() {
    let s = reviewed_session();
    let json = serde_json::to_value(s.to_payload()).unwrap();

    assert_eq!(json["content"], "hello world");
    let comments = json["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["range"]["start"], 0);
    assert_eq!(comments[0]["range"]["end"], 5);
    assert_eq!(comments[0]["replies"][0]["author"], "ann");
    assert_eq!(comments[0]["replies"][1]["text"], "works for me");
    // Ids never leave the process.
    assert!(comments[0].get("id").is_none());
    assert!(comments[0]["replies"][0].get("id").is_none());
}

#[test]
fn loaded_session_is_fully_editable() {
    let payload = reviewed_session().to_payload();
    let mut s = Session::new(SessionOptions::default());
    s.load_payload(payload);

    // Editing after a load shifts the loaded threads like any others.
    s.set_cursor(0);
    s.insert_char('A').unwrap();
    let ranges: Vec<(usize, usize)> = s
        .comments()
        .iter()
        .map(|t| (t.range.start, t.range.end))
        .collect();
    assert_eq!(ranges, vec![(1, 6), (7, 12)]);

    s.undo().unwrap();
    assert_eq!(s.content(), "hello world");

    // And the history does not reach back past the load.
    assert!(!s.undo().unwrap());
}
