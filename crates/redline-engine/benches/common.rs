// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use redline_engine::editing::{Session, SessionOptions, TextRange};

#[allow(dead_code)]
pub fn generate_review_text(paragraphs: usize) -> String {
    let base = "The quick brown fox jumps over the lazy dog. \
                A flagged sentence the reviewer cares about sits here. \
                Cat owners disagree with dog owners about the cat.\n\n";
    base.repeat(paragraphs)
}

#[allow(dead_code)]
pub fn session_with_comments(paragraphs: usize, comments: usize) -> Session {
    let text = generate_review_text(paragraphs);
    let len = text.len();
    let mut session = Session::from_text(&text, SessionOptions::default());

    // Spread fixed-width threads evenly through the buffer.
    let stride = len / (comments + 1);
    for i in 0..comments {
        let start = (i + 1) * stride;
        session.select(TextRange::new(start, (start + 10).min(len)));
        session.comment("benchmark comment").unwrap();
    }
    session
}
