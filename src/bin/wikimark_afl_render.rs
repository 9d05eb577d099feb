//! AFL++ fuzz target for `wikimark`.
//!
//! This binary is intentionally stdin-driven, so it can be used with AFL++.
//! Build and run it via `cargo-afl`:
//!
//! ```bash
//! cargo install cargo-afl
//!
//! cargo afl build --release --features afl_fuzz --bin wikimark_afl_render
//!
//! mkdir -p fuzz/afl/out
//!
//! cargo afl fuzz \
//!   -i fuzz/afl/in \
//!   -o fuzz/afl/out \
//!   target/release/wikimark_afl_render
//! ```
//!
//! Rust panics normally unwind and exit with a non-crashing status code.
//! AFL++ only treats crashes as signals/aborts. We therefore catch any unwind
//! and turn it into `abort()`.

use std::io::Read;

use time::OffsetDateTime;
use wikimark::cache::MemoryCache;
use wikimark::config::RenderConfig;
use wikimark::model::Page;
use wikimark::render::Renderer;
use wikimark::scan;
use wikimark::store::{MemoryFiles, MemoryStore};

const MAX_INPUT_LEN: usize = 1_000_000; // 1MB guardrail; AFL++ will typically cap this anyway.

fn run_one_input(data: &[u8]) {
    if data.len() > MAX_INPUT_LEN {
        // guardrail: avoid pathological OOM / quadratic behavior on enormous inputs.
        return;
    }

    // wiki pages should be UTF-8, but AFL++ will happily hand us arbitrary bytes.
    // lossy conversion keeps the harness total (no early returns that reduce coverage).
    let src = String::from_utf8_lossy(data).to_string();

    // invariant for any input: segments tile the source byte-identically.
    let segments = scan::split_segments(&src);
    let rejoined: String = segments.iter().map(|s| s.text).collect();
    assert_eq!(rejoined, src, "segments must tile the input");

    // the full pipeline must never panic, even with nothing resolvable.
    let store = MemoryStore::new();
    let files = MemoryFiles::new();
    let cache = MemoryCache::new();
    let config = RenderConfig::default();
    let page = Page {
        id: 1,
        slug: "fuzz".to_string(),
        title: "Fuzz".to_string(),
        content: String::new(),
        updated_at: OffsetDateTime::UNIX_EPOCH,
        attachments: Vec::new(),
    };
    let _html = Renderer::new(&store, &files, &cache, &config).render(&src, &page);
}

fn main() {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data).unwrap();

    // convert any panic into an abort().
    if std::panic::catch_unwind(|| run_one_input(&data)).is_err() {
        std::process::abort();
    }
}
