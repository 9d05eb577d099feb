//! Splitting raw Markdown into processable and literal (code) segments.
//!
//! Goals:
//! - link/image syntax inside code is never rewritten, so the rest of the
//!   pipeline only ever sees non-code segments
//! - segments tile the input: concatenating them reproduces it byte for byte
//! - no regex; an explicit scanner tracks fence character and run length
//!
//! Code is either a fenced block (a full line starting with three-plus
//! backticks or tildes, closed by a line of exactly the same run of the same
//! character, leading whitespace allowed) or an inline span (a backtick run
//! closed by a run of exactly the same length). Unterminated delimiters are
//! not code; they stay in the surrounding text untouched.

pub mod links;

/// What a segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Rewritable prose.
    Text,
    /// Fenced block or inline span, passed through verbatim.
    Code,
}

/// One slice of the input document.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

impl Segment<'_> {
    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }
}

/// Splits `text` into an ordered sequence of text and code segments.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut plain_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let ch = bytes[i];
        if ch != b'`' && ch != b'~' {
            i += 1;
            continue;
        }

        let run = run_len(bytes, i);
        let at_line_start = i == 0 || bytes[i - 1] == b'\n';

        // a fence is only a fence on its own line; otherwise backtick runs
        // fall back to inline-span matching and tilde runs stay literal.
        let mut code_end = None;
        if run >= 3 && at_line_start {
            code_end = fence_end(bytes, i, run, ch);
        }
        if code_end.is_none() && ch == b'`' {
            code_end = inline_end(bytes, i, run);
        }

        match code_end {
            Some(end) => {
                if plain_start < i {
                    segments.push(Segment {
                        kind: SegmentKind::Text,
                        text: &text[plain_start..i],
                    });
                }
                segments.push(Segment {
                    kind: SegmentKind::Code,
                    text: &text[i..end],
                });
                plain_start = end;
                i = end;
            }
            // unterminated: the whole run is literal text, keep scanning
            // after it.
            None => i += run,
        }
    }

    if plain_start < text.len() {
        segments.push(Segment {
            kind: SegmentKind::Text,
            text: &text[plain_start..],
        });
    }
    segments
}

/// Length of the run of `bytes[start]` beginning at `start`.
fn run_len(bytes: &[u8], start: usize) -> usize {
    let ch = bytes[start];
    bytes[start..].iter().take_while(|&&b| b == ch).count()
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| p + from)
}

/// End (exclusive) of a fenced block opened at `open` with `n` fence chars,
/// or None when no closing line exists. The end sits just past the closing
/// run; the trailing newline stays outside the segment.
fn fence_end(bytes: &[u8], open: usize, n: usize, fence: u8) -> Option<usize> {
    // the opening line must be terminated; the info string is ignored.
    let info_newline = find_byte(bytes, b'\n', open + n)?;

    let mut line_start = info_newline + 1;
    while line_start <= bytes.len() {
        let line_end = find_byte(bytes, b'\n', line_start).unwrap_or(bytes.len());
        let mut line = &bytes[line_start..line_end];
        if let [head @ .., b'\r'] = line {
            line = head;
        }
        let ws = line.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
        let marks = line[ws..].iter().take_while(|&&b| b == fence).count();
        if marks == n && ws + marks == line.len() {
            return Some(line_start + ws + n);
        }
        if line_end == bytes.len() {
            return None;
        }
        line_start = line_end + 1;
    }
    None
}

/// End (exclusive) of an inline span of `n` backticks opened at `open`:
/// the next run of exactly `n` backticks closes it, runs of any other
/// length are content.
fn inline_end(bytes: &[u8], open: usize, n: usize) -> Option<usize> {
    let mut i = open + n;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let run = run_len(bytes, i);
            if run == n {
                return Some(i + n);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(segments: &'a [Segment<'a>]) -> Vec<(SegmentKind, &'a str)> {
        segments.iter().map(|s| (s.kind, s.text)).collect()
    }

    fn assert_tiles(input: &str) {
        let joined: String = split_segments(input).iter().map(|s| s.text).collect();
        assert_eq!(joined, input, "segments must reconstruct the input");
    }

    #[test]
    fn fenced_block_is_one_code_segment() {
        let input = "before\n```rust\nlet x = [[Home]];\n```\nafter";
        let segments = split_segments(input);
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Text, "before\n"),
                (SegmentKind::Code, "```rust\nlet x = [[Home]];\n```"),
                (SegmentKind::Text, "\nafter"),
            ]
        );
        assert_tiles(input);
    }

    #[test]
    fn tilde_fence_is_code() {
        let input = "~~~\n[link](x)\n~~~";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_code());
        assert_tiles(input);
    }

    #[test]
    fn longer_fence_wraps_shorter_fence_as_content() {
        let input = "````\n```\ninner\n```\n````";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1, "got: {segments:?}");
        assert!(segments[0].is_code());
        assert_eq!(segments[0].text, input);
    }

    #[test]
    fn fence_close_must_match_run_length() {
        // the 4-tick line cannot close a 3-tick fence, the later 3-tick
        // line does.
        let input = "```\na\n````\nb\n```";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, input);
    }

    #[test]
    fn fence_close_allows_leading_whitespace() {
        let input = "```\ncode\n  ```";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_code());
    }

    #[test]
    fn fence_requires_line_start() {
        // not a fence, but the backtick runs still pair up as an inline
        // span across the newline.
        let input = "x ```\ncode\n```";
        let segments = split_segments(input);
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Text, "x "),
                (SegmentKind::Code, "```\ncode\n```"),
            ]
        );
    }

    #[test]
    fn inline_span_protects_wikilink() {
        let input = "see `[[Home]]` here";
        let segments = split_segments(input);
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Text, "see "),
                (SegmentKind::Code, "`[[Home]]`"),
                (SegmentKind::Text, " here"),
            ]
        );
    }

    #[test]
    fn inline_span_closes_only_on_exact_run() {
        // the triple run is content of the single-tick span.
        let input = "`a ``` b`";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_code());
        assert_eq!(segments[0].text, input);
    }

    #[test]
    fn unterminated_inline_is_text() {
        let input = "a ``b` c";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_code());
        assert_tiles(input);
    }

    #[test]
    fn unterminated_fence_is_text() {
        let input = "```\nnever closed";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_code());
        assert_tiles(input);
    }

    #[test]
    fn single_line_tick_pair_is_inline_span() {
        // no newline after the opener, so it cannot be a fence.
        let input = "```x```";
        let segments = split_segments(input);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_code());
    }

    #[test]
    fn crlf_close_line_is_recognized() {
        let input = "```\r\ncode\r\n```\r\nafter";
        let segments = split_segments(input);
        assert!(segments[0].is_code(), "got: {segments:?}");
        assert_tiles(input);
    }

    #[test]
    fn tiling_holds_on_hostile_input() {
        for input in [
            "",
            "`",
            "``",
            "~~~",
            "``` \n",
            "a`b``c```d",
            "````\n```\n",
            "text `code` more `code`",
            "```\n```\n```\n",
        ] {
            assert_tiles(input);
        }
    }
}
