//! Recognition and in-place rewriting of the statements cmkit owns inside a
//! `CMakeLists.txt`. The manifest is never parsed; only the statements below
//! are located by pattern and everything around them is kept byte for byte.
//!
//! * file list, one per directory manifest: `file(GLOB SOURCES_BIN "main.cpp")`
//! * build rule, one in the root manifest:
//!   `target_sources(${PROJECT_NAME} PRIVATE ${SOURCES_BIN} ${SOURCES_LIB})`

pub mod sync;

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

/// Marker line after which a missing file list is inserted.
pub const SOURCES_ANCHOR: &str = "# @cmkit sources";
/// Marker line after which a missing build rule is inserted.
pub const BUILD_RULE_ANCHOR: &str = "# @cmkit build-rule";

/// Head of a file list: `file(GLOB <VAR>`, keywords in any case.
static FILE_LIST_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?miR)^[ \t]*(file)[ \t]*\(\s*GLOB\s+([A-Za-z0-9_]+)")
        .expect("file list pattern compiles")
});

/// Head of any `target_sources(` call; the arguments decide whether it is ours.
static BUILD_RULE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^[ \t]*((?i:target_sources))[ \t]*\(")
        .expect("build rule pattern compiles")
});

static SOURCES_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{SOURCES_[A-Za-z0-9_]*\}$").expect("sources reference pattern compiles")
});

static SOURCES_ANCHOR_LINE: LazyLock<Regex> = LazyLock::new(|| anchor_pattern(SOURCES_ANCHOR));
static BUILD_RULE_ANCHOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| anchor_pattern(BUILD_RULE_ANCHOR));

fn anchor_pattern(anchor: &str) -> Regex {
    Regex::new(&format!(r"(?mR)^[ \t]*{}[ \t]*$", regex::escape(anchor)))
        .expect("anchor pattern compiles")
}

/// How a statement ended up in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Replaced,
    Inserted,
    Appended,
}

pub fn render_file_list(variable: &str, files: &[String]) -> String {
    let mut out = format!("file(GLOB {variable}");
    for file in files {
        out.push_str(" \"");
        out.push_str(file);
        out.push('"');
    }
    out.push(')');
    out
}

pub fn render_build_rule(variables: &[String]) -> String {
    let mut out = String::from("target_sources(${PROJECT_NAME} PRIVATE");
    for variable in variables {
        out.push_str(" ${");
        out.push_str(variable);
        out.push('}');
    }
    out.push(')');
    out
}

/// The line in a subdirectory manifest that hands its list up to the root,
/// where the build rule expands it.
pub fn render_export(variable: &str) -> String {
    format!("set({variable} ${{{variable}}} PARENT_SCOPE)")
}

/// A statement found by its head and closed at its matching `)`.
struct Statement<'t> {
    /// From the command name through the closing paren.
    span: Range<usize>,
    /// Text between the head match and the closing paren.
    rest: &'t str,
    caps: Captures<'t>,
}

fn statements<'t>(text: &'t str, head: &Regex) -> Vec<Statement<'t>> {
    let mut found = Vec::new();
    let mut floor = 0;
    for caps in head.captures_iter(text) {
        let (Some(name), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        if name.start() < floor {
            continue;
        }
        let Some(end) = closing_paren(text, whole.end()) else {
            debug!(at = name.start(), "unterminated statement ignored");
            continue;
        };
        floor = end;
        found.push(Statement {
            span: name.start()..end,
            rest: &text[whole.end()..end - 1],
            caps,
        });
    }
    found
}

/// Offset just past the `)` closing a statement whose arguments start at
/// `from`. Quoted arguments, escapes, comments and nested parens are skipped.
fn closing_paren(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'#' if text[i..].starts_with("#[[") => {
                i = text[i..].find("]]").map(|at| i + at + 1)?;
            }
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Byte ranges of every file list statement binding exactly `variable`.
pub fn find_file_lists(text: &str, variable: &str) -> Vec<Range<usize>> {
    statements(text, &FILE_LIST_HEAD)
        .into_iter()
        .filter(|st| &st.caps[2] == variable)
        // `SOURCES_BIN${X}` names some other variable
        .filter(|st| {
            st.rest
                .bytes()
                .next()
                .is_none_or(|b| b.is_ascii_whitespace() || b == b'#')
        })
        .map(|st| st.span)
        .collect()
}

/// Byte ranges of every `target_sources(${PROJECT_NAME} PRIVATE ${SOURCES_..} ..)`
/// call. Calls with any other argument belong to the user.
pub fn find_build_rules(text: &str) -> Vec<Range<usize>> {
    statements(text, &BUILD_RULE_HEAD)
        .into_iter()
        .filter(|st| is_aggregate_rule(st.rest))
        .map(|st| st.span)
        .collect()
}

fn is_aggregate_rule(args: &str) -> bool {
    let code: Vec<&str> = args
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(code, _)| code))
        .collect();
    let mut tokens = code.into_iter().flat_map(str::split_whitespace);
    tokens.next() == Some("${PROJECT_NAME}")
        && tokens.next() == Some("PRIVATE")
        && tokens.all(|token| SOURCES_REF.is_match(token))
}

/// Bind `variable` to `files` in a directory manifest.
///
/// An existing statement is replaced in place and any later duplicates are
/// dropped. Otherwise the statement goes on the line after the sources anchor,
/// or at the end of the text when there is no anchor.
pub fn upsert_file_list(text: &str, variable: &str, files: &[String]) -> (String, Edit) {
    let section = render_file_list(variable, files);
    let spans = find_file_lists(text, variable);

    if !spans.is_empty() {
        return (replace_first(text, &spans, &section), Edit::Replaced);
    }

    if let Some(at) = SOURCES_ANCHOR_LINE.find(text).map(|m| m.end()) {
        return (insert_line_after(text, at, &section), Edit::Inserted);
    }

    (append_line(text, &section), Edit::Appended)
}

/// Point the root build rule at `variables`.
///
/// Returns `None` when the text has neither a rule nor the build-rule anchor;
/// the caller must then leave the manifest alone.
pub fn upsert_build_rule(text: &str, variables: &[String]) -> Option<(String, Edit)> {
    let rule = render_build_rule(variables);
    let spans = find_build_rules(text);

    if !spans.is_empty() {
        return Some((replace_first(text, &spans, &rule), Edit::Replaced));
    }

    BUILD_RULE_ANCHOR_LINE
        .find(text)
        .map(|m| (insert_line_after(text, m.end(), &rule), Edit::Inserted))
}

/// Put `statement` where `spans[0]` was and remove the other spans with their lines.
fn replace_first(text: &str, spans: &[Range<usize>], statement: &str) -> String {
    let mut out = String::with_capacity(text.len() + statement.len());
    let Some((first, duplicates)) = spans.split_first() else {
        return text.to_string();
    };
    out.push_str(&text[..first.start]);
    out.push_str(statement);
    let mut cursor = first.end;
    for dup in duplicates {
        let line = whole_line(text, dup.clone());
        debug!(statement, "dropping duplicate statement");
        out.push_str(&text[cursor..line.start]);
        cursor = line.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// `at` is the end of a line's content, before its terminator.
fn insert_line_after(text: &str, at: usize, line: &str) -> String {
    let eol = line_ending(text);
    let mut out = String::with_capacity(text.len() + line.len() + eol.len());
    out.push_str(&text[..at]);
    out.push_str(eol);
    out.push_str(line);
    out.push_str(&text[at..]);
    out
}

fn append_line(text: &str, line: &str) -> String {
    let eol = line_ending(text);
    let mut out = String::with_capacity(text.len() + line.len() + 2 * eol.len());
    out.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(line);
    out.push_str(eol);
    out
}

/// Widen a statement span to its full line(s) when nothing else shares them.
fn whole_line(text: &str, span: Range<usize>) -> Range<usize> {
    let line_start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let start = if text[line_start..span.start].trim().is_empty() {
        line_start
    } else {
        span.start
    };

    let rest = &text[span.end..];
    let (tail, terminated) = match rest.find('\n') {
        Some(i) => (&rest[..i], true),
        None => (rest, false),
    };
    let end = if tail.trim().is_empty() {
        span.end + tail.len() + usize::from(terminated)
    } else {
        span.end
    };

    start..end
}
