//! Text-level patching of `pyproject.toml` manifests.
//!
//! The manifest is never parsed and re-serialized here. Each edit locates a
//! fixed anchor (the `dependencies = [` line, or a `[tool.uv.*]` header) and
//! splices new text next to it, leaving every other byte alone so comments,
//! key order and hand formatting survive.
//!
//! All functions are pure: they take the current text and return either
//! [`Patched::Changed`] with the new text, [`Patched::Unchanged`] when the
//! target state already holds, or a [`ManifestError`] when the expected
//! structure is missing. Presence checks are literal substring matches on
//! the quoted value, never semantic comparisons.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::ManifestError;

/// Header of the uv workspace section.
pub const WORKSPACE_HEADER: &str = "[tool.uv.workspace]";

/// Header of the uv sources section.
pub const SOURCES_HEADER: &str = "[tool.uv.sources]";

/// Literal form of the dependency list anchor, used in error messages.
pub const DEPENDENCIES_ANCHOR: &str = "dependencies = [";

/// Indentation used when a list has no element to copy it from.
const DEFAULT_INDENT: &str = "    ";

static DEPENDENCIES_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*dependencies[ \t]*=[ \t]*\[").expect("dependencies anchor regex")
});

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[ \t]*(?:"([^"]*)"|'([^']*)'|([A-Za-z0-9_.\-]+))[ \t]*="#)
        .expect("key line regex")
});

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("bare key regex"));

/// Result of a patch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patched {
    /// The document was edited; holds the new text.
    Changed(String),
    /// The target state already holds; nothing to write.
    Unchanged,
}

impl Patched {
    /// Whether the document text changed.
    pub fn is_changed(&self) -> bool {
        matches!(self, Patched::Changed(_))
    }

    /// The resulting text, falling back to `original` when unchanged.
    pub fn into_text(self, original: &str) -> String {
        match self {
            Patched::Changed(text) => text,
            Patched::Unchanged => original.to_string(),
        }
    }
}

/// Prepend `entry` to the first `dependencies = [` list.
///
/// Fails when no such list exists. A no-op when `"entry"` or `'entry'`
/// already appears anywhere in the document.
pub fn add_dependency(document: &str, entry: &str) -> Result<Patched, ManifestError> {
    let anchor = DEPENDENCIES_LINE
        .find(document)
        .ok_or(ManifestError::MissingAnchor {
            anchor: DEPENDENCIES_ANCHOR,
        })?;

    if contains_quoted(document, entry) {
        return Ok(Patched::Unchanged);
    }

    let eol = line_ending(document);
    let open_end = anchor.end();
    let line_end = document[open_end..]
        .find('\n')
        .map_or(document.len(), |i| open_end + i);
    let rest = &document[open_end..line_end];
    let (code, _) = split_comment(rest);

    let mut out = String::with_capacity(document.len() + entry.len() + 8);

    if code.trim().is_empty() {
        // Multi-line list: new element goes on its own line after the anchor.
        let next_line = document[line_end..]
            .strip_prefix('\n')
            .and_then(|tail| tail.split('\n').next());
        let indent = match next_line {
            Some(line) if !line.trim_start().starts_with(']') && !line.trim().is_empty() => {
                leading_whitespace(line).to_string()
            }
            Some(line) => format!("{}{}", leading_whitespace(line), DEFAULT_INDENT),
            None => DEFAULT_INDENT.to_string(),
        };

        if line_end < document.len() {
            out.push_str(&document[..=line_end]);
            out.push_str(&format!("{}{},{}", indent, quote(entry), eol));
            out.push_str(&document[line_end + 1..]);
        } else {
            out.push_str(document);
            out.push_str(&format!("{}{}{},", eol, indent, quote(entry)));
        }
    } else {
        let skip = code.len() - code.trim_start().len();
        let at = open_end + skip;
        let element = if code.trim_start().starts_with(']') {
            quote(entry)
        } else {
            format!("{}, ", quote(entry))
        };
        out.push_str(&document[..at]);
        out.push_str(&element);
        out.push_str(&document[at..]);
    }

    Ok(Patched::Changed(out))
}

/// Make sure `member` is listed in `[tool.uv.workspace].members`.
///
/// Creates the section at the end of the document when it is missing.
/// Fails rather than guessing when the section has no `members` list or the
/// list's closing bracket cannot be located.
pub fn ensure_workspace_member(document: &str, member: &str) -> Result<Patched, ManifestError> {
    let lines = split_lines(document);
    let eol = line_ending(document);

    let Some(section) = find_section(&lines, WORKSPACE_HEADER) else {
        let body = format!("members = [{}]", quote(member));
        return Ok(Patched::Changed(append_section(
            document,
            WORKSPACE_HEADER,
            &body,
        )));
    };

    if lines[section.body()]
        .iter()
        .any(|line| contains_quoted(line, member))
    {
        return Ok(Patched::Unchanged);
    }

    let members_idx = section
        .body()
        .find(|&i| key_of(lines[i]).as_deref() == Some("members"))
        .ok_or_else(|| malformed(WORKSPACE_HEADER, "section has no `members` list"))?;

    let members_line = lines[members_idx];
    let open = list_open(members_line)
        .ok_or_else(|| malformed(WORKSPACE_HEADER, "`members` is not a list"))?;

    if let Some(close) = find_list_close(members_line, open) {
        let inner = &members_line[open + 1..close];
        let kept = inner.trim_end();
        let rewritten = if kept.trim().is_empty() {
            format!(
                "{}{}{}",
                &members_line[..open + 1],
                quote(member),
                &members_line[close..]
            )
        } else {
            let sep = if kept.ends_with(',') { " " } else { ", " };
            format!(
                "{}{}{}{}",
                &members_line[..open + 1 + kept.len()],
                sep,
                quote(member),
                &members_line[close..]
            )
        };
        return Ok(Patched::Changed(replace_lines(
            &lines,
            members_idx,
            1,
            &[rewritten],
        )));
    }

    let close_idx = find_closing_line(
        &lines,
        members_idx + 1,
        section.end,
        bracket_delta(members_line),
    )?;

    // Indent for a new element when no earlier element line sets one.
    let close_line = lines[close_idx];
    let fallback_indent = if split_comment(close_line).0.trim_start().starts_with(']') {
        format!("{}{}", leading_whitespace(close_line), DEFAULT_INDENT)
    } else {
        leading_whitespace(close_line).to_string()
    };

    // Last line holding an element, possibly the `members = [` line itself.
    let last_element = (members_idx..close_idx).rev().find(|&i| {
        let line = if i == members_idx {
            &members_line[open + 1..]
        } else {
            lines[i]
        };
        !split_comment(line).0.trim().is_empty()
    });

    let mut replacement = Vec::new();
    let start = match last_element {
        Some(i) => {
            let indent = if i == members_idx {
                fallback_indent
            } else {
                leading_whitespace(lines[i]).to_string()
            };
            let line = lines[i];
            let (code, comment) = split_comment(line);
            let code_trimmed = code.trim_end();
            if code_trimmed.ends_with(',') {
                replacement.extend(lines[i..close_idx].iter().map(|l| l.to_string()));
            } else {
                let mut fixed = String::from(code_trimmed);
                fixed.push(',');
                fixed.push_str(&code[code_trimmed.len()..]);
                fixed.push_str(comment);
                replacement.push(fixed);
                replacement.extend(lines[i + 1..close_idx].iter().map(|l| l.to_string()));
            }
            replacement.push(format!("{}{},{}", indent, quote(member), eol));
            i
        }
        None => {
            replacement.push(format!("{}{},{}", fallback_indent, quote(member), eol));
            close_idx
        }
    };

    Ok(Patched::Changed(replace_lines(
        &lines,
        start,
        close_idx - start,
        &replacement,
    )))
}

/// Make sure `[tool.uv.sources]` binds `package` to the workspace.
///
/// A no-op when the section already has a key exactly equal to `package`,
/// whatever its value. Otherwise the binding goes directly under the header,
/// creating the section at the end of the document when needed.
pub fn ensure_source_binding(document: &str, package: &str) -> Result<Patched, ManifestError> {
    let lines = split_lines(document);
    let eol = line_ending(document);
    let binding = format!("{} = {{ workspace = true }}", toml_key(package));

    let Some(section) = find_section(&lines, SOURCES_HEADER) else {
        return Ok(Patched::Changed(append_section(
            document,
            SOURCES_HEADER,
            &binding,
        )));
    };

    let mut depth = 0i32;
    for i in section.body() {
        if depth == 0 && key_of(lines[i]).as_deref() == Some(package) {
            return Ok(Patched::Unchanged);
        }
        depth += bracket_delta(lines[i]);
    }

    let header = lines[section.header];
    let mut replacement = Vec::with_capacity(2);
    if header.ends_with('\n') {
        replacement.push(header.to_string());
    } else {
        replacement.push(format!("{}{}", header, eol));
    }
    replacement.push(format!("{}{}", binding, eol));

    Ok(Patched::Changed(replace_lines(
        &lines,
        section.header,
        1,
        &replacement,
    )))
}

/// Whether the document has the `dependencies = [` line [`add_dependency`]
/// edits.
pub fn has_dependency_anchor(document: &str) -> bool {
    DEPENDENCIES_LINE.is_match(document)
}

/// Whether the document has a `[header]` table, as the edits locate it.
pub fn has_section(document: &str, header: &str) -> bool {
    find_section(&split_lines(document), header).is_some()
}

/// Line range of a `[header]` section. `end` is exclusive.
#[derive(Debug, Clone, Copy)]
struct Section {
    header: usize,
    end: usize,
}

impl Section {
    fn body(&self) -> std::ops::Range<usize> {
        self.header + 1..self.end
    }
}

fn find_section(lines: &[&str], header: &str) -> Option<Section> {
    let mut depth = 0i32;
    let mut start = None;

    for (i, line) in lines.iter().enumerate() {
        if depth == 0 && is_table_header(line) {
            if start.is_some() {
                return start.map(|header| Section { header, end: i });
            }
            if split_comment(line).0.trim() == header {
                start = Some(i);
                continue;
            }
        }
        depth = (depth + bracket_delta(line)).max(0);
    }

    start.map(|header| Section {
        header,
        end: lines.len(),
    })
}

/// Scan forward for the line holding the `]` that closes a multi-line list.
///
/// `depth` is the bracket depth left open by the key line. The closing line
/// may also hold the last element (`    "apps/b"]`). Hitting another key or a
/// table header first means the list is not where we expect it, so that is
/// an error rather than a place to insert.
fn find_closing_line(
    lines: &[&str],
    from: usize,
    end: usize,
    mut depth: i32,
) -> Result<usize, ManifestError> {
    for (i, line) in lines.iter().enumerate().take(end).skip(from) {
        let code = split_comment(line).0.trim();
        if key_of(line).is_some() || is_table_header(line) {
            return Err(malformed(
                WORKSPACE_HEADER,
                format!(
                    "`members` list is not closed before line {} (`{}`)",
                    i + 1,
                    code
                ),
            ));
        }
        depth += bracket_delta(line);
        if depth <= 0 {
            return Ok(i);
        }
    }

    Err(malformed(
        WORKSPACE_HEADER,
        "closing `]` of the `members` list not found in the section",
    ))
}

fn malformed(section: &'static str, reason: impl Into<String>) -> ManifestError {
    ManifestError::Malformed {
        section,
        reason: reason.into(),
    }
}

/// Append `[header]` followed by `body` at the end of the document.
fn append_section(document: &str, header: &str, body: &str) -> String {
    let eol = line_ending(document);
    let mut out = document.to_string();

    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push_str(eol);
        }
        if !out.ends_with(&format!("{}{}", eol, eol)) {
            out.push_str(eol);
        }
    }

    out.push_str(header);
    out.push_str(eol);
    out.push_str(body);
    out.push_str(eol);
    out
}

/// Split into lines, keeping each line's terminator.
fn split_lines(document: &str) -> Vec<&str> {
    document.split_inclusive('\n').collect()
}

/// Rebuild the document with `count` lines at `start` replaced.
fn replace_lines(lines: &[&str], start: usize, count: usize, replacement: &[String]) -> String {
    let mut out = String::new();
    for line in &lines[..start] {
        out.push_str(line);
    }
    for line in replacement {
        out.push_str(line);
    }
    for line in &lines[start + count..] {
        out.push_str(line);
    }
    out
}

fn line_ending(document: &str) -> &'static str {
    if document.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

fn contains_quoted(haystack: &str, value: &str) -> bool {
    haystack.contains(&format!("\"{}\"", value)) || haystack.contains(&format!("'{}'", value))
}

/// Render a table key, quoting it unless it is a valid bare key.
fn toml_key(key: &str) -> String {
    if BARE_KEY.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// The unquoted key of a `key = value` line.
fn key_of(line: &str) -> Option<String> {
    let caps = KEY_LINE.captures(line)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

fn is_table_header(line: &str) -> bool {
    let code = split_comment(line).0.trim();
    code.starts_with('[') && code.ends_with(']') && key_of(line).is_none()
}

/// Byte index of the `[` opening the value of a `key = [` line.
fn list_open(line: &str) -> Option<usize> {
    let eq = KEY_LINE.find(line)?.end();
    let after = &line[eq..];
    let skip = after.len() - after.trim_start().len();
    after.trim_start().starts_with('[').then_some(eq + skip)
}

/// Byte index of the `]` matching the `[` at `open`, on the same line.
fn find_list_close(line: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q == '"' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => return None,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Net count of `[` minus `]` outside strings and comments.
fn bracket_delta(line: &str) -> i32 {
    let (code, _) = split_comment(line);
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in code.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q == '"' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' => delta += 1,
            ']' => delta -= 1,
            _ => {}
        }
    }

    // Table headers are not arrays.
    if is_header_shape(code) {
        0
    } else {
        delta
    }
}

fn is_header_shape(code: &str) -> bool {
    let code = code.trim();
    code.starts_with('[') && code.ends_with(']') && !code.contains('=')
}

/// Split a line into its code and a trailing `#` comment (with terminator).
fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q == '"' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => return (&line[..i], &line[i..]),
            '\r' | '\n' => return (&line[..i], &line[i..]),
            _ => {}
        }
    }
    (line, "")
}
