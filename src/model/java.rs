//! Lightweight Java declaration scanner.
//!
//! This is not a Java parser. It recovers just enough structure for the
//! generator: package, class names (nested ones included), Javadoc block
//! tags, type parameters, the `extends` clause and constructor signatures.
//!
//! Scanning runs over a *masked* copy of the source in which comments and
//! string/char literals are blanked out byte-for-byte, so offsets in the
//! masked text are valid offsets into the original.
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{display_source, Constructor, Declaration, Param, Tag, TypeRef};

static PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpackage\s+([\w.]+)\s*;").expect("package regex"));
static CLASS_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").expect("class regex"));
static EXTENDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bextends\s+").expect("extends regex"));
static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[\w.$]+(\s*\([^)]*\))?").expect("annotation regex"));
static NAMED_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|(\S+))"#).expect("named param regex")
});

const MODIFIERS: &[&str] = &["public", "protected", "private"];

// ------------------------------ Entry ------------------------------------ //

/// Every class declared in one compilation unit, in source order.
pub fn parse_compilation_unit(src: &str, path: Option<&Path>) -> Vec<Declaration> {
    let masked = mask(src);
    let package = PACKAGE
        .captures(&masked)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let mut out = Vec::new();
    for caps in CLASS_KEYWORD.captures_iter(&masked) {
        let (Some(kw), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
        // `Foo.class` literals
        if masked[..kw.start()].trim_end().ends_with('.') {
            continue;
        }
        match parse_class(src, &masked, kw.start(), name.end(), name.as_str()) {
            Some(mut decl) => {
                decl.package = package.clone();
                decl.source = path.map(Path::to_path_buf);
                out.push(decl);
            }
            None => tracing::debug!(
                class = name.as_str(),
                source = %display_source(path),
                "class header without a body; ignored"
            ),
        }
    }
    tracing::trace!(source = %display_source(path), classes = out.len(), "scanned");
    out
}

fn parse_class(
    src: &str,
    masked: &str,
    kw_start: usize,
    name_end: usize,
    name: &str,
) -> Option<Declaration> {
    let body_open = name_end + masked[name_end..].find('{')?;
    let body_close = matching_forward(masked, body_open, b'{', b'}')?;

    let mut header = &masked[name_end..body_open];
    let mut type_parameters = Vec::new();
    if header.trim_start().starts_with('<') {
        let open = name_end + masked[name_end..].find('<')?;
        let close = matching_forward(masked, open, b'<', b'>')?;
        type_parameters = parse_type_parameters(&masked[open + 1..close]);
        header = &masked[close + 1..body_open];
    }

    let superclass = EXTENDS.find(header).map(|m| {
        let text = normalize_type(read_type(&header[m.end()..]));
        let resolved = !type_parameters.iter().any(|p| p == super::erase(&text));
        TypeRef { text, resolved }
    });

    let mut decl = Declaration::new("", name);
    decl.superclass = superclass.filter(|t| !t.text.is_empty());
    decl.tags = doc_comment_before(src, masked, kw_start)
        .map(parse_doc_tags)
        .unwrap_or_default();
    decl.constructors =
        find_constructors(&masked[body_open + 1..body_close], name, &type_parameters);
    decl.type_parameters = type_parameters;
    Some(decl)
}

// ------------------------------ Masking ---------------------------------- //

/// Blank comments and literal contents, keeping byte offsets and newlines.
pub(crate) fn mask(src: &str) -> String {
    fn blank(out: &mut [u8], from: usize, to: usize) {
        let to = to.min(out.len());
        let from = from.min(to);
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
        bytes.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
    }

    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < len {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = find_from(bytes, i, b"\n").unwrap_or(len);
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = find_from(bytes, i + 2, b"*/").map(|p| p + 2).unwrap_or(len);
                blank(&mut out, i, end);
                i = end;
            }
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                // unterminated blocks run to the end of the source
                let (to, end) = match find_from(bytes, i + 3, b"\"\"\"") {
                    Some(close) => (close, close + 3),
                    None => (len, len),
                };
                blank(&mut out, i + 3, to);
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < len && bytes[j] != quote && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                blank(&mut out, i + 1, j);
                i = j + 1;
            }
            _ => i += 1,
        }
    }
    // Blanked regions start and end on ASCII delimiters, so multi-byte
    // characters are either copied whole or replaced whole.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

// ----------------------------- Doc comments ------------------------------ //

/// The Javadoc block attached to the declaration starting at `kw_start`.
fn doc_comment_before<'s>(src: &'s str, masked: &str, kw_start: usize) -> Option<&'s str> {
    let decl_start = masked[..kw_start]
        .rfind(|c| matches!(c, ';' | '{' | '}'))
        .map(|p| p + 1)
        .unwrap_or(0);
    let region = &src[decl_start..kw_start];
    let open = region.rfind("/**")?;
    let close = region[open..].find("*/")? + open + 2;
    Some(&region[open..close])
}

/// Block tags (`@name value`) of a doc comment, continuation lines folded in.
pub fn parse_doc_tags(doc: &str) -> Vec<Tag> {
    let inner = doc.trim_start_matches("/**").trim_end_matches("*/");
    let mut tags = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in inner.lines() {
        let line = line.trim_start();
        let line = line.strip_prefix('*').unwrap_or(line).trim();
        let tag_start = line.strip_prefix('@').and_then(|rest| {
            let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let is_name = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-');
            is_name.then_some((name, value))
        });
        if let Some((name, value)) = tag_start {
            if let Some((n, v)) = current.take() {
                tags.push(make_tag(n, v));
            }
            current = Some((name.to_string(), value.trim().to_string()));
        } else if let Some((_, value)) = current.as_mut() {
            if !line.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line);
            }
        }
    }
    if let Some((n, v)) = current {
        tags.push(make_tag(n, v));
    }
    tags
}

fn make_tag(name: String, value: String) -> Tag {
    let mut tag = Tag { name, ..Tag::default() };
    for caps in NAMED_PARAM.captures_iter(&value) {
        let v = caps.get(2).or(caps.get(3)).or(caps.get(4)).map(|m| m.as_str()).unwrap_or("");
        tag.params.insert(caps[1].to_string(), v.to_string());
    }
    tag.value = value;
    tag
}

// ----------------------------- Constructors ------------------------------ //

fn find_constructors(body: &str, name: &str, class_params: &[String]) -> Vec<Constructor> {
    let Ok(call) = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name))) else {
        return Vec::new();
    };
    let depth = brace_depths(body);

    let mut out = Vec::new();
    for m in call.find_iter(body) {
        if depth[m.start()] != 0 {
            continue;
        }
        let Some(ctor_params) = constructor_prefix(&body[..m.start()]) else { continue };
        let open = m.end() - 1;
        let Some(close) = matching_forward(body, open, b'(', b')') else { continue };
        let after = body[close + 1..].trim_start();
        if !(after.starts_with('{') || after.starts_with("throws")) {
            continue;
        }
        let scope: Vec<&str> = class_params
            .iter()
            .chain(ctor_params.iter())
            .map(String::as_str)
            .collect();
        out.push(Constructor::new(name, parse_params(&body[open + 1..close], &scope)));
    }
    out
}

/// Decide whether the text before `Name(` ends like a constructor header.
/// Returns the constructor's own type parameters when it does.
fn constructor_prefix(before: &str) -> Option<Vec<String>> {
    let prev = before.trim_end();
    match prev.chars().last() {
        None | Some(';' | '{' | '}' | ')') => Some(Vec::new()),
        Some('>') => {
            let close = prev.len() - 1;
            let open = matching_backward(prev, close, b'<', b'>')?;
            // `<T> Name(`, unless the `<..>` belongs to a return type
            let head = prev[..open].trim_end();
            match trailing_ident(head) {
                Some(word) if !MODIFIERS.contains(&word) && !is_annotation(head, word) => None,
                _ => Some(parse_type_parameters(&prev[open + 1..close])),
            }
        }
        Some(_) => {
            let word = trailing_ident(prev)?;
            (MODIFIERS.contains(&word) || is_annotation(prev, word)).then(Vec::new)
        }
    }
}

fn trailing_ident(s: &str) -> Option<&str> {
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)?;
    Some(&s[start..])
}

fn is_annotation(s: &str, word: &str) -> bool {
    s[..s.len() - word.len()].ends_with('@')
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn parse_params(text: &str, scope: &[&str]) -> Vec<Param> {
    split_top_level(text)
        .into_iter()
        .filter_map(|raw| {
            let cleaned = ANNOTATION.replace_all(raw, " ");
            let cleaned = normalize_type(&cleaned);
            let cleaned = cleaned.strip_prefix("final ").unwrap_or(&cleaned);
            let (ty, name) = cleaned.rsplit_once(' ')?;
            let resolved = !scope.contains(&super::erase(ty));
            Some(Param::new(TypeRef { text: ty.to_string(), resolved }, name))
        })
        .collect()
}

fn parse_type_parameters(inner: &str) -> Vec<String> {
    split_top_level(inner)
        .into_iter()
        .filter_map(|p| p.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

// ------------------------------ Helpers ---------------------------------- //

/// Split on commas that are not nested inside `<>` or `()`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                out.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(text[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// Read one type expression (`a.b.Bar<X, List<Y>>`) off the front of `s`.
fn read_type(s: &str) -> &str {
    let s = s.trim_start();
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            _ if depth > 0 => {}
            c if is_ident_char(c) || c == '.' => {}
            c if c.is_whitespace() && s[i..].trim_start().starts_with('<') => {}
            _ => return s[..i].trim_end(),
        }
    }
    s.trim_end()
}

/// Collapse whitespace; no spaces inside brackets, one after each comma.
fn normalize_type(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let mut skip_space = false;
    for c in collapsed.chars() {
        match c {
            '<' | '[' | ',' | '>' | ']' => {
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push(c);
                if c == ',' {
                    out.push(' ');
                }
                skip_space = matches!(c, '<' | '[' | ',');
            }
            ' ' if skip_space => {}
            _ => {
                out.push(c);
                skip_space = false;
            }
        }
    }
    out
}

fn matching_forward(s: &str, open_ix: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in s.as_bytes().iter().enumerate().skip(open_ix) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn matching_backward(s: &str, close_ix: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close_ix).rev() {
        let b = s.as_bytes()[i];
        if b == close {
            depth += 1;
        } else if b == open {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Brace nesting depth at every byte of `body`.
fn brace_depths(body: &str) -> Vec<u32> {
    let mut depth = 0u32;
    body.bytes()
        .map(|b| {
            let here = depth;
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            here
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //
