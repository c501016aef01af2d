//! View-template transpile.
//!
//! Packages author their view in an indentation-based grammar (one element
//! per line, children nested by indent). The transpiler turns it into
//! markup for the component framework. Interpolation uses the `{$ ... $}`
//! delimiter pair so template expressions never collide with the
//! framework's own `{...}` syntax.
//!
//! Grammar, per line:
//!
//! ```text
//! tag.class#id(attr="value", other="{$expr$}") inline text
//! | bare text line
//! // comment (dropped)
//! ```
//!
//! A bare `.class` or `#id` line defaults the tag to `div`. Malformed
//! indentation degrades to best-effort output; the transpiler never fails.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Lower-case tag followed by a class attribute: the framework dialect
    // wants className there.
    static ref CLASS_ATTR_RE: Regex = Regex::new(r#"(<[a-z]+.+)(class)(=".+"*>)"#).unwrap();
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Compile raw view source into markup.
///
/// When `indented` is false the source is assumed to already be markup and
/// is passed through unchanged.
pub fn compile(source: &str, indented: bool) -> String {
    if !indented {
        return source.to_string();
    }
    let html = transpile(source);
    // Quoting artifacts around pure interpolations: "{$x$}" becomes {$x$}
    // so attribute expressions survive as framework expressions.
    let html = html.replace("\"{", "{").replace("}\"", "}");
    CLASS_ATTR_RE
        .replace_all(&html, "${1}className${3}")
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPILER
// ═══════════════════════════════════════════════════════════════════════════════

struct ElementLine {
    tag: String,
    classes: Vec<String>,
    id: Option<String>,
    attrs: Vec<(String, Option<String>)>,
    text: String,
}

fn transpile(source: &str) -> String {
    let mut out = String::new();
    // Open elements: (source indent, tag)
    let mut stack: Vec<(usize, String)> = Vec::new();

    for raw in source.lines() {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let indent = raw.len() - trimmed.len();
        close_until(&mut out, &mut stack, indent);

        if let Some(text) = trimmed.strip_prefix('|') {
            emit_line(&mut out, stack.len(), text.trim_start());
            continue;
        }

        let line = parse_element_line(trimmed);
        let open = render_open_tag(&line);
        let depth = stack.len();
        if VOID_TAGS.contains(&line.tag.as_str()) {
            emit_line(&mut out, depth, &format!("{}/>", open.trim_end_matches('>')));
        } else {
            emit_line(&mut out, depth, &open);
            if !line.text.is_empty() {
                emit_line(&mut out, depth + 1, &line.text);
            }
            stack.push((indent, line.tag));
        }
    }

    close_until(&mut out, &mut stack, 0);
    out.trim_end().to_string()
}

fn close_until(out: &mut String, stack: &mut Vec<(usize, String)>, indent: usize) {
    while let Some((open_indent, _)) = stack.last() {
        if *open_indent < indent {
            break;
        }
        if let Some((_, tag)) = stack.pop() {
            emit_line(out, stack.len(), &format!("</{}>", tag));
        }
    }
}

fn emit_line(out: &mut String, depth: usize, content: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(content);
    out.push('\n');
}

fn render_open_tag(line: &ElementLine) -> String {
    let mut tag = format!("<{}", line.tag);
    if !line.classes.is_empty() {
        tag.push_str(&format!(" class=\"{}\"", line.classes.join(" ")));
    }
    if let Some(id) = &line.id {
        tag.push_str(&format!(" id=\"{}\"", id));
    }
    for (name, value) in &line.attrs {
        match value {
            Some(value) => tag.push_str(&format!(" {}=\"{}\"", name, value)),
            None => tag.push_str(&format!(" {}", name)),
        }
    }
    tag.push('>');
    tag
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_element_line(line: &str) -> ElementLine {
    let chars: Vec<char> = line.chars().collect();
    let mut pos = 0;

    let mut tag = String::new();
    while pos < chars.len() && is_name_char(chars[pos]) {
        tag.push(chars[pos]);
        pos += 1;
    }
    if tag.is_empty() {
        tag = "div".to_string();
    }

    let mut classes = Vec::new();
    let mut id = None;
    while pos < chars.len() && (chars[pos] == '.' || chars[pos] == '#') {
        let marker = chars[pos];
        pos += 1;
        let mut name = String::new();
        while pos < chars.len() && is_name_char(chars[pos]) {
            name.push(chars[pos]);
            pos += 1;
        }
        if marker == '.' {
            classes.push(name);
        } else {
            id = Some(name);
        }
    }

    let mut attrs = Vec::new();
    if pos < chars.len() && chars[pos] == '(' {
        pos += 1;
        let mut body = String::new();
        let mut quote: Option<char> = None;
        while pos < chars.len() {
            let c = chars[pos];
            match quote {
                Some(q) if c == q => quote = None,
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == ')' => {
                    pos += 1;
                    break;
                }
                _ => {}
            }
            body.push(c);
            pos += 1;
        }
        attrs = parse_attrs(&body);
    }

    let text = chars[pos..].iter().collect::<String>().trim().to_string();

    ElementLine {
        tag,
        classes,
        id,
        attrs,
        text,
    }
}

fn parse_attrs(body: &str) -> Vec<(String, Option<String>)> {
    let mut attrs = Vec::new();
    let chars: Vec<char> = body.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        while pos < chars.len() && (chars[pos] == ',' || chars[pos].is_whitespace()) {
            pos += 1;
        }
        let mut name = String::new();
        while pos < chars.len() && chars[pos] != '=' && chars[pos] != ',' && !chars[pos].is_whitespace() {
            name.push(chars[pos]);
            pos += 1;
        }
        if name.is_empty() {
            break;
        }
        if pos < chars.len() && chars[pos] == '=' {
            pos += 1;
            let value = if pos < chars.len() && (chars[pos] == '"' || chars[pos] == '\'') {
                let q = chars[pos];
                pos += 1;
                let mut v = String::new();
                while pos < chars.len() && chars[pos] != q {
                    v.push(chars[pos]);
                    pos += 1;
                }
                pos += 1; // closing quote
                v
            } else {
                let mut v = String::new();
                while pos < chars.len() && chars[pos] != ',' && !chars[pos].is_whitespace() {
                    v.push(chars[pos]);
                    pos += 1;
                }
                v
            };
            attrs.push((name, Some(value)));
        } else {
            attrs.push((name, None));
        }
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_passes_through_unchanged() {
        let markup = "<div class=\"x\">{$title$}</div>";
        assert_eq!(compile(markup, false), markup);
    }

    #[test]
    fn nested_elements() {
        let source = "div\n  span hello";
        let html = compile(source, true);
        assert_eq!(html, "<div>\n  <span>\n    hello\n  </span>\n</div>");
    }

    #[test]
    fn class_attribute_becomes_class_name() {
        let html = compile("div.card big", true);
        assert!(html.contains("<div className=\"card\">"), "{}", html);
        assert!(html.contains("big"));
    }

    #[test]
    fn id_and_bare_shorthand_default_to_div() {
        let html = compile("#root\n  .inner", true);
        assert!(html.contains("<div id=\"root\">"), "{}", html);
        assert!(html.contains("className=\"inner\""), "{}", html);
    }

    #[test]
    fn interpolated_attribute_loses_quotes() {
        let html = compile("span(title=\"{$label$}\") {$label$}", true);
        assert!(html.contains("title={$label$}"), "{}", html);
        assert!(html.contains("{$label$}"));
    }

    #[test]
    fn void_tags_self_close() {
        let html = compile("div\n  img(src=\"/a.png\")\n  br", true);
        assert!(html.contains("<img src=\"/a.png\"/>"), "{}", html);
        assert!(html.contains("<br/>"), "{}", html);
    }

    #[test]
    fn text_lines_and_comments() {
        let html = compile("p\n  | line one\n  // dropped\n  | line two", true);
        assert!(html.contains("line one"));
        assert!(html.contains("line two"));
        assert!(!html.contains("dropped"));
    }

    #[test]
    fn upper_case_component_tags_keep_class() {
        // The dialect rewrite targets lower-case tags only.
        let html = compile("Card(class=\"x\")", true);
        assert!(html.contains("<Card class=\"x\">"), "{}", html);
    }
}
