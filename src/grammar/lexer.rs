//! @ai:module:intent Classify comment blocks and find the extent of each directive group
//! @ai:module:layer domain
//! @ai:module:public_api classify, Classification, DirectiveGroup, DirectiveKind, Line, Span
//! @ai:module:stateless true

use regex::Regex;
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@sloth[.\s]\s*(service|slos?)(?:\s+(.*))?$").expect("Invalid regex")
});

/// @ai:intent Which grammar a directive group belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Service,
    Slo,
}

/// Inclusive range of line offsets within a comment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// @ai:intent One body line of a directive group with its indentation width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub indent: usize,
    pub content: &'a str,
}

/// @ai:intent A marker line together with the indented body that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveGroup<'a> {
    pub kind: DirectiveKind,
    pub span: Span,
    pub argument: Option<&'a str>,
    pub body: Vec<Line<'a>>,
}

/// @ai:intent Result of scanning one comment block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    NotADirective,
    Directives(Vec<DirectiveGroup<'a>>),
}

/// @ai:intent Split a comment block into directive groups
/// @ai:pre text has its comment syntax already stripped
/// @ai:post groups are returned in source order and never overlap
/// @ai:example ("just a doc comment") -> NotADirective
/// @ai:example ("@sloth service checkout") -> Directives([Service])
/// @ai:effects pure
pub fn classify(text: &str) -> Classification<'_> {
    let mut groups = Vec::new();
    let mut current: Option<DirectiveGroup<'_>> = None;

    for (number, raw) in text.lines().enumerate() {
        let content = raw.trim_end();

        if content.is_empty() {
            if let Some(group) = current.take() {
                groups.push(group);
            }
            continue;
        }

        let indent = indentation(content);
        if indent == 0 {
            if let Some(group) = current.take() {
                groups.push(group);
            }
            current = open_group(number, content);
            continue;
        }

        if let Some(group) = current.as_mut() {
            group.body.push(Line {
                number,
                indent,
                content: &content[indent..],
            });
            group.span.end = number;
        }
    }

    if let Some(group) = current {
        groups.push(group);
    }

    if groups.is_empty() {
        Classification::NotADirective
    } else {
        Classification::Directives(groups)
    }
}

/// @ai:intent Start a group if the line is a recognized marker
/// @ai:effects pure
fn open_group(number: usize, content: &str) -> Option<DirectiveGroup<'_>> {
    let captures = MARKER.captures(content)?;
    let kind = match captures.get(1)?.as_str() {
        "service" => DirectiveKind::Service,
        _ => DirectiveKind::Slo,
    };
    let argument = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|arg| !arg.is_empty());

    Some(DirectiveGroup {
        kind,
        span: Span {
            start: number,
            end: number,
        },
        argument,
        body: Vec::new(),
    })
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

impl<'a> Classification<'a> {
    /// @ai:intent Iterate over the groups of one kind
    pub fn groups(&self, kind: DirectiveKind) -> impl Iterator<Item = &DirectiveGroup<'a>> {
        let groups: &[DirectiveGroup<'a>] = match self {
            Classification::NotADirective => &[],
            Classification::Directives(groups) => groups,
        };
        groups.iter().filter(move |g| g.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(text: &str) -> Vec<DirectiveGroup<'_>> {
        match classify(text) {
            Classification::Directives(groups) => groups,
            Classification::NotADirective => Vec::new(),
        }
    }

    #[test]
    fn test_plain_comment_is_not_a_directive() {
        assert_eq!(
            classify("Handler serves the checkout API.\nIt is safe for concurrent use."),
            Classification::NotADirective
        );
    }

    #[test]
    fn test_marker_must_start_at_column_zero() {
        assert_eq!(classify("  @sloth service checkout"), Classification::NotADirective);
        assert_eq!(classify("see @sloth service"), Classification::NotADirective);
    }

    #[test]
    fn test_marker_variants() {
        let text = "@sloth.service a\n\n@sloth slo\n\n@sloth.slos\n\n@sloth servicex\n\n@sloth service-foo\n\n@sloth slos: a";
        let kinds: Vec<_> = groups(text).iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![DirectiveKind::Service, DirectiveKind::Slo, DirectiveKind::Slo]
        );
    }

    #[test]
    fn test_group_collects_indented_body() {
        let text = "@sloth service checkout\n  version: 1.2\n  labels:\n    team: payments";
        let found = groups(text);
        assert_eq!(found.len(), 1);

        let group = &found[0];
        assert_eq!(group.argument, Some("checkout"));
        assert_eq!(group.span, Span { start: 0, end: 3 });
        assert_eq!(group.body.len(), 3);
        assert_eq!(group.body[2].indent, 4);
        assert_eq!(group.body[2].content, "team: payments");
    }

    #[test]
    fn test_group_ends_at_blank_line() {
        let text = "@sloth service checkout\n  version: 2\n\n  unrelated: text";
        let found = groups(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body.len(), 1);
        assert_eq!(found[0].span.end, 1);
    }

    #[test]
    fn test_group_ends_at_dedent() {
        let text = "@sloth service checkout\n  version: 2\nMore prose here.\n  indented: prose";
        let found = groups(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body.len(), 1);
    }

    #[test]
    fn test_two_groups_in_one_block() {
        let text = "@sloth service checkout\n  version: 2\n@sloth slos\n  - name: a\n    objective: 99";
        let found = groups(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, DirectiveKind::Service);
        assert_eq!(found[1].kind, DirectiveKind::Slo);
        assert_eq!(found[1].span, Span { start: 2, end: 4 });
    }
}
