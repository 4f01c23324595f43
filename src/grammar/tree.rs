//! @ai:module:intent Read the indented `key: value` body of a directive group into a tree
//! @ai:module:layer domain
//! @ai:module:public_api parse, Node, Entry, Item
//! @ai:module:depends_on lexer
//! @ai:module:stateless true

use super::lexer::Line;
use super::DirectiveError;
use crate::specification::Labels;
use regex::Regex;
use std::sync::LazyLock;

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*)\s*:(?:\s+(.*))?$").expect("Invalid regex")
});

/// @ai:intent A value in a directive body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A key with neither a value nor a nested block.
    Empty,
    Scalar(String),
    Map(Vec<Entry>),
    List(Vec<Item>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub line: usize,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub line: usize,
    pub value: Node,
}

/// @ai:intent Parse body lines into a tree rooted at the first line's indentation
/// @ai:pre lines come from a single directive group, in order
/// @ai:post every map in the result has unique keys
/// @ai:effects pure
pub fn parse(lines: &[Line<'_>]) -> Result<Node, DirectiveError> {
    let Some(first) = lines.first() else {
        return Ok(Node::Empty);
    };

    let mut cursor = Cursor {
        lines: lines.to_vec(),
        pos: 0,
    };
    let node = cursor.node(first.indent)?;

    match cursor.peek() {
        Some(line) => Err(DirectiveError::malformed(
            line.number,
            "indentation does not match any enclosing level",
        )),
        None => Ok(node),
    }
}

struct Cursor<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn node(&mut self, indent: usize) -> Result<Node, DirectiveError> {
        match self.peek() {
            Some(line) if list_item(line.content).is_some() => self.list(indent),
            Some(_) => self.map(indent),
            None => Ok(Node::Empty),
        }
    }

    /// Block nested under the line just consumed, if the next line is deeper.
    fn nested(&mut self, indent: usize) -> Result<Option<Node>, DirectiveError> {
        match self.peek() {
            Some(next) if next.indent > indent => self.node(next.indent).map(Some),
            _ => Ok(None),
        }
    }

    fn map(&mut self, indent: usize) -> Result<Node, DirectiveError> {
        let mut entries: Vec<Entry> = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(DirectiveError::malformed(line.number, "unexpected indentation"));
            }
            if list_item(line.content).is_some() {
                return Err(DirectiveError::malformed(
                    line.number,
                    "list item where a key was expected",
                ));
            }

            let (key, value) = split_key_value(line.content).ok_or_else(|| {
                DirectiveError::malformed(
                    line.number,
                    format!("expected `key: value`, found `{}`", line.content),
                )
            })?;

            if entries.iter().any(|e| e.key == key) {
                return Err(DirectiveError::DuplicateKeyInEntry {
                    line: line.number,
                    key: key.to_string(),
                });
            }

            self.pos += 1;
            let nested = self.nested(indent)?;
            let value = match (value, nested) {
                (None, Some(node)) => node,
                (None, None) => Node::Empty,
                (Some(text), None) => Node::Scalar(unquote(text).to_string()),
                (Some(_), Some(_)) => {
                    return Err(DirectiveError::malformed(
                        line.number,
                        format!("`{key}` has both a value and a nested block"),
                    ));
                }
            };

            entries.push(Entry {
                key: key.to_string(),
                line: line.number,
                value,
            });
        }

        Ok(Node::Map(entries))
    }

    fn list(&mut self, indent: usize) -> Result<Node, DirectiveError> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(DirectiveError::malformed(line.number, "unexpected indentation"));
            }
            let Some(rest) = list_item(line.content) else {
                return Err(DirectiveError::malformed(
                    line.number,
                    "expected a `- ` list item",
                ));
            };

            let value = if rest.is_empty() {
                self.pos += 1;
                self.nested(indent)?.unwrap_or(Node::Empty)
            } else {
                // Keys after "- " align the rest of the item.
                let item_indent = indent + (line.content.len() - rest.len());
                self.lines[self.pos] = Line {
                    indent: item_indent,
                    content: rest,
                    ..line
                };
                self.node(item_indent)?
            };

            items.push(Item {
                line: line.number,
                value,
            });
        }

        Ok(Node::List(items))
    }
}

fn list_item(content: &str) -> Option<&str> {
    if content == "-" {
        return Some("");
    }
    content.strip_prefix("- ").map(str::trim_start)
}

fn split_key_value(content: &str) -> Option<(&str, Option<&str>)> {
    let captures = KEY_VALUE.captures(content)?;
    let key = captures.get(1)?.as_str();
    let value = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty());
    Some((key, value))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Empty => "empty value",
            Node::Scalar(_) => "scalar",
            Node::Map(_) => "map",
            Node::List(_) => "list",
        }
    }

    /// @ai:intent Entries of a map value, treating an empty value as an empty map
    pub fn entries(&self, line: usize, field: &str) -> Result<&[Entry], DirectiveError> {
        match self {
            Node::Map(entries) => Ok(entries),
            Node::Empty => Ok(&[]),
            other => Err(DirectiveError::malformed(
                line,
                format!("`{field}` must be a map, found a {}", other.kind_name()),
            )),
        }
    }

    /// @ai:intent Read a map of scalars, such as labels or annotations
    pub fn to_string_map(&self, line: usize, field: &str) -> Result<Labels, DirectiveError> {
        let mut map = Labels::new();
        for entry in self.entries(line, field)? {
            let value = entry.scalar()?.unwrap_or_default();
            map.insert(entry.key.clone(), value.to_string());
        }
        Ok(map)
    }
}

impl Entry {
    /// @ai:intent Scalar value of this entry, None when the value is empty
    pub fn scalar(&self) -> Result<Option<&str>, DirectiveError> {
        match &self.value {
            Node::Scalar(value) => Ok(Some(value.as_str())),
            Node::Empty => Ok(None),
            other => Err(DirectiveError::malformed(
                self.line,
                format!("`{}` must be a single value, found a {}", self.key, other.kind_name()),
            )),
        }
    }
}
