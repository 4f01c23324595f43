//! @ai:module:intent Extract comment blocks from source text, without parsing the host language
//! @ai:module:layer application
//! @ai:module:public_api extract_comment_blocks, CommentBlock, CommentLine
//! @ai:module:depends_on language
//! @ai:module:stateless true

use crate::language::{CommentStyle, Language};

/// @ai:intent Represents a block of consecutive comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub lines: Vec<CommentLine>,
    pub start_line: usize,
    pub end_line: usize,
}

/// @ai:intent Represents a single comment line with its comment syntax stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub line_number: usize,
    pub content: String,
}

/// @ai:intent Extract all comment blocks from source content
/// @ai:post consecutive line comments form one block; each block comment forms its own
/// @ai:post block text is dedented by its common indentation
/// @ai:effects pure
pub fn extract_comment_blocks(content: &str, language: Language) -> Vec<CommentBlock> {
    let style = language.comment_style();
    let mut builder = BlockBuilder::default();
    let mut in_block_comment = false;

    for (line_idx, line) in content.lines().enumerate() {
        let line_number = line_idx + 1;
        let trimmed = line.trim_start();

        if in_block_comment {
            let end = style.block_end.unwrap_or("*/");
            match line.find(end) {
                Some(idx) => {
                    let head = &line[..idx];
                    let inner = block_body_line(head, head.trim_start(), &style);
                    if !inner.trim().is_empty() {
                        builder.push(line_number, inner);
                    }
                    builder.finish();
                    in_block_comment = false;
                }
                None => builder.push(line_number, block_body_line(line, trimmed, &style)),
            }
            continue;
        }

        if trimmed.is_empty() {
            builder.finish();
            continue;
        }

        if let Some(comment) = strip_line_comment(trimmed, &style) {
            builder.push(line_number, comment.to_string());
            continue;
        }

        if let (Some(start), Some(end)) = (style.block_start, style.block_end) {
            if let Some(rest) = trimmed.strip_prefix(start) {
                builder.finish();
                match rest.find(end) {
                    Some(idx) => {
                        builder.push(line_number, rest[..idx].trim().to_string());
                        builder.finish();
                    }
                    None => {
                        let opening = strip_gutter(rest.trim(), &style);
                        if !opening.is_empty() {
                            builder.push(line_number, opening);
                        }
                        in_block_comment = true;
                    }
                }
                continue;
            }
        }

        builder.finish();
    }

    builder.finish();
    builder.blocks
}

/// @ai:intent Extract comment content from a single line comment
/// @ai:example ("// @sloth service") -> Some("@sloth service")
/// @ai:example ("//   version: 1") -> Some("  version: 1")
/// @ai:effects pure
fn strip_line_comment<'a>(line: &'a str, style: &CommentStyle) -> Option<&'a str> {
    let rest = style
        .line_prefixes
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))?;
    Some(rest.strip_prefix([' ', '\t']).unwrap_or(rest))
}

/// Inner line of a block comment: either `* text` gutter style or raw text.
fn block_body_line(line: &str, trimmed: &str, style: &CommentStyle) -> String {
    match style.block_line_prefix {
        Some(prefix) if trimmed.starts_with(prefix) => strip_gutter(trimmed, style),
        _ => line.trim_end().to_string(),
    }
}

fn strip_gutter(text: &str, style: &CommentStyle) -> String {
    let text = text.trim_end();
    match style.block_line_prefix {
        Some(prefix) => match text.trim_start().strip_prefix(prefix) {
            Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).to_string(),
            None => text.to_string(),
        },
        None => text.to_string(),
    }
}

#[derive(Default)]
struct BlockBuilder {
    current: Option<CommentBlock>,
    blocks: Vec<CommentBlock>,
}

impl BlockBuilder {
    fn push(&mut self, line_number: usize, content: String) {
        let comment_line = CommentLine {
            line_number,
            content,
        };

        match &mut self.current {
            Some(block) => {
                block.lines.push(comment_line);
                block.end_line = line_number;
            }
            None => {
                self.current = Some(CommentBlock {
                    lines: vec![comment_line],
                    start_line: line_number,
                    end_line: line_number,
                });
            }
        }
    }

    fn finish(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.dedent();
            self.blocks.push(block);
        }
    }
}

impl CommentBlock {
    /// @ai:intent Build a block from already-stripped text, one line per text line
    /// @ai:effects pure
    pub fn from_text(start_line: usize, text: &str) -> Self {
        let lines: Vec<CommentLine> = text
            .lines()
            .enumerate()
            .map(|(idx, content)| CommentLine {
                line_number: start_line + idx,
                content: content.to_string(),
            })
            .collect();
        let end_line = lines.last().map_or(start_line, |l| l.line_number);

        Self {
            lines,
            start_line,
            end_line,
        }
    }

    /// @ai:intent Comment text handed to the directive grammar
    /// @ai:effects pure
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// @ai:intent Map a line offset within the block to a source line number
    pub fn source_line(&self, offset: usize) -> usize {
        self.lines
            .get(offset)
            .map_or(self.start_line + offset, |l| l.line_number)
    }

    fn dedent(&mut self) {
        let common = self
            .lines
            .iter()
            .filter(|l| !l.content.trim().is_empty())
            .map(|l| l.content.len() - l.content.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);

        for line in &mut self.lines {
            if line.content.trim().is_empty() {
                line.content.clear();
            } else {
                line.content.replace_range(..common, "");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(content: &str, language: Language) -> Vec<String> {
        extract_comment_blocks(content, language)
            .iter()
            .map(CommentBlock::text)
            .collect()
    }

    #[test]
    fn test_go_line_comments_keep_indentation() {
        let source = "package main\n\n// @sloth service checkout\n//   version: 1.2\nfunc main() {}\n";
        let blocks = extract_comment_blocks(source, Language::Go);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 3);
        assert_eq!(blocks[0].end_line, 4);
        assert_eq!(blocks[0].text(), "@sloth service checkout\n  version: 1.2");
    }

    #[test]
    fn test_blank_and_code_lines_split_blocks() {
        let source = "// first\n\n// second\nx := 1\n// third\n";
        assert_eq!(
            texts(source, Language::Go),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn test_empty_comment_line_stays_in_block() {
        let source = "// @sloth service a\n//\n// Prose.\n";
        assert_eq!(texts(source, Language::Go), vec!["@sloth service a\n\nProse.".to_string()]);
    }

    #[test]
    fn test_rust_doc_comments() {
        let source = "//! @sloth service checkout\n/// @sloth slo\n///   name: a\n";
        assert_eq!(
            texts(source, Language::Rust),
            vec!["@sloth service checkout\n@sloth slo\n  name: a".to_string()]
        );
    }

    #[test]
    fn test_python_hash_comments() {
        let source = "# @sloth service checkout\n#   version: 2\ndef handler():\n    pass\n";
        assert_eq!(
            texts(source, Language::Python),
            vec!["@sloth service checkout\n  version: 2".to_string()]
        );
    }

    #[test]
    fn test_block_comment_with_gutter() {
        let source = "/*\n * @sloth slos\n *   - name: a\n *     objective: 99\n */\nfunc f() {}\n";
        let blocks = extract_comment_blocks(source, Language::Go);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 2);
        assert_eq!(
            blocks[0].text(),
            "@sloth slos\n  - name: a\n    objective: 99"
        );
    }

    #[test]
    fn test_block_comment_without_gutter_is_dedented() {
        let source = "/*\n    @sloth service checkout\n      version: 3\n*/\n";
        assert_eq!(
            texts(source, Language::Go),
            vec!["@sloth service checkout\n  version: 3".to_string()]
        );
    }

    #[test]
    fn test_closing_line_with_text_keeps_indentation() {
        let source = "/*\n    @sloth service checkout\n      version: 3 */\n";
        let blocks = extract_comment_blocks(source, Language::Go);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 3);
        assert_eq!(blocks[0].text(), "@sloth service checkout\n  version: 3");
    }

    #[test]
    fn test_closing_line_with_gutter_text() {
        let source = "/*\n * @sloth slos\n *   - name: a\n *     objective: 99 */\n";
        assert_eq!(
            texts(source, Language::Go),
            vec!["@sloth slos\n  - name: a\n    objective: 99".to_string()]
        );
    }

    #[test]
    fn test_python_docstring() {
        let source = "def f():\n    \"\"\"\n    @sloth service checkout\n      version: 3\n    \"\"\"\n";
        assert_eq!(
            texts(source, Language::Python),
            vec!["@sloth service checkout\n  version: 3".to_string()]
        );
    }

    #[test]
    fn test_javadoc_opening_line() {
        let source = "/**\n * @sloth service checkout\n */\n";
        assert_eq!(
            texts(source, Language::Java),
            vec!["@sloth service checkout".to_string()]
        );
    }

    #[test]
    fn test_single_line_block_comment() {
        let source = "/* @sloth service checkout */\n";
        assert_eq!(
            texts(source, Language::Go),
            vec!["@sloth service checkout".to_string()]
        );
    }

    #[test]
    fn test_source_line_mapping() {
        let block = CommentBlock::from_text(10, "a\nb\nc");
        assert_eq!(block.end_line, 12);
        assert_eq!(block.source_line(2), 12);
    }
}
