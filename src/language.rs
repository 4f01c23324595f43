//! @ai:module:intent Define language-specific comment formats
//! @ai:module:layer domain
//! @ai:module:public_api Language, CommentStyle, detect_language
//! @ai:module:stateless true

use crate::error::Error;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// @ai:intent Represents a supported programming language with its comment syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Java,
    C,
    Cpp,
}

/// @ai:intent Comment style configuration for a language
#[derive(Debug, Clone)]
pub struct CommentStyle {
    /// Longest prefix first, so `///` wins over `//`.
    pub line_prefixes: Vec<&'static str>,
    pub block_start: Option<&'static str>,
    pub block_end: Option<&'static str>,
    pub block_line_prefix: Option<&'static str>,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Go,
        Language::Rust,
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Java,
        Language::C,
        Language::Cpp,
    ];

    /// @ai:intent Get the comment style for this language
    /// @ai:effects pure
    pub fn comment_style(&self) -> CommentStyle {
        match self {
            Language::Rust => CommentStyle {
                line_prefixes: vec!["///", "//!", "//"],
                block_start: Some("/*"),
                block_end: Some("*/"),
                block_line_prefix: Some("*"),
            },
            Language::Python => CommentStyle {
                line_prefixes: vec!["#"],
                block_start: Some("\"\"\""),
                block_end: Some("\"\"\""),
                block_line_prefix: None,
            },
            Language::Go
            | Language::TypeScript
            | Language::JavaScript
            | Language::Java
            | Language::C
            | Language::Cpp => CommentStyle {
                line_prefixes: vec!["//"],
                block_start: Some("/*"),
                block_end: Some("*/"),
                block_line_prefix: Some("*"),
            },
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyi"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
        }
    }

    /// @ai:intent Get language name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    /// @ai:example ("golang") -> Ok(Go)
    /// @ai:example ("cobol") -> Err(UnknownLanguage)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "python" | "py" => Ok(Language::Python),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "javascript" | "js" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            _ => Err(Error::UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// @ai:intent Detect the programming language from a file path
/// @ai:pre path is a valid file path
/// @ai:post result is Some if extension is recognized
/// @ai:example ("main.go") -> Some(Go)
/// @ai:example ("test.py") -> Some(Python)
/// @ai:example ("test.txt") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    Language::ALL
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_go() {
        assert_eq!(detect_language(Path::new("main.go")), Some(Language::Go));
    }

    #[test]
    fn test_detect_python() {
        assert_eq!(
            detect_language(Path::new("test.py")),
            Some(Language::Python)
        );
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(detect_language(Path::new("test.txt")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn test_parse_language_names() {
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert_eq!("Rust".parse::<Language>().unwrap(), Language::Rust);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(Error::UnknownLanguage(name)) if name == "cobol"
        ));
    }
}
