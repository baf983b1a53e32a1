//! Module file (`go.mod`) reading and module-cache path escaping.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::locator::relates_to_package;
use crate::error::{LocateError, Result};

pub const MODULE_FILE: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

impl Requirement {
    /// Directory name inside the module cache: `escape(path)@version`.
    pub fn cache_dir_name(&self) -> Result<String> {
        let escaped = escape_module_path(&self.path)?;
        if self.version.is_empty() {
            Ok(escaped)
        } else {
            Ok(format!("{}@{}", escaped, self.version))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFile {
    pub module: String,
    pub go_version: Option<String>,
    pub requires: Vec<Requirement>,
}

enum Block {
    None,
    Require,
    Other,
}

impl ModuleFile {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LocateError::io(path, e))?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut module = None;
        let mut go_version = None;
        let mut requires = Vec::new();
        let mut block = Block::None;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let (code, comment) = match raw_line.find("//") {
                Some(pos) => (&raw_line[..pos], &raw_line[pos + 2..]),
                None => (raw_line, ""),
            };
            let indirect = comment.trim() == "indirect" || comment.trim().starts_with("indirect;");
            let tokens = tokenize(code);
            if tokens.is_empty() {
                continue;
            }

            match block {
                Block::Require if tokens == [")"] => block = Block::None,
                Block::Require => {
                    requires.push(parse_requirement(path, line_number, &tokens, indirect)?);
                }
                Block::Other if tokens == [")"] => block = Block::None,
                Block::Other => {}
                Block::None => match (tokens[0].as_str(), &tokens[1..]) {
                    ("module", [name]) => module = Some(name.clone()),
                    ("module", _) => {
                        return Err(LocateError::module_parse(
                            path,
                            line_number,
                            "module directive expects one path",
                        ))
                    }
                    ("go", [version]) => go_version = Some(version.clone()),
                    ("require", [open]) if open == "(" => block = Block::Require,
                    ("require", rest) => {
                        requires.push(parse_requirement(path, line_number, rest, indirect)?);
                    }
                    (_, [open]) if open == "(" => block = Block::Other,
                    _ => {}
                },
            }
        }

        let module = module
            .filter(|name| !name.is_empty())
            .ok_or_else(|| LocateError::module_parse(path, 1, "missing module directive"))?;

        Ok(Self {
            module,
            go_version,
            requires,
        })
    }

    /// Requirement with the longest module path that is a segment prefix of `import_path`,
    /// so `cloud.google.com/go/storage` beats `cloud.google.com/go`.
    pub fn find_requirement(&self, import_path: &str) -> Option<&Requirement> {
        self.related_requirements(import_path).into_iter().next()
    }

    /// Every requirement relating to `import_path`, nested modules first.
    pub fn related_requirements(&self, import_path: &str) -> Vec<&Requirement> {
        let mut related: Vec<&Requirement> = self
            .requires
            .iter()
            .filter(|req| relates_to_package(&req.path, import_path))
            .collect();
        // Stable: equal depths keep declaration order
        related.sort_by_key(|req| std::cmp::Reverse(req.path.split('/').count()));
        related
    }
}

fn parse_requirement(
    path: &Path,
    line: usize,
    tokens: &[String],
    indirect: bool,
) -> Result<Requirement> {
    match tokens {
        [module, version] => Ok(Requirement {
            path: module.clone(),
            version: version.clone(),
            indirect,
        }),
        _ => Err(LocateError::module_parse(
            path,
            line,
            "require expects a module path and a version",
        )),
    }
}

/// Splits on whitespace, honouring "quoted" and `raw` strings and a bare `(`/`)`.
fn tokenize(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' || c == '`' {
            chars.next();
            let mut token = String::new();
            while let Some(inner) = chars.next() {
                match inner {
                    '\\' if c == '"' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    _ if inner == c => break,
                    _ => token.push(inner),
                }
            }
            tokens.push(token);
            continue;
        }
        if c == '(' || c == ')' {
            chars.next();
            tokens.push(c.to_string());
            continue;
        }

        let mut token = String::new();
        while let Some(&inner) = chars.peek() {
            if inner.is_whitespace() || inner == '(' || inner == ')' {
                break;
            }
            token.push(inner);
            chars.next();
        }
        tokens.push(token);
    }

    tokens
}

/// Case-folding escape used by the module cache: `Azure` → `!azure`.
pub fn escape_module_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(LocateError::invalid_module_path(path, "empty path"));
    }

    let mut escaped = String::with_capacity(path.len() + 4);
    for c in path.chars() {
        match c {
            '!' => return Err(LocateError::invalid_module_path(path, "contains '!'")),
            'A'..='Z' => {
                escaped.push('!');
                escaped.push(c.to_ascii_lowercase());
            }
            c if c.is_ascii_graphic() => escaped.push(c),
            _ => {
                return Err(LocateError::invalid_module_path(
                    path,
                    format!("invalid character {c:?}"),
                ))
            }
        }
    }
    Ok(escaped)
}

pub fn unescape_module_path(escaped: &str) -> Result<String> {
    let mut path = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();

    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some(lower @ 'a'..='z') => path.push(lower.to_ascii_uppercase()),
                _ => {
                    return Err(LocateError::invalid_module_path(
                        escaped,
                        "'!' must precede a lowercase letter",
                    ))
                }
            },
            'A'..='Z' => {
                return Err(LocateError::invalid_module_path(
                    escaped,
                    "unescaped uppercase letter",
                ))
            }
            _ => path.push(c),
        }
    }
    Ok(path)
}
