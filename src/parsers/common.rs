use anyhow::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    pub fn parse_source(&mut self, source: &str, file_path: &Path) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse file: {}", file_path.display()))?;
        Ok(tree)
    }

    /// Buffered read sized to the file so large sources are not reallocated
    pub fn read_source(&self, file_path: &Path) -> Result<String> {
        let file = File::open(file_path)?;
        let file_size = file.metadata()?.len() as usize;

        let mut reader =
            BufReader::with_capacity(if file_size < 8192 { file_size.max(1) } else { 8192 }, file);

        let mut content = String::with_capacity(file_size);
        reader.read_to_string(&mut content)?;
        Ok(content)
    }
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn find_child_by_kind<'t>(node: &TSNode<'t>, kind: &str) -> Option<TSNode<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

pub fn find_children_by_kind<'t>(node: &TSNode<'t>, kind: &str) -> Vec<TSNode<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// Strips `//` and `/* */` markers from a comment node's text.
pub fn comment_text(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(line) = raw.strip_prefix("//") {
        return line.trim().to_string();
    }
    if let Some(block) = raw.strip_prefix("/*") {
        return block.trim_end_matches("*/").trim().to_string();
    }
    raw.to_string()
}

/// Nearest sibling in `step` direction, skipping anonymous tokens such as terminators.
fn named_neighbour<'t>(
    node: &TSNode<'t>,
    step: impl Fn(&TSNode<'t>) -> Option<TSNode<'t>>,
) -> Option<TSNode<'t>> {
    let mut current = step(node);
    while let Some(sibling) = current {
        if sibling.is_named() {
            return Some(sibling);
        }
        current = step(&sibling);
    }
    None
}

/// Comment block that ends on the line directly above `node`.
pub fn leading_comment(node: &TSNode, source: &[u8]) -> Option<String> {
    let mut lines = Vec::new();
    let mut expected_row = node.start_position().row;
    let mut current = named_neighbour(node, |n| n.prev_sibling());

    while let Some(sibling) = current {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 != expected_row {
            break;
        }
        lines.push(comment_text(extract_text(&sibling, source)));
        expected_row = sibling.start_position().row;
        current = named_neighbour(&sibling, |n| n.prev_sibling());
    }

    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

/// Comment that starts on the same line `node` ends on.
pub fn trailing_comment(node: &TSNode, source: &[u8]) -> Option<String> {
    let row = node.end_position().row;
    let inner = node
        .child(node.child_count().saturating_sub(1))
        .filter(|last| last.kind() == "comment");
    let candidate = inner.or_else(|| named_neighbour(node, |n| n.next_sibling()))?;

    if candidate.kind() == "comment" && candidate.start_position().row == row {
        Some(comment_text(extract_text(&candidate, source)))
    } else {
        None
    }
}
