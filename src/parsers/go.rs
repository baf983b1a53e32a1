use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use tree_sitter::Node as TSNode;

use super::common::{
    extract_text, find_child_by_kind, find_children_by_kind, leading_comment, trailing_comment,
    TreeSitterParser,
};

/// Import as written in one source file. `alias` is set only for explicit renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    pub alias: Option<String>,
    pub raw_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationKind {
    Struct,
    /// `type A = B`
    Alias,
    /// Any other named type: `type Status string`, interfaces, maps.
    Named,
}

/// Wrapper peeled off a field type on the way to the named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeWrapper {
    Pointer,
    Slice,
    Array(String),
}

/// Named type a field refers to, e.g. `*[]models.User` → wrappers `*`, `[]`, package `models`, name `User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub wrappers: Vec<TypeWrapper>,
    pub package: Option<String>,
    pub name: String,
}

impl TypeRef {
    pub fn ops(&self) -> String {
        self.wrappers
            .iter()
            .map(|wrapper| match wrapper {
                TypeWrapper::Pointer => "*".to_string(),
                TypeWrapper::Slice => "[]".to_string(),
                TypeWrapper::Array(len) => format!("[{len}]"),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub type_expression: String,
    pub type_ref: Option<TypeRef>,
    /// Tag content without the surrounding quotes.
    pub tag: Option<String>,
    pub comment: Option<String>,
    pub line: usize,
}

impl FieldDeclaration {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub type_expression: String,
    pub fields: Vec<FieldDeclaration>,
    pub doc: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoFile {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<ImportDeclaration>,
    pub types: Vec<TypeDeclaration>,
}

pub struct GoParser {
    parser: TreeSitterParser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let parser = TreeSitterParser::new(tree_sitter_go::language())?;
        Ok(Self { parser })
    }

    pub fn parse_file(&mut self, file_path: &Path) -> Result<GoFile> {
        let source = self.parser.read_source(file_path)?;
        self.parse_source(&source, file_path)
    }

    pub fn parse_source(&mut self, source: &str, file_path: &Path) -> Result<GoFile> {
        let tree = self.parser.parse_source(source, file_path)?;
        let root = tree.root_node();
        let source = source.as_bytes();

        if root.has_error() {
            warn!("syntax errors in {}, using recovered tree", file_path.display());
        }

        Ok(GoFile {
            path: file_path.to_path_buf(),
            package: extract_package(&root, source),
            imports: extract_imports(&root, source),
            types: extract_types(&root, source),
        })
    }
}

fn extract_package(root: &TSNode, source: &[u8]) -> Option<String> {
    let clause = find_child_by_kind(root, "package_clause")?;
    let identifier = find_child_by_kind(&clause, "package_identifier")?;
    Some(extract_text(&identifier, source).to_string())
}

fn extract_imports(root: &TSNode, source: &[u8]) -> Vec<ImportDeclaration> {
    let mut imports = Vec::new();

    for declaration in find_children_by_kind(root, "import_declaration") {
        // Single import or parenthesised group
        if let Some(spec_list) = find_child_by_kind(&declaration, "import_spec_list") {
            for spec in find_children_by_kind(&spec_list, "import_spec") {
                imports.extend(process_import_spec(&spec, source));
            }
        } else if let Some(spec) = find_child_by_kind(&declaration, "import_spec") {
            imports.extend(process_import_spec(&spec, source));
        }
    }

    imports
}

fn process_import_spec(spec: &TSNode, source: &[u8]) -> Option<ImportDeclaration> {
    let path = spec.child_by_field_name("path")?;
    let alias = spec
        .child_by_field_name("name")
        .map(|name| extract_text(&name, source).to_string());

    Some(ImportDeclaration {
        alias,
        raw_path: unquote(extract_text(&path, source)),
    })
}

fn extract_types(root: &TSNode, source: &[u8]) -> Vec<TypeDeclaration> {
    let mut types = Vec::new();

    for declaration in find_children_by_kind(root, "type_declaration") {
        let specs: Vec<TSNode> = {
            let mut cursor = declaration.walk();
            declaration
                .children(&mut cursor)
                .filter(|child| matches!(child.kind(), "type_spec" | "type_alias"))
                .collect()
        };
        let grouped = specs.len() > 1 || find_child_by_kind(&declaration, "(").is_some();

        for spec in specs {
            // Ungrouped declarations carry their doc comment above the `type` keyword
            let doc = if grouped {
                leading_comment(&spec, source)
            } else {
                leading_comment(&declaration, source)
            };
            if let Some(mut decl) = process_type_spec(&spec, source) {
                decl.doc = doc;
                types.push(decl);
            }
        }
    }

    types
}

fn process_type_spec(spec: &TSNode, source: &[u8]) -> Option<TypeDeclaration> {
    let name = spec.child_by_field_name("name")?;
    let type_node = spec.child_by_field_name("type")?;

    let (kind, fields) = if spec.kind() == "type_alias" {
        (DeclarationKind::Alias, Vec::new())
    } else if type_node.kind() == "struct_type" {
        (DeclarationKind::Struct, process_struct_fields(&type_node, source))
    } else {
        (DeclarationKind::Named, Vec::new())
    };

    Some(TypeDeclaration {
        name: extract_text(&name, source).to_string(),
        kind,
        type_expression: extract_text(&type_node, source).to_string(),
        fields,
        doc: None,
        line: spec.start_position().row + 1,
    })
}

fn process_struct_fields(struct_node: &TSNode, source: &[u8]) -> Vec<FieldDeclaration> {
    let Some(field_list) = find_child_by_kind(struct_node, "field_declaration_list") else {
        return Vec::new();
    };

    find_children_by_kind(&field_list, "field_declaration")
        .iter()
        .filter_map(|field| process_field(field, source))
        .collect()
}

fn process_field(field: &TSNode, source: &[u8]) -> Option<FieldDeclaration> {
    let type_node = field.child_by_field_name("type")?;

    // `a, b int` declares several names sharing one type
    let names = find_children_by_kind(field, "field_identifier")
        .iter()
        .map(|identifier| extract_text(identifier, source).to_string())
        .collect();

    let tag = field
        .child_by_field_name("tag")
        .map(|tag| unquote(extract_text(&tag, source)));

    Some(FieldDeclaration {
        names,
        type_expression: extract_text(&type_node, source).to_string(),
        type_ref: resolve_type_ref(type_node, source),
        tag,
        comment: trailing_comment(field, source),
        line: field.start_position().row + 1,
    })
}

/// Peels pointers, slices and arrays down to a bare or package-qualified type name.
fn resolve_type_ref(node: TSNode, source: &[u8]) -> Option<TypeRef> {
    let mut wrappers = Vec::new();
    let mut current = node;

    loop {
        match current.kind() {
            "pointer_type" => {
                wrappers.push(TypeWrapper::Pointer);
                current = current.named_child(0)?;
            }
            "slice_type" => {
                wrappers.push(TypeWrapper::Slice);
                current = current.child_by_field_name("element")?;
            }
            "array_type" => {
                let length = current
                    .child_by_field_name("length")
                    .map(|len| extract_text(&len, source).to_string())
                    .unwrap_or_default();
                wrappers.push(TypeWrapper::Array(length));
                current = current.child_by_field_name("element")?;
            }
            "parenthesized_type" => {
                current = current.named_child(0)?;
            }
            "type_identifier" => {
                return Some(TypeRef {
                    wrappers,
                    package: None,
                    name: extract_text(&current, source).to_string(),
                });
            }
            "qualified_type" => {
                let package = current.child_by_field_name("package")?;
                let name = current.child_by_field_name("name")?;
                return Some(TypeRef {
                    wrappers,
                    package: Some(extract_text(&package, source).to_string()),
                    name: extract_text(&name, source).to_string(),
                });
            }
            // maps, channels, funcs, generics, inline structs
            _ => return None,
        }
    }
}

/// Strips the quotes of an interpreted ("...") or raw (`...`) string literal.
fn unquote(literal: &str) -> String {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
    {
        return raw.to_string();
    }
    if let Some(interpreted) = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return interpreted.replace("\\\"", "\"").replace("\\\\", "\\");
    }
    literal.to_string()
}
