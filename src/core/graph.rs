use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, EdgeRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace, warn};

use super::location::Location;
use super::locator::PackageLocator;
use crate::parsers::cache::{CacheStats, PackageCache};
use crate::parsers::{
    DeclarationKind, FieldDeclaration, GoFile, GoPackage, GoParser, ImportDeclaration, StructTag,
    TypeDeclaration, TypeRef,
};

pub const DEFAULT_TAG_KEY: &str = "json";

/// Tag value that drops a field from serialization entirely.
const OMIT_FIELD: &str = "-";
const OMIT_EMPTY: &str = "omitempty";

/// Globally unique key of a type declaration, whatever alias was used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIdentity {
    pub import_path: String,
    pub type_name: String,
}

impl TypeIdentity {
    pub fn new(import_path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            type_name: type_name.into(),
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.import_path, self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Serialized name; `name` unless the tag renames it.
    pub external_name: String,
    pub omit_when_empty: bool,
    pub raw_type_expression: String,
    pub comment: Option<String>,
    pub tag: Option<String>,
    pub type_ref: Option<TypeRef>,
}

impl Field {
    /// `*`, `[]` and `[N]` prefix of the field type, outermost first.
    pub fn type_ops(&self) -> String {
        self.type_ref
            .as_ref()
            .map(TypeRef::ops)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub identity: TypeIdentity,
    /// Package that owns the declaration.
    pub location: Location,
    pub owner_directory: PathBuf,
    pub owner_file: PathBuf,
    /// Imports of `owner_file`, used to resolve qualified field types.
    pub imports: Vec<ImportDeclaration>,
    pub declaration: TypeDeclaration,
    pub struct_fields: Vec<Field>,
}

impl TypeDefinition {
    pub fn new(location: Location, file: &GoFile, declaration: &TypeDeclaration, tag_key: &str) -> Self {
        Self {
            identity: TypeIdentity::new(&location.import_path, &declaration.name),
            owner_directory: location.directory.clone(),
            owner_file: file.path.clone(),
            imports: file.imports.clone(),
            struct_fields: derive_fields(&declaration.fields, tag_key),
            declaration: declaration.clone(),
            location,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.identity.type_name
    }

    pub fn is_struct(&self) -> bool {
        self.declaration.kind == DeclarationKind::Struct
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Exported, named fields with tag-derived serialization names. Embedded fields are skipped.
pub fn derive_fields(declarations: &[FieldDeclaration], tag_key: &str) -> Vec<Field> {
    let mut fields = Vec::new();

    for declaration in declarations {
        let tag = declaration.tag.as_deref().and_then(|raw| match StructTag::parse(raw) {
            Ok(tag) => Some(tag),
            Err(e) => {
                warn!("failed to parse tag at line {}: {}", declaration.line, e);
                None
            }
        });
        let entry = tag.as_ref().and_then(|tag| tag.get(tag_key));

        if entry.is_some_and(|entry| entry.value() == OMIT_FIELD) {
            continue;
        }

        for name in declaration.names.iter().filter(|name| is_exported(name)) {
            let mut field = Field {
                name: name.clone(),
                external_name: name.clone(),
                omit_when_empty: false,
                raw_type_expression: declaration.type_expression.clone(),
                comment: declaration.comment.clone(),
                tag: declaration.tag.clone(),
                type_ref: declaration.type_ref.clone(),
            };
            if let Some(entry) = entry {
                if !entry.name.is_empty() {
                    field.external_name = entry.name.clone();
                }
                field.omit_when_empty = entry.has_option(OMIT_EMPTY);
            }
            fields.push(field);
        }
    }

    fields
}

/// Mutates a definition once, right before it is indexed.
pub trait DefinitionHook {
    fn before_register(&mut self, definition: &mut TypeDefinition);
}

impl<F> DefinitionHook for F
where
    F: FnMut(&mut TypeDefinition),
{
    fn before_register(&mut self, definition: &mut TypeDefinition) {
        self(definition)
    }
}

/// Drops fields whose type is not a named type (maps, channels, funcs, inline structs).
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitUntypedFields;

impl DefinitionHook for OmitUntypedFields {
    fn before_register(&mut self, definition: &mut TypeDefinition) {
        definition.struct_fields.retain(|field| {
            if field.type_ref.is_none() {
                trace!("dropping {}.{} ({})", definition.identity, field.name, field.raw_type_expression);
            }
            field.type_ref.is_some()
        });
    }
}

enum Pending {
    Seed(TypeDefinition),
    Field {
        owner: usize,
        field: String,
        type_ref: TypeRef,
    },
}

/// Collects every type reachable from seed types through exported struct fields.
///
/// `ordered()` is first-discovery order: parent before children, siblings in field order.
/// Unresolvable field types are skipped, never reported as errors.
pub struct TypeGraphBuilder {
    locator: PackageLocator,
    work_dir: PathBuf,
    tag_key: String,
    hook: Option<Box<dyn DefinitionHook>>,
    ordered: Vec<TypeDefinition>,
    index: HashMap<TypeIdentity, usize>,
    references: DiGraph<usize, String>,
    parser: Option<GoParser>,
    cache: PackageCache,
}

impl TypeGraphBuilder {
    pub fn new(locator: PackageLocator) -> Self {
        Self {
            locator,
            work_dir: PathBuf::from("."),
            tag_key: DEFAULT_TAG_KEY.to_string(),
            hook: None,
            ordered: Vec::new(),
            index: HashMap::new(),
            references: DiGraph::new(),
            parser: None,
            cache: PackageCache::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl DefinitionHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Directory import paths passed to [`add_from_import_path`](Self::add_from_import_path)
    /// are resolved from.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.tag_key = tag_key.into();
        self
    }

    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    pub fn add(&mut self, seed: TypeDefinition) {
        let mut stack = vec![Pending::Seed(seed)];

        while let Some(pending) = stack.pop() {
            let (definition, parent) = match pending {
                Pending::Seed(definition) => (Some(definition), None),
                Pending::Field {
                    owner,
                    field,
                    type_ref,
                } => (self.resolve_field(owner, &type_ref), Some((owner, field))),
            };
            let Some(definition) = definition else {
                continue;
            };

            let existing = self.index.get(&definition.identity).copied();
            let (index, is_new) = match existing {
                Some(existing) => (existing, false),
                None => (self.register(definition), true),
            };

            if let Some((owner, field)) = parent {
                self.references
                    .add_edge(NodeIndex::new(owner), NodeIndex::new(index), field);
            }
            if !is_new {
                continue;
            }

            // Reversed so the first field is popped, and fully explored, first
            for field in self.ordered[index].struct_fields.iter().rev() {
                if let Some(type_ref) = &field.type_ref {
                    stack.push(Pending::Field {
                        owner: index,
                        field: field.name.clone(),
                        type_ref: type_ref.clone(),
                    });
                }
            }
        }
    }

    fn register(&mut self, definition: TypeDefinition) -> usize {
        let identity = definition.identity.clone();
        let index = self.ordered.len();
        self.ordered.push(definition);

        // Indexed under the identity it had before the hook ran
        if let Some(hook) = self.hook.as_mut() {
            hook.before_register(&mut self.ordered[index]);
        }

        self.references.add_node(index);
        self.index.insert(identity, index);
        debug!("registered {}", self.ordered[index].identity);
        index
    }

    fn resolve_field(&mut self, owner: usize, type_ref: &TypeRef) -> Option<TypeDefinition> {
        let owner_definition = &self.ordered[owner];
        let location = match &type_ref.package {
            Some(alias) => {
                let resolved = self.locator.resolve_alias_in(
                    alias,
                    &owner_definition.imports,
                    &owner_definition.owner_directory,
                );
                match resolved {
                    Ok(location) => location,
                    Err(e) => {
                        debug!(
                            "skipping {}.{} in {}: {}",
                            alias,
                            type_ref.name,
                            owner_definition.identity,
                            e
                        );
                        return None;
                    }
                }
            }
            // Unqualified: same package as the owning declaration
            None => owner_definition.location.clone(),
        };

        let definition = self.find_definition(&type_ref.name, &location);
        if definition.is_none() {
            trace!("no declaration of {} in {}", type_ref.name, location.directory.display());
        }
        definition
    }

    /// Declaration scan: first type named `type_name` in the package at `location`.
    pub fn find_definition(&mut self, type_name: &str, location: &Location) -> Option<TypeDefinition> {
        let package = self.package(&location.directory)?;
        let (file, declaration) = package.find_type(type_name)?;
        Some(TypeDefinition::new(
            location.clone(),
            file,
            declaration,
            &self.tag_key,
        ))
    }

    fn package(&mut self, directory: &Path) -> Option<Rc<GoPackage>> {
        if self.parser.is_none() {
            match GoParser::new() {
                Ok(parser) => self.parser = Some(parser),
                Err(e) => {
                    warn!("Failed to initialize Go parser: {}", e);
                    return None;
                }
            }
        }
        let parser = self.parser.as_mut()?;

        match self.cache.get_or_parse(parser, directory) {
            Ok(package) => Some(package),
            Err(e) => {
                debug!("Failed to read package {}: {}", directory.display(), e);
                None
            }
        }
    }

    pub fn add_from_directory(&mut self, type_name: &str, directory: &Path) {
        let location = match self.locator.inspect(directory) {
            Ok(location) => location,
            Err(e) => {
                warn!("failed inspect {}: {}", directory.display(), e);
                return;
            }
        };
        if let Some(definition) = self.find_definition(type_name, &location) {
            self.add(definition);
        }
    }

    pub fn add_from_file(&mut self, type_name: &str, file_path: &Path) {
        let directory = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.add_from_directory(type_name, directory);
    }

    pub fn add_from_import_path(&mut self, type_name: &str, import_path: &str) {
        let location = match self.locator.resolve(import_path, &self.work_dir) {
            Ok(location) => location,
            Err(e) => {
                warn!("failed resolve {}: {}", import_path, e);
                return;
            }
        };
        if let Some(definition) = self.find_definition(type_name, &location) {
            self.add(definition);
        }
    }

    pub fn ordered(&self) -> &[TypeDefinition] {
        &self.ordered
    }

    pub fn by_identity(&self) -> HashMap<&TypeIdentity, &TypeDefinition> {
        self.index
            .iter()
            .map(|(identity, &index)| (identity, &self.ordered[index]))
            .collect()
    }

    pub fn get(&self, identity: &TypeIdentity) -> Option<&TypeDefinition> {
        self.index.get(identity).map(|&index| &self.ordered[index])
    }

    /// Types referenced by the fields of `identity`, one entry per referencing field.
    pub fn references(&self, identity: &TypeIdentity) -> Vec<(&str, &TypeDefinition)> {
        let Some(&index) = self.index.get(identity) else {
            return Vec::new();
        };
        let mut references: Vec<_> = self
            .references
            .edges(NodeIndex::new(index))
            .map(|edge| (edge.weight().as_str(), &self.ordered[self.references[edge.target()]]))
            .collect();
        // petgraph yields outgoing edges newest first
        references.reverse();
        references
    }

    /// Every definition after the types its fields reference; cycles are cut at first visit.
    pub fn dependencies_first(&self) -> Vec<&TypeDefinition> {
        let mut order = Vec::with_capacity(self.ordered.len());
        let mut dfs = DfsPostOrder::empty(&self.references);

        for start in self.references.node_indices() {
            dfs.move_to(start);
            while let Some(node) = dfs.next(&self.references) {
                order.push(&self.ordered[self.references[node]]);
            }
        }
        order
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
