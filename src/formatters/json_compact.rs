use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::{Field, TypeDefinition, TypeGraphBuilder, TypeIdentity};

/// JSON rendering of a type graph for schema generators
pub struct JsonCompactFormatter {
    /// Drop docs and comments
    minimal: bool,
}

impl JsonCompactFormatter {
    pub fn new() -> Self {
        Self { minimal: true }
    }

    pub fn with_comments(mut self) -> Self {
        self.minimal = false;
        self
    }

    pub fn format_to_file(&self, graph: &TypeGraphBuilder, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.format_graph(graph)?)?;
        Ok(())
    }

    pub fn format_graph(&self, graph: &TypeGraphBuilder) -> Result<String> {
        let definitions = graph.ordered();

        // Files are referenced by index to keep the output small
        let mut file_map: HashMap<String, usize> = HashMap::new();
        let mut files = Vec::new();
        for definition in definitions {
            let path = definition.owner_file.to_string_lossy().to_string();
            if !file_map.contains_key(&path) {
                file_map.insert(path.clone(), files.len());
                files.push(path);
            }
        }

        let type_ids: HashMap<&TypeIdentity, usize> = definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (&definition.identity, index))
            .collect();

        let types: Vec<Value> = definitions
            .iter()
            .map(|definition| {
                let path = definition.owner_file.to_string_lossy();
                let file_id = file_map[&*path];
                self.format_definition(definition, file_id)
            })
            .collect();

        let mut edges = Vec::new();
        for definition in definitions {
            let source = type_ids[&definition.identity];
            for (field, target) in graph.references(&definition.identity) {
                edges.push(json!([source, type_ids[&target.identity], field]));
            }
        }

        let format = if self.minimal { "compact" } else { "full" };
        let output = json!({
            "meta": {
                "types": definitions.len(),
                "edges": edges.len(),
                "format": format
            },
            "files": files,
            "types": types,
            "edges": edges
        });

        Ok(serde_json::to_string(&output)?)
    }

    fn format_definition(&self, definition: &TypeDefinition, file_id: usize) -> Value {
        let fields: Vec<Value> = definition
            .struct_fields
            .iter()
            .map(|field| self.format_field(field))
            .collect();

        let mut type_obj = json!({
            "pkg": definition.identity.import_path,
            "name": definition.identity.type_name,
            "file": file_id,
            "line": definition.declaration.line,
            "struct": definition.is_struct(),
            "fields": fields
        });
        if !self.minimal {
            if let Some(ref doc) = definition.declaration.doc {
                type_obj["doc"] = json!(doc);
            }
        }
        type_obj
    }

    fn format_field(&self, field: &Field) -> Value {
        let mut field_obj = json!({
            "name": field.name,
            "json": field.external_name,
            "type": field.raw_type_expression
        });
        if field.omit_when_empty {
            field_obj["omitempty"] = json!(true);
        }
        if !self.minimal {
            if let Some(ref comment) = field.comment {
                field_obj["comment"] = json!(comment);
            }
        }
        field_obj
    }
}

impl Default for JsonCompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}
