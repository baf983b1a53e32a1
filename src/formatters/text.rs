use std::fmt::Write;

use crate::core::{Location, TypeGraphBuilder};

/// Plain listing for terminals
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_location(&self, location: &Location) -> String {
        format!(
            "  import: {} pkg: {}\n  kind: {:?} root: {}\n",
            location.import_path,
            location.package_name,
            location.kind,
            location.package_root.display()
        )
    }

    pub fn format_graph(&self, graph: &TypeGraphBuilder) -> String {
        let mut out = String::new();
        for definition in graph.ordered() {
            let _ = writeln!(out, "{}", definition.identity);
            for field in &definition.struct_fields {
                let _ = write!(
                    out,
                    "    {} {} json:{}",
                    field.name, field.raw_type_expression, field.external_name
                );
                if field.omit_when_empty {
                    out.push_str(",omitempty");
                }
                out.push('\n');
            }
        }
        out
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}
