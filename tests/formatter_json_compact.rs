use golocate::core::{GoEnvironment, PackageLocator, TypeGraphBuilder};
use golocate::formatters::{JsonCompactFormatter, TextFormatter};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const SOURCE: &str = r#"package billing

// Invoice is sent to customers.
type Invoice struct {
	Number string   `json:"number"`
	Lines  []*Line  `json:"lines,omitempty"`
	Total  Amount   // gross
}

type Line struct {
	Amount Amount `json:"amount"`
}

type Amount struct {
	Cents int64 `json:"cents"`
}
"#;

fn build_graph(dir: &TempDir) -> TypeGraphBuilder {
    let module = dir.path().join("billing");
    fs::create_dir_all(&module).unwrap();
    fs::write(module.join("go.mod"), "module example.com/billing\n").unwrap();
    fs::write(module.join("invoice.go"), SOURCE).unwrap();

    let env = GoEnvironment::new(dir.path().join("goroot"), dir.path().join("gopath"));
    let mut graph = TypeGraphBuilder::new(PackageLocator::new(env));
    graph.add_from_directory("Invoice", &module);
    graph
}

#[test]
fn json_compact_lists_types_and_edges() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(&dir);

    let output = JsonCompactFormatter::new().format_graph(&graph).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["meta"]["types"], 3);
    assert_eq!(value["meta"]["edges"], 3);
    assert_eq!(value["meta"]["format"], "compact");
    assert_eq!(value["files"].as_array().unwrap().len(), 1);

    let types = value["types"].as_array().unwrap();
    let names: Vec<&str> = types.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Invoice", "Line", "Amount"]);
    assert_eq!(types[0]["pkg"], "example.com/billing");
    assert!(types[0].get("doc").is_none());

    let lines = &types[0]["fields"][1];
    assert_eq!(lines["json"], "lines");
    assert_eq!(lines["type"], "[]*Line");
    assert_eq!(lines["omitempty"], true);

    // Invoice.Lines -> Line, Invoice.Total -> Amount, Line.Amount -> Amount
    let edges = value["edges"].as_array().unwrap();
    assert_eq!(edges[0], serde_json::json!([0, 1, "Lines"]));
    assert_eq!(edges[1], serde_json::json!([0, 2, "Total"]));
    assert_eq!(edges[2], serde_json::json!([1, 2, "Amount"]));
}

#[test]
fn full_output_keeps_comments() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(&dir);

    let output = JsonCompactFormatter::new()
        .with_comments()
        .format_graph(&graph)
        .unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["meta"]["format"], "full");
    assert_eq!(value["types"][0]["doc"], "Invoice is sent to customers.");
    assert_eq!(value["types"][0]["fields"][2]["comment"], "gross");
}

#[test]
fn json_written_to_file() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(&dir);
    let out = dir.path().join("graph.json");

    JsonCompactFormatter::new().format_to_file(&graph, &out).unwrap();
    let value: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["types"].as_array().unwrap().len(), 3);
}

#[test]
fn text_listing() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(&dir);

    let text = TextFormatter::new().format_graph(&graph);
    assert!(text.starts_with("example.com/billing@Invoice\n"));
    assert!(text.contains("    Lines []*Line json:lines,omitempty\n"));
    assert!(text.contains("example.com/billing@Amount\n    Cents int64 json:cents\n"));
}
