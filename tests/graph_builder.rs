use golocate::core::{
    GoEnvironment, OmitUntypedFields, PackageLocator, TypeDefinition, TypeGraphBuilder,
    TypeIdentity,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

const MODELS: &str = r#"package models

import (
	"time"

	ext "github.com/acme/shop/external"
	"github.com/BurntSushi/toml"
)

// Alfa is the root of the graph.
type Alfa struct {
	Child   *Beta  `json:"child,omitempty"`
	Other   Beta   // second reference to Beta
	Hidden  *Gamma `json:"-"`
	Items   []*Delta
	Remote  ext.Remote
	Config  toml.Decoder
	When    time.Time
	lower   *Epsilon
	Missing *nowhere.Thing
	Embedded
}

type Beta struct {
	Back   *Alfa
	Name   string
	Labels map[string]string `json:"labels"`
}

type (
	Gamma    struct{ V int }
	Delta    struct{ Self *Delta }
	Epsilon  struct{}
	Embedded struct{ Z Zeta }
	Zeta     struct{}
)
"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

struct Fixture {
    _dir: TempDir,
    shop: PathBuf,
    locator: PackageLocator,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        write(
            &root.join("goroot/src/time/time.go"),
            "package time\n\ntype Time struct {\n\twall uint64\n}\n",
        );
        write(
            &root.join("gopath/pkg/mod/github.com/!burnt!sushi/toml@v1.3.2/decode.go"),
            "package toml\n\ntype Decoder struct {\n\tStrict bool `json:\"strict\"`\n}\n",
        );

        let shop = root.join("work/shop");
        write(
            &shop.join("go.mod"),
            "module github.com/acme/shop\n\nrequire github.com/BurntSushi/toml v1.3.2\n",
        );
        write(&shop.join("models/models.go"), MODELS);
        write(
            &shop.join("external/remote.go"),
            "package external\n\ntype Remote struct {\n\tTags []string\n}\n",
        );

        let env = GoEnvironment::new(root.join("goroot"), root.join("gopath"));
        Self {
            _dir: dir,
            shop,
            locator: PackageLocator::new(env),
        }
    }

    fn builder(&self) -> TypeGraphBuilder {
        TypeGraphBuilder::new(self.locator.clone()).with_work_dir(&self.shop)
    }
}

fn names(graph: &TypeGraphBuilder) -> Vec<String> {
    graph.ordered().iter().map(|d| d.type_name().to_string()).collect()
}

#[test]
fn traversal_is_pre_order_and_deduplicated() {
    let fx = Fixture::new();
    let mut graph = fx.builder();

    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    assert_eq!(
        names(&graph),
        vec!["Alfa", "Beta", "Delta", "Remote", "Decoder", "Time"]
    );
    let identities: Vec<String> = graph.ordered().iter().map(|d| d.identity.to_string()).collect();
    assert_eq!(
        identities,
        vec![
            "github.com/acme/shop/models@Alfa",
            "github.com/acme/shop/models@Beta",
            "github.com/acme/shop/models@Delta",
            "github.com/acme/shop/external@Remote",
            "github.com/BurntSushi/toml@Decoder",
            "time@Time",
        ]
    );
}

#[test]
fn omitted_fields_and_embedded_types_are_not_visited() {
    let fx = Fixture::new();
    let mut graph = fx.builder();
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    let models = "github.com/acme/shop/models";
    for skipped in ["Gamma", "Epsilon", "Embedded", "Zeta"] {
        assert!(graph.get(&TypeIdentity::new(models, skipped)).is_none(), "{skipped}");
    }

    let alfa = &graph.ordered()[0];
    let fields: Vec<_> = alfa
        .struct_fields
        .iter()
        .map(|f| (f.name.as_str(), f.external_name.as_str(), f.omit_when_empty))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("Child", "child", true),
            ("Other", "Other", false),
            ("Items", "Items", false),
            ("Remote", "Remote", false),
            ("Config", "Config", false),
            ("When", "When", false),
            ("Missing", "Missing", false),
        ]
    );
    assert_eq!(alfa.struct_fields[0].type_ops(), "*");
    assert_eq!(alfa.struct_fields[2].type_ops(), "[]*");
    assert_eq!(alfa.struct_fields[1].comment.as_deref(), Some("second reference to Beta"));
    assert_eq!(alfa.declaration.doc.as_deref(), Some("Alfa is the root of the graph."));
    assert!(alfa.is_struct());
}

#[test]
fn seeding_twice_adds_nothing() {
    let fx = Fixture::new();
    let mut graph = fx.builder();

    graph.add_from_directory("Alfa", &fx.shop.join("models"));
    let before = graph.len();
    graph.add_from_directory("Beta", &fx.shop.join("models"));
    graph.add_from_file("Alfa", &fx.shop.join("models/models.go"));

    assert_eq!(graph.len(), before);
    assert_eq!(graph.by_identity().len(), before);
}

#[test]
fn unknown_seeds_are_ignored() {
    let fx = Fixture::new();
    let mut graph = fx.builder();

    graph.add_from_directory("Nope", &fx.shop.join("models"));
    graph.add_from_directory("Alfa", &fx.shop.join("missing"));
    graph.add_from_import_path("Alfa", "github.com/nobody/nothing");

    assert!(graph.is_empty());
}

#[test]
fn seeds_by_import_path() {
    let fx = Fixture::new();
    let mut graph = fx.builder();

    graph.add_from_import_path("Decoder", "github.com/BurntSushi/toml");
    graph.add_from_import_path("Beta", "github.com/acme/shop/models");

    assert_eq!(
        names(&graph),
        vec!["Decoder", "Beta", "Alfa", "Delta", "Remote", "Time"]
    );
    let decoder = &graph.ordered()[0];
    assert_eq!(decoder.struct_fields[0].external_name, "strict");
}

#[test]
fn hook_runs_once_per_definition() {
    let fx = Fixture::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&seen);

    let mut graph = fx.builder().with_hook(move |definition: &mut TypeDefinition| {
        recorder.borrow_mut().push(definition.type_name().to_string());
        for field in &mut definition.struct_fields {
            field.external_name = field.external_name.to_lowercase();
        }
    });
    graph.add_from_directory("Alfa", &fx.shop.join("models"));
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    assert_eq!(*seen.borrow(), names(&graph));
    assert_eq!(graph.ordered()[0].struct_fields[1].external_name, "other");
}

#[test]
fn references_follow_field_order() {
    let fx = Fixture::new();
    let mut graph = fx.builder();
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    let alfa = TypeIdentity::new("github.com/acme/shop/models", "Alfa");
    let references: Vec<(&str, &str)> = graph
        .references(&alfa)
        .into_iter()
        .map(|(field, target)| (field, target.type_name()))
        .collect();
    assert_eq!(
        references,
        vec![
            ("Child", "Beta"),
            ("Other", "Beta"),
            ("Items", "Delta"),
            ("Remote", "Remote"),
            ("Config", "Decoder"),
            ("When", "Time"),
        ]
    );

    let delta = TypeIdentity::new("github.com/acme/shop/models", "Delta");
    let self_refs = graph.references(&delta);
    assert_eq!(self_refs.len(), 1);
    assert_eq!(self_refs[0].1.identity, delta);

    assert!(graph.references(&TypeIdentity::new("x", "Y")).is_empty());
}

#[test]
fn dependencies_come_before_their_users() {
    let fx = Fixture::new();
    let mut graph = fx.builder();
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    let order: Vec<&str> = graph
        .dependencies_first()
        .into_iter()
        .map(TypeDefinition::type_name)
        .collect();
    assert_eq!(order.len(), graph.len());
    assert_eq!(order.last(), Some(&"Alfa"));

    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
    for dependency in ["Beta", "Delta", "Remote", "Decoder", "Time"] {
        assert!(position(dependency) < position("Alfa"), "{dependency}");
    }
}

#[test]
fn packages_are_parsed_once_per_build() {
    let fx = Fixture::new();
    let mut graph = fx.builder();
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    let stats = graph.cache_stats();
    assert_eq!(stats.entries, 4);
    assert_eq!(stats.misses, 4);
    assert!(stats.hits > 0);
}

#[test]
fn custom_tag_key() {
    let fx = Fixture::new();
    let mut graph = fx.builder().with_tag_key("yaml");
    graph.add_from_directory("Alfa", &fx.shop.join("models"));

    // `json:"-"` no longer hides Gamma
    assert!(graph
        .get(&TypeIdentity::new("github.com/acme/shop/models", "Gamma"))
        .is_some());
    assert_eq!(graph.ordered()[0].struct_fields[0].external_name, "Child");
}

#[test]
fn untyped_fields_can_be_dropped_before_registration() {
    let fx = Fixture::new();
    let beta = TypeIdentity::new("github.com/acme/shop/models", "Beta");

    let mut plain = fx.builder();
    plain.add_from_directory("Alfa", &fx.shop.join("models"));
    let fields: Vec<&str> = plain.get(&beta).unwrap().struct_fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["Back", "Name", "Labels"]);

    let mut graph = fx.builder().with_hook(OmitUntypedFields);
    graph.add_from_directory("Alfa", &fx.shop.join("models"));
    let fields: Vec<&str> = graph.get(&beta).unwrap().struct_fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["Back", "Name"]);
    assert_eq!(names(&graph), names(&plain));
}
