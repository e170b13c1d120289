use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Deserialize;

use instiller_core::{
    AliasStore, ClassDirective, Fixture, GenerationDirective, TypeExpr, TypeRegistry,
};
use instiller_generate::{FixtureGenerator, GenerationError, GeneratorConfig};
use instiller_plan::{DirectivePlan, DirectiveRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
enum Color {
    Red,
    Green,
    Blue,
}

impl Fixture for Color {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.enumeration("Color", &["Red", "Green", "Blue"])
    }
}

#[derive(Debug, Deserialize)]
struct Profile {
    name: String,
    age: u32,
    score: f64,
    active: bool,
    initial: char,
    tags: Vec<String>,
    codes: Box<[String]>,
    ratings: BTreeMap<String, i32>,
    joined: NaiveDate,
    color: Color,
}

impl Fixture for Profile {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Profile", |t| {
            t.field::<String>("name")
                .field::<u32>("age")
                .field::<f64>("score")
                .field::<bool>("active")
                .field::<char>("initial")
                .field::<Vec<String>>("tags")
                .field::<Box<[String]>>("codes")
                .field::<BTreeMap<String, i32>>("ratings")
                .field::<NaiveDate>("joined")
                .field::<Color>("color");
        })
    }
}

#[test]
fn undirected_fields_get_defaults() {
    let mut generator = FixtureGenerator::default();
    let profile = generator
        .generate::<Profile>()
        .expect("generate profile")
        .expect("profile is constructible");

    assert_eq!(profile.name, "name");
    assert_eq!(profile.age, 0);
    assert_eq!(profile.score, 0.0);
    assert!(!profile.active);
    assert_eq!(profile.initial, '0');
    assert_eq!(profile.tags, vec!["tags"; 3]);
    assert_eq!(profile.codes.len(), 3);
    assert_eq!(profile.ratings.len(), 1);
    assert_eq!(profile.ratings.get("ratings"), Some(&0));
    assert!(profile.joined.to_string().len() == 10);
    assert_eq!(profile.color, Color::Red);

    let report = generator.last_report().expect("report recorded");
    assert_eq!(report.root_type, "Profile");
    assert!(report.warnings.is_empty());
}

#[test]
fn default_cardinality_is_configurable() {
    let mut generator = FixtureGenerator::new(GeneratorConfig {
        default_cardinality: 5,
        ..GeneratorConfig::default()
    });
    let profile = generator
        .generate::<Profile>()
        .expect("generate profile")
        .expect("profile");
    assert_eq!(profile.tags.len(), 5);
    assert_eq!(profile.codes.len(), 5);
    assert_eq!(profile.ratings.len(), 1);
}

#[derive(Debug, Deserialize)]
struct Badge {
    code: String,
    level: u8,
    color: Color,
    palette: BTreeSet<Color>,
    digits: Box<[u8]>,
    owner: String,
}

impl Fixture for Badge {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Badge", |t| {
            t.field::<String>("code")
                .with(GenerationDirective::generator("ALPHANUMERIC", "[A-Z]{4}"))
                .field::<u8>("level")
                .with(GenerationDirective::literal("7"))
                .field::<Color>("color")
                .with(GenerationDirective::literal("1"))
                .field::<BTreeSet<Color>>("palette")
                .with(GenerationDirective::literal("2"))
                .field::<Box<[u8]>>("digits")
                .with(GenerationDirective::literal("4").with_cardinality(5))
                .field::<String>("owner")
                .with(GenerationDirective::literal("ops"));
        })
    }
}

#[test]
fn directives_drive_leaf_values() {
    let mut generator = FixtureGenerator::default();
    let badge = generator
        .generate::<Badge>()
        .expect("generate badge")
        .expect("badge");

    assert_eq!(badge.code.len(), 4);
    assert!(badge.code.chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(badge.level, 7);
    assert_eq!(badge.color, Color::Green);
    assert_eq!(badge.palette, BTreeSet::from([Color::Blue]));
    assert_eq!(badge.digits.as_ref(), &[4, 4, 4, 4, 4]);
    assert_eq!(badge.owner, "ops");

    let report = generator.last_report().expect("report");
    assert_eq!(report.generator_usage.get("ALPHANUMERIC"), Some(&1));
}

#[derive(Debug, Deserialize)]
struct Ranked {
    #[allow(dead_code)]
    color: Color,
}

impl Fixture for Ranked {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Ranked", |t| {
            t.field::<Color>("color")
                .with(GenerationDirective::literal("5"));
        })
    }
}

#[test]
fn out_of_range_ordinal_fails() {
    let mut generator = FixtureGenerator::default();
    let err = generator.generate::<Ranked>().expect_err("ordinal 5");
    assert!(matches!(
        err,
        GenerationError::EnumOrdinal { ref value, ref type_name } if value == "5" && type_name == "Color"
    ));
    assert!(generator.last_report().is_some());
}

#[derive(Debug, Deserialize)]
struct Misconfigured {
    #[allow(dead_code)]
    label: String,
}

impl Fixture for Misconfigured {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Misconfigured", |t| {
            t.field::<String>("label")
                .with(GenerationDirective::generator("NOT_REGISTERED", ""));
        })
    }
}

#[test]
fn missing_generator_is_fatal() {
    let mut generator = FixtureGenerator::default();
    let err = generator.generate::<Misconfigured>().expect_err("missing generator");
    assert!(matches!(err, GenerationError::GeneratorNotFound(name) if name == "NOT_REGISTERED"));
}

#[test]
fn registered_plugins_are_used() {
    let mut generator = FixtureGenerator::default();
    generator.register_plugin(
        "NOT_REGISTERED",
        |_: &str, _: &str| -> instiller_generate::Result<String> { Ok("custom".to_string()) },
    );
    let value = generator
        .generate::<Misconfigured>()
        .expect("generate")
        .expect("value");
    assert_eq!(value.label, "custom");
}

#[derive(Debug, Deserialize)]
struct Headless {
    #[allow(dead_code)]
    label: String,
}

impl Fixture for Headless {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Headless", |t| {
            t.field::<String>("label").class_directive(ClassDirective::new(
                "  ",
                GenerationDirective::literal("x"),
            ));
        })
    }
}

#[test]
fn blank_class_directive_fails_every_run() {
    let mut generator = FixtureGenerator::default();
    for run in 0..2 {
        let err = generator
            .generate::<Headless>()
            .expect_err("blank class directive");
        assert!(
            matches!(err, GenerationError::Configuration(_)),
            "run {run} returned {err:?}"
        );
    }
}

#[derive(Debug, Deserialize)]
struct Order {
    id: String,
    reference: String,
    quantity: u32,
    copied_quantity: u32,
    #[serde(default)]
    aliases: AliasStore,
}

impl Fixture for Order {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Order", |t| {
            t.field::<String>("id")
                .with(GenerationDirective::literal("value").with_alias("ALIAS"))
                .field::<String>("reference")
                .with(GenerationDirective::literal("other").with_alias("ALIAS"))
                .field::<u32>("quantity")
                .with(GenerationDirective::literal("12").with_alias("QTY"))
                .field::<u32>("copied_quantity")
                .with(GenerationDirective::default().with_alias("QTY"))
                .field::<AliasStore>("aliases");
        })
    }
}

#[test]
fn aliases_share_one_value() {
    let mut generator = FixtureGenerator::default();
    let order = generator
        .generate::<Order>()
        .expect("generate order")
        .expect("order");

    assert_eq!(order.id, "${ALIAS}");
    assert_eq!(order.reference, "${ALIAS}");
    assert_eq!(order.quantity, 12);
    assert_eq!(order.copied_quantity, 12);
    assert_eq!(order.aliases.len(), 2);
    assert_eq!(order.aliases.get("ALIAS"), Some("value"));
    assert!(order.aliases.iter().all(|(_, value)| value != "other"));
    assert_eq!(order.aliases.resolve_references(&order.reference), "value");
    assert_eq!(
        order.aliases.names().collect::<Vec<_>>(),
        vec!["ALIAS", "QTY"]
    );
    assert_eq!(generator.last_report().map(|r| r.aliases_created), Some(2));
}

#[test]
fn aliases_reset_between_runs() {
    let mut generator = FixtureGenerator::default();
    generator.generate::<Order>().expect("first run");
    let order = generator
        .generate::<Order>()
        .expect("second run")
        .expect("order");
    assert_eq!(order.aliases.len(), 2);
}

#[derive(Debug, Deserialize)]
struct Relay {
    first: String,
    second: String,
    #[serde(default)]
    aliases: AliasStore,
}

impl Fixture for Relay {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Relay", |t| {
            t.field::<String>("first")
                .with(GenerationDirective::generator("TICKET", "").with_alias("KEY"))
                .field::<String>("second")
                .with(
                    GenerationDirective::generator("TICKET", "")
                        .with_value("late")
                        .with_alias("KEY"),
                )
                .field::<AliasStore>("aliases");
        })
    }
}

#[test]
fn later_alias_writers_are_discarded() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut generator = FixtureGenerator::default();
    generator.register_plugin(
        "TICKET",
        move |_: &str, seed: &str| -> instiller_generate::Result<String> {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("ticket-{n}{seed}"))
        },
    );

    let relay = generator
        .generate::<Relay>()
        .expect("generate relay")
        .expect("relay");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(relay.first, "${KEY}");
    assert_eq!(relay.second, "${KEY}");
    assert_eq!(relay.aliases.len(), 1);
    assert_eq!(relay.aliases.get("KEY"), Some("ticket-0"));
    assert_eq!(generator.last_report().map(|r| r.aliases_created), Some(1));
}

#[derive(Debug, Deserialize)]
struct Unanchored {
    #[allow(dead_code)]
    id: String,
}

impl Fixture for Unanchored {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Unanchored", |t| {
            t.field::<String>("id")
                .with(GenerationDirective::literal("x").with_alias("ID"));
        })
    }
}

#[test]
fn aliases_without_store_field_fail() {
    let mut generator = FixtureGenerator::default();
    let err = generator.generate::<Unanchored>().expect_err("no alias field");
    assert!(matches!(err, GenerationError::AliasWrite(_)));
}

#[derive(Debug, Deserialize)]
struct Node {
    label: String,
    next: Option<Box<Node>>,
}

impl Fixture for Node {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Node", |t| {
            t.field::<String>("label").field::<Option<Box<Node>>>("next");
        })
    }
}

fn chain_depth(node: &Node) -> usize {
    node.next.as_deref().map(|next| 1 + chain_depth(next)).unwrap_or(0)
}

#[test]
fn recursion_level_zero_leaves_self_reference_empty() {
    let mut generator = FixtureGenerator::default();
    let node = generator.generate::<Node>().expect("generate").expect("node");
    assert_eq!(node.label, "label");
    assert!(node.next.is_none());

    let report = generator.last_report().expect("report");
    assert_eq!(report.recursion_cutoffs.get("Node.next"), Some(&1));
}

#[test]
fn recursion_level_bounds_chain_depth() {
    let mut generator = FixtureGenerator::default();
    for level in 1..=3 {
        generator.set_recursion_level(level);
        let node = generator.generate::<Node>().expect("generate").expect("node");
        assert_eq!(chain_depth(&node), level);

        let report = generator.last_report().expect("report");
        assert_eq!(report.composite_entries.get("Node.next"), Some(&(level as u64)));
    }
}

#[test]
fn root_collection_elements_respect_the_recursion_level() {
    let mut generator = FixtureGenerator::default();
    let node = generator.types_mut().describe::<Node>();
    let root = TypeExpr::generic("Vec", vec![node]);

    for level in 0..=2 {
        generator.set_recursion_level(level);
        let value = generator
            .generate_value(&root)
            .expect("generate")
            .expect("value");
        let nodes: Vec<Node> =
            serde_json::from_value(value.to_json().expect("json")).expect("nodes");
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|node| chain_depth(node) == level));
    }
}

#[derive(Debug, Deserialize)]
struct Tree {
    children: Vec<Tree>,
}

impl Fixture for Tree {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Tree", |t| {
            t.field::<Vec<Tree>>("children");
        })
    }
}

#[test]
fn cut_off_collection_slots_are_dropped() {
    let mut generator = FixtureGenerator::default();
    generator.set_recursion_level(1);
    generator.set_default_cardinality(2);

    let tree = generator.generate::<Tree>().expect("generate").expect("tree");
    assert_eq!(tree.children.len(), 2);
    assert!(tree.children.iter().all(|child| child.children.is_empty()));
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[allow(dead_code)]
    value: String,
}

impl Fixture for Cell {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Cell", |t| {
            t.inner().field::<String>("value");
        })
    }
}

#[derive(Debug, Deserialize)]
struct Sheet {
    title: String,
    cell: Option<Cell>,
}

impl Fixture for Sheet {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Sheet", |t| {
            t.field::<String>("title").field::<Option<Cell>>("cell");
        })
    }
}

#[test]
fn inner_types_are_skipped() {
    let mut generator = FixtureGenerator::default();
    assert!(generator.generate::<Cell>().expect("generate").is_none());
    assert!(
        generator
            .last_report()
            .expect("report")
            .has_warning("inner_type_skipped")
    );

    let sheet = generator.generate::<Sheet>().expect("generate").expect("sheet");
    assert_eq!(sheet.title, "title");
    assert!(sheet.cell.is_none());
    assert!(
        generator
            .last_report()
            .expect("report")
            .has_warning("inner_type_skipped")
    );
}

#[derive(Debug, PartialEq, Deserialize)]
struct Circle {
    radius: f64,
}

impl Fixture for Circle {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Circle", |t| {
            t.field::<f64>("radius")
                .with(GenerationDirective::literal("2.5"));
        })
    }
}

#[derive(Debug, PartialEq, Deserialize)]
struct Square {
    side: f64,
}

impl Fixture for Square {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Square", |t| {
            t.field::<f64>("side").with(GenerationDirective::literal("4"));
        })
    }
}

#[derive(Debug, PartialEq, Deserialize)]
enum Shape {
    Circle(Circle),
    Square(Square),
}

impl Fixture for Shape {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.abstract_type("Shape", true, |types| {
            vec![types.describe::<Circle>(), types.describe::<Square>()]
        })
    }
}

#[derive(Debug, Deserialize)]
struct Canvas {
    chosen: Shape,
    fallback: Option<Shape>,
    items: Vec<String>,
    unique: Vec<u8>,
    lookup: std::collections::HashMap<String, String>,
}

impl Fixture for Canvas {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Canvas", |t| {
            t.field::<Shape>("chosen")
                .with(GenerationDirective::default().with_implementations(["Triangle", "Square"]))
                .field::<Option<Shape>>("fallback")
                .field_as(
                    "items",
                    TypeExpr::generic("List", vec![TypeExpr::named("String")]),
                )
                .field_as(
                    "unique",
                    TypeExpr::generic("Collection", vec![TypeExpr::named("u8")]),
                )
                .field_as(
                    "lookup",
                    TypeExpr::generic(
                        "Map",
                        vec![TypeExpr::named("String"), TypeExpr::named("String")],
                    ),
                );
        })
    }
}

#[test]
fn abstract_fields_pick_assignable_implementations() {
    let mut generator = FixtureGenerator::default();
    let canvas = generator
        .generate::<Canvas>()
        .expect("generate canvas")
        .expect("canvas");

    assert_eq!(canvas.chosen, Shape::Square(Square { side: 4.0 }));
    assert!(canvas.fallback.is_none());
    assert_eq!(canvas.items, vec!["items"; 3]);
    assert_eq!(canvas.unique, vec![0; 3]);
    assert_eq!(canvas.lookup.get("lookup").map(String::as_str), Some("lookup"));

    let report = generator.last_report().expect("report");
    let unresolved: Vec<_> = report
        .warnings
        .iter()
        .filter(|issue| issue.code == "unresolved_abstract_type")
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].field.as_deref(), Some("Canvas.fallback"));
}

enum Alpha {}

impl Fixture for Alpha {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.abstract_type("Alpha", false, |types| vec![types.describe::<Beta>()])
    }
}

enum Beta {}

impl Fixture for Beta {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.abstract_type("Beta", false, |types| vec![types.describe::<Alpha>()])
    }
}

#[derive(Debug, Deserialize)]
struct Loop {
    #[serde(default)]
    link: Option<String>,
    label: String,
}

impl Fixture for Loop {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Loop", |t| {
            t.field::<Alpha>("link")
                .with(GenerationDirective::default().with_implementations(["Beta", "Alpha"]))
                .field::<String>("label");
        })
    }
}

#[test]
fn mutually_implementing_abstract_types_terminate() {
    let mut generator = FixtureGenerator::default();
    let looped = generator
        .generate::<Loop>()
        .expect("generate loop")
        .expect("loop");

    assert!(looped.link.is_none());
    assert_eq!(looped.label, "label");
    let report = generator.last_report().expect("report");
    assert!(report.has_warning("cyclic_abstract_type"));
    assert_eq!(
        report
            .warnings
            .iter()
            .find(|issue| issue.code == "cyclic_abstract_type")
            .and_then(|issue| issue.field.as_deref()),
        Some("Loop.link")
    );
}

#[derive(Debug, Deserialize)]
struct Matrix {
    rows: Vec<Vec<String>>,
}

impl Fixture for Matrix {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Matrix", |t| {
            t.field::<Vec<Vec<String>>>("rows");
        })
    }
}

#[test]
fn nested_collections_stay_empty() {
    let mut generator = FixtureGenerator::default();
    let matrix = generator.generate::<Matrix>().expect("generate").expect("matrix");
    assert!(matrix.rows.is_empty());
    assert!(
        generator
            .last_report()
            .expect("report")
            .has_warning("nested_collection_unsupported")
    );
}

#[derive(Debug, Deserialize)]
struct Audit {
    id: u64,
    author: String,
}

impl Fixture for Audit {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Audit", |t| {
            t.field::<u64>("id")
                .with(GenerationDirective::literal("1"))
                .field::<String>("author")
                .with(GenerationDirective::literal("field level"));
        })
    }
}

#[derive(Debug, Deserialize)]
struct Invoice {
    #[serde(flatten)]
    audit: Audit,
    total: f64,
    #[serde(default)]
    note: String,
    #[serde(skip)]
    cache: String,
}

impl Fixture for Invoice {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Invoice", |t| {
            t.base::<Audit>()
                .field::<f64>("total")
                .with(GenerationDirective::literal("9.75"))
                .field::<String>("note")
                .field::<String>("cache")
                .omitted()
                .class_directive(ClassDirective::new("note", GenerationDirective::skipped()))
                .class_directive(ClassDirective::targeting(
                    "Audit",
                    "author",
                    GenerationDirective::literal("class level"),
                ));
        })
    }
}

#[test]
fn ancestors_and_class_directives_apply() {
    let mut generator = FixtureGenerator::default();
    let invoice = generator
        .generate::<Invoice>()
        .expect("generate invoice")
        .expect("invoice");

    assert_eq!(invoice.audit.id, 1);
    assert_eq!(invoice.audit.author, "class level");
    assert_eq!(invoice.total, 9.75);
    assert!(invoice.note.is_empty());
    assert!(invoice.cache.is_empty());
}

#[test]
fn plan_rules_follow_directive_precedence() {
    let mut generator = FixtureGenerator::default();
    let plan = DirectivePlan::new(vec![
        DirectiveRule::field("Audit", "id", GenerationDirective::literal("99")),
        DirectiveRule::field("Audit", "author", GenerationDirective::literal("ignored")),
        DirectiveRule::class(
            "Audit",
            "author",
            GenerationDirective::generator("CUSTOM_LIST", "planner"),
        ),
    ]);
    generator.apply_plan(&plan).expect("apply plan");

    let audit = generator.generate::<Audit>().expect("generate").expect("audit");
    assert_eq!(audit.id, 99);
    assert_eq!(audit.author, "planner");
}

#[test]
fn unknown_root_type_is_fatal() {
    let mut generator = FixtureGenerator::default();
    let err = generator
        .generate_value(&TypeExpr::named("Ghost"))
        .expect_err("unknown type");
    assert!(matches!(
        err,
        GenerationError::Core(instiller_core::Error::UnknownType(name)) if name == "Ghost"
    ));
}
