use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use instiller_core::{AliasStore, Fixture, GenerationDirective, TypeExpr, TypeRegistry};
use instiller_generate::logging::init_tracing;
use instiller_generate::{FixtureGenerator, GeneratorConfig};
use instiller_plan::DirectivePlan;

#[derive(Debug, Serialize, Deserialize)]
struct Customer {
    id: String,
    name: String,
    email: String,
    city: String,
    orders: Vec<Order>,
    referrer: Option<Box<Customer>>,
    #[serde(default, skip_serializing_if = "AliasStore::is_empty")]
    aliases: AliasStore,
}

impl Fixture for Customer {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Customer", |t| {
            t.field::<String>("id")
                .with(GenerationDirective::generator("ALPHANUMERIC", "C[0-9]{5}").with_alias("CUSTOMER"))
                .field::<String>("name")
                .with(GenerationDirective::generator("HUMAN_NAMES", "{first} {last}"))
                .field::<String>("email")
                .with(GenerationDirective::generator("ALPHANUMERIC", "[a-z]{6}@example\\.com"))
                .field::<String>("city")
                .with(GenerationDirective::generator("ADDRESS", "{city}"))
                .field::<Vec<Order>>("orders")
                .field::<Option<Box<Customer>>>("referrer")
                .field::<AliasStore>("aliases");
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Order {
    customer: String,
    total: f64,
    placed_on: String,
}

impl Fixture for Order {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        types.composite("Order", |t| {
            t.field::<String>("customer")
                .with(GenerationDirective::default().with_alias("CUSTOMER"))
                .field::<f64>("total")
                .with(GenerationDirective::generator("NUMBER", "5.00,250.00"))
                .field::<String>("placed_on")
                .with(GenerationDirective::generator("DATE", "%Y-%m-%d"));
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info")?;

    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut plan_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--plan" => plan_path = args.next().map(PathBuf::from),
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let config = match config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let mut generator = FixtureGenerator::new(config);
    if let Some(path) = plan_path {
        generator.apply_plan(&DirectivePlan::load(path)?)?;
    }

    let json = generator
        .generate_json::<Customer>()?
        .ok_or("customer could not be generated")?;
    println!("{json}");

    if let Some(report) = generator.last_report() {
        eprintln!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}
