use std::env;

use instiller_plan::plan_json_schema;

/// Print the directive plan JSON Schema, or write it to the path given as
/// first argument.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&plan_json_schema())?;
    match env::args().nth(1) {
        Some(path) => std::fs::write(&path, format!("{json}\n"))?,
        None => println!("{json}"),
    }
    Ok(())
}
