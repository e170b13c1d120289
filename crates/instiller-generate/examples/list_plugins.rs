use instiller_generate::PluginRegistry;

fn main() {
    let registry = PluginRegistry::with_defaults(Some(7));
    for name in registry.names() {
        match registry.invoke(name, "", "") {
            Ok(sample) => println!("{name:<14} {sample}"),
            Err(err) => println!("{name:<14} ({err})"),
        }
    }
}
