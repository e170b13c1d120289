use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use instiller_core::{
    AliasStore, FieldKey, Fixture, GeneratedValue, GenerationDirective, ScalarKind, TypeExpr,
    TypeKind, TypeRegistry, alias_reference,
};
use instiller_plan::DirectivePlan;

use crate::converter::{Category, categorize};
use crate::directives::DirectiveStore;
use crate::errors::{GenerationError, Result};
use crate::generators::{GeneratorPlugin, PluginRegistry};
use crate::guard::RecursionGuard;
use crate::model::{FixtureReport, GenerationIssue, GeneratorConfig};
use crate::persistence;

/// Concrete types tried, in order, when an abstract field names no candidate.
pub const DEFAULT_IMPLEMENTATIONS: &[&str] = &["Vec", "BTreeSet", "BTreeMap"];

/// Entries synthesized for every map.
pub const MAP_CARDINALITY: usize = 1;

/// Synthesizes populated instances of described types.
///
/// Directive registrations accumulate across runs; aliases, recursion
/// bookkeeping and the report start over with every top-level call.
#[derive(Debug)]
pub struct FixtureGenerator {
    config: GeneratorConfig,
    types: TypeRegistry,
    plugins: PluginRegistry,
    directives: DirectiveStore,
    last_report: Option<FixtureReport>,
}

impl Default for FixtureGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl FixtureGenerator {
    /// Generator with the built-in plugins, seeded from `config`.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            plugins: PluginRegistry::with_defaults(config.seed),
            config,
            types: TypeRegistry::new(),
            directives: DirectiveStore::new(),
            last_report: None,
        }
    }

    /// Live configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// How often a composite type may re-enter itself.
    pub fn recursion_level(&self) -> usize {
        self.config.recursion_level
    }

    /// Applies from the next run on.
    pub fn set_recursion_level(&mut self, level: usize) {
        self.config.recursion_level = level;
    }

    /// Element count for collections and arrays without a cardinality.
    pub fn default_cardinality(&self) -> usize {
        self.config.default_cardinality
    }

    /// Applies from the next run on.
    pub fn set_default_cardinality(&mut self, cardinality: usize) {
        self.config.default_cardinality = cardinality;
    }

    /// Register (or replace) the plugin used for directives naming `name`.
    pub fn register_plugin(
        &mut self,
        name: impl Into<String>,
        plugin: impl GeneratorPlugin + 'static,
    ) {
        self.plugins.register(name, plugin);
    }

    /// Plugin registered under `name`.
    pub fn plugin(&self, name: &str) -> Option<&dyn GeneratorPlugin> {
        self.plugins.get(name)
    }

    /// Every registered plugin.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Types described so far.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Describe extra types, such as the arguments of a root expression.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Directives registered so far.
    pub fn directives(&self) -> &DirectiveStore {
        &self.directives
    }

    /// Register directives by hand.
    pub fn directives_mut(&mut self) -> &mut DirectiveStore {
        &mut self.directives
    }

    /// Load directives from a plan document.
    pub fn apply_plan(&mut self, plan: &DirectivePlan) -> Result<()> {
        self.directives.apply_plan(plan)
    }

    /// Report of the most recent top-level run, failed ones included.
    pub fn last_report(&self) -> Option<&FixtureReport> {
        self.last_report.as_ref()
    }

    /// Build a populated `T`.
    ///
    /// Returns `Ok(None)` when `T` cannot be built on its own (inner types).
    pub fn generate<T>(&mut self) -> Result<Option<T>>
    where
        T: Fixture + DeserializeOwned,
    {
        let root = self.types.describe::<T>();
        let Some(value) = self.generate_value(&root)? else {
            return Ok(None);
        };
        let json = value.to_json()?;
        Ok(Some(serde_json::from_value(json)?))
    }

    /// Build a populated `T` and persist it as pretty JSON.
    pub fn generate_json<T>(&mut self) -> Result<Option<String>>
    where
        T: Fixture + Serialize + DeserializeOwned,
    {
        match self.generate::<T>()? {
            Some(instance) => persistence::to_json(&instance).map(Some),
            None => Ok(None),
        }
    }

    /// Synthesize the value tree of `root` without building a typed instance.
    pub fn generate_value(&mut self, root: &TypeExpr) -> Result<Option<GeneratedValue>> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = FixtureReport::new(run_id.clone(), root.to_string());

        info!(
            run_id = %run_id,
            root = %root,
            recursion_level = self.config.recursion_level,
            default_cardinality = self.config.default_cardinality,
            "fixture generation started"
        );

        let outcome = self.run(root, &run_id, &mut report);
        match &outcome {
            Ok(Some(_)) => info!(
                run_id = %run_id,
                aliases = report.aliases_created,
                warnings = report.warnings.len(),
                "fixture generation completed"
            ),
            Ok(None) => info!(run_id = %run_id, "fixture generation produced no value"),
            Err(err) => warn!(run_id = %run_id, error = %err, "fixture generation failed"),
        }
        self.last_report = Some(report);
        outcome
    }

    fn run(
        &mut self,
        root: &TypeExpr,
        run_id: &str,
        report: &mut FixtureReport,
    ) -> Result<Option<GeneratedValue>> {
        let descriptor = self.types.resolve(root)?;
        let root_name = descriptor.name.clone();

        if let Some(composite) = descriptor.as_composite() {
            if composite.inner {
                let issue = GenerationIssue::new(
                    "inner_type_skipped",
                    format!("'{root_name}' needs an enclosing instance and cannot be built alone"),
                )
                .with_type(root_name.as_str());
                warn!(run_id, type_name = %root_name, "{}", issue.message);
                report.record_warning(issue);
                return Ok(None);
            }
            self.directives.register_type(&self.types, &root_name)?;
        }

        let mut run = Run {
            run_id,
            types: &self.types,
            plugins: &self.plugins,
            directives: &mut self.directives,
            config: &self.config,
            guard: RecursionGuard::new(self.config.recursion_level),
            abstract_path: Vec::new(),
            aliases: AliasStore::new(),
            report,
        };
        let resolved = run.resolve(root, None);
        run.report.composite_entries = run
            .guard
            .entries()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        let mut value = resolved?;

        let aliases = std::mem::take(&mut run.aliases);
        if !aliases.is_empty() {
            inject_aliases(&self.types, &root_name, &mut value, aliases)?;
        }
        Ok(Some(value))
    }
}

/// Write the run's aliases into the first alias store field of the root.
fn inject_aliases(
    types: &TypeRegistry,
    root_name: &str,
    value: &mut GeneratedValue,
    aliases: AliasStore,
) -> Result<()> {
    let target = types
        .composite_chain(root_name)
        .into_iter()
        .flat_map(|(_, composite)| composite.fields.iter())
        .filter(|field| !field.is_static)
        .find(|field| {
            types
                .resolve(&field.ty)
                .is_ok_and(|descriptor| descriptor.kind == TypeKind::AliasStore)
        });

    let Some(field) = target else {
        return Err(GenerationError::AliasWrite(format!(
            "'{root_name}' declares no AliasStore field to hold {} aliases",
            aliases.len()
        )));
    };
    if !value.set_field(&field.name, GeneratedValue::Aliases(aliases)) {
        return Err(GenerationError::AliasWrite(format!(
            "'{root_name}' did not produce an object"
        )));
    }
    Ok(())
}

/// Field being populated: its identity and the directive active for it.
struct Site {
    key: FieldKey,
    directive: Option<GenerationDirective>,
}

/// State of one top-level run.
struct Run<'a> {
    run_id: &'a str,
    types: &'a TypeRegistry,
    plugins: &'a PluginRegistry,
    directives: &'a mut DirectiveStore,
    config: &'a GeneratorConfig,
    guard: RecursionGuard,
    /// Abstract types being substituted since the last composite boundary.
    abstract_path: Vec<String>,
    aliases: AliasStore,
    report: &'a mut FixtureReport,
}

impl Run<'_> {
    fn resolve(&mut self, ty: &TypeExpr, site: Option<&Site>) -> Result<GeneratedValue> {
        match categorize(self.types, ty)? {
            Category::Scalar(kind) => self.scalar(kind, site),
            Category::Enum { name, constants } => {
                let text = self.primitive_text(site)?;
                Ok(GeneratedValue::Enum(enum_constant(name, constants, &text)?))
            }
            Category::EnumSet { name, constants } => {
                let text = self.primitive_text(site)?;
                Ok(GeneratedValue::Sequence(vec![GeneratedValue::Enum(
                    enum_constant(name, constants, &text)?,
                )]))
            }
            Category::Array(element) => {
                let cardinality = site
                    .and_then(|site| site.directive.as_ref())
                    .map(|directive| directive.cardinality)
                    .filter(|cardinality| *cardinality > 0)
                    .unwrap_or(self.config.default_cardinality);
                self.slots(element, site, cardinality)
                    .map(GeneratedValue::Array)
            }
            Category::Sequence { element, .. } => {
                let text = TypeExpr::named("String");
                let element = match element {
                    None | Some(TypeExpr::Unresolved) => &text,
                    Some(element) => element,
                };
                if element.is_generic() {
                    self.warn(
                        GenerationIssue::new(
                            "nested_collection_unsupported",
                            format!("collections of '{element}' are left empty"),
                        )
                        .with_field(site.map(|site| site.key.to_string()))
                        .with_type(ty.to_string()),
                    );
                    return Ok(GeneratedValue::Sequence(Vec::new()));
                }
                self.slots(element, site, self.config.default_cardinality)
                    .map(GeneratedValue::Sequence)
            }
            Category::Map { key, value } => {
                let text = TypeExpr::named("String");
                let key_type = key.filter(|key| **key != TypeExpr::Unresolved).unwrap_or(&text);
                let value_type = value
                    .filter(|value| **value != TypeExpr::Unresolved)
                    .unwrap_or(&text);
                let mut entries = Vec::with_capacity(MAP_CARDINALITY);
                for _ in 0..MAP_CARDINALITY {
                    let key = self.resolve(key_type, site)?;
                    let value = self.resolve(value_type, site)?;
                    if !key.is_absent() && !value.is_absent() {
                        entries.push((key, value));
                    }
                }
                Ok(GeneratedValue::Map(entries))
            }
            Category::Polymorphic { name, tagged } => self.polymorphic(ty, name, tagged, site),
            Category::Composite { name, .. } => self.composite(name, site),
            Category::AliasStore => Ok(GeneratedValue::Absent),
        }
    }

    fn slots(
        &mut self,
        element: &TypeExpr,
        site: Option<&Site>,
        cardinality: usize,
    ) -> Result<Vec<GeneratedValue>> {
        let mut items = Vec::with_capacity(cardinality);
        for _ in 0..cardinality {
            let item = self.resolve(element, site)?;
            if !item.is_absent() {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn scalar(&mut self, kind: ScalarKind, site: Option<&Site>) -> Result<GeneratedValue> {
        if let ScalarKind::Date { format } = kind {
            // Directive text is still resolved so aliases and plugin usage
            // are recorded; dates themselves always carry the current time.
            if let Some(directive) = site.and_then(|site| site.directive.as_ref()) {
                self.directive_text(directive)?;
            }
            return Ok(GeneratedValue::text(kind, Utc::now().format(format).to_string()));
        }

        if kind.is_primitive() {
            return Ok(GeneratedValue::text(kind, self.primitive_text(site)?));
        }

        let text = match site {
            Some(Site {
                directive: Some(directive),
                ..
            }) => self.directive_text(directive)?,
            Some(site) => site.key.field.clone(),
            None => "text".to_string(),
        };
        Ok(GeneratedValue::text(kind, text))
    }

    /// Text for numeric, boolean, char and enum leaves.
    ///
    /// These cannot hold a `${alias}` reference, so they receive the alias
    /// value itself; missing or empty text reads as `"0"`.
    fn primitive_text(&mut self, site: Option<&Site>) -> Result<String> {
        let Some(directive) = site.and_then(|site| site.directive.as_ref()) else {
            return Ok("0".to_string());
        };
        let mut text = self.directive_text(directive)?;
        if let Some(alias) = &directive.alias
            && text == alias_reference(alias)
        {
            text = self.aliases.get(alias).unwrap_or_default().to_string();
        }
        if text.trim().is_empty() {
            text = "0".to_string();
        }
        Ok(text)
    }

    /// Seed or plugin output for a directive, routed through its alias.
    fn directive_text(&mut self, directive: &GenerationDirective) -> Result<String> {
        if let Some(alias) = &directive.alias
            && self.aliases.contains(alias)
        {
            return Ok(alias_reference(alias));
        }

        let text = match &directive.generator {
            Some(generator) => {
                let pattern = directive.pattern.as_deref().unwrap_or_default();
                let text = self.plugins.invoke(generator, pattern, &directive.value)?;
                self.report.record_generator_usage(generator);
                debug!(run_id = self.run_id, generator = %generator, "plugin invoked");
                text
            }
            None => directive.value.clone(),
        };

        match &directive.alias {
            Some(alias) => {
                if self.aliases.insert(alias.clone(), text) {
                    self.report.record_alias();
                }
                Ok(alias_reference(alias))
            }
            None => Ok(text),
        }
    }

    fn polymorphic(
        &mut self,
        ty: &TypeExpr,
        name: &str,
        tagged: bool,
        site: Option<&Site>,
    ) -> Result<GeneratedValue> {
        if self.abstract_path.iter().any(|seen| seen == name) {
            self.warn(
                GenerationIssue::new(
                    "cyclic_abstract_type",
                    format!("'{name}' resolves back to itself through its implementations"),
                )
                .with_field(site.map(|site| site.key.to_string()))
                .with_type(name),
            );
            return Ok(GeneratedValue::Absent);
        }

        self.abstract_path.push(name.to_string());
        let value = self.implementation(ty, name, tagged, site);
        self.abstract_path.pop();
        value
    }

    fn implementation(
        &mut self,
        ty: &TypeExpr,
        name: &str,
        tagged: bool,
        site: Option<&Site>,
    ) -> Result<GeneratedValue> {
        let requested = site
            .and_then(|site| site.directive.as_ref())
            .map(|directive| directive.implementations.clone())
            .unwrap_or_default();
        let candidates = requested
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_IMPLEMENTATIONS.iter().copied());

        for candidate in candidates {
            if candidate == name
                || !self.types.contains(candidate)
                || !self.types.is_assignable(name, candidate)
            {
                continue;
            }
            let concrete = ty.with_base(candidate);
            debug!(run_id = self.run_id, abstract_type = name, candidate, "abstract type resolved");
            let value = self.resolve(&concrete, site)?;
            if value.is_absent() || !tagged {
                return Ok(value);
            }
            return Ok(GeneratedValue::Tagged {
                tag: candidate.to_string(),
                value: Box::new(value),
            });
        }

        self.warn(
            GenerationIssue::new(
                "unresolved_abstract_type",
                format!("no assignable implementation found for '{name}'"),
            )
            .with_field(site.map(|site| site.key.to_string()))
            .with_type(name),
        );
        Ok(GeneratedValue::Absent)
    }

    fn composite(&mut self, name: &str, site: Option<&Site>) -> Result<GeneratedValue> {
        let entered = match site {
            Some(site) => self.guard.enter(&site.key, name),
            None => self.guard.enter_type(name),
        };
        if !entered {
            let position = site.map_or_else(|| name.to_string(), |site| site.key.to_string());
            debug!(run_id = self.run_id, field = %position, "recursion limit reached");
            self.report.record_cutoff(&position);
            return Ok(GeneratedValue::Absent);
        }
        let outer = std::mem::take(&mut self.abstract_path);
        let value = self.composite_fields(name);
        self.abstract_path = outer;
        self.guard.exit();
        value
    }

    fn composite_fields(&mut self, name: &str) -> Result<GeneratedValue> {
        self.directives.register_type(self.types, name)?;
        let types = self.types;

        let mut fields = Vec::new();
        for (owner, composite) in types.composite_chain(name).into_iter().rev() {
            for field in &composite.fields {
                if field.is_static || field.omitted {
                    continue;
                }
                let key = FieldKey::new(owner, field.name.as_str());
                let directive = self.directives.get(&key).cloned();
                if directive.as_ref().is_some_and(|directive| directive.skip) {
                    continue;
                }

                let inner = field
                    .ty
                    .base_name()
                    .and_then(|base| types.get(base))
                    .and_then(|descriptor| descriptor.as_composite())
                    .is_some_and(|composite| composite.inner);
                if inner {
                    self.warn(
                        GenerationIssue::new(
                            "inner_type_skipped",
                            format!("'{}' needs an enclosing instance", field.ty),
                        )
                        .with_field(Some(key.to_string()))
                        .with_type(field.ty.to_string()),
                    );
                    continue;
                }

                let site = Site { key, directive };
                let value = self.resolve(&field.ty, Some(&site))?;
                fields.push((field.name.clone(), value));
            }
        }
        Ok(GeneratedValue::Object(fields))
    }

    fn warn(&mut self, issue: GenerationIssue) {
        warn!(
            run_id = self.run_id,
            code = %issue.code,
            field = issue.field.as_deref().unwrap_or("-"),
            "{}",
            issue.message
        );
        self.report.record_warning(issue);
    }
}

fn enum_constant(name: &str, constants: &[String], text: &str) -> Result<String> {
    text.trim()
        .parse::<usize>()
        .ok()
        .and_then(|ordinal| constants.get(ordinal))
        .cloned()
        .ok_or_else(|| GenerationError::EnumOrdinal {
            value: text.to_string(),
            type_name: name.to_string(),
        })
}
