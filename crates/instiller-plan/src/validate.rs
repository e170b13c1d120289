use std::collections::HashSet;

use instiller_core::{FieldDescriptor, TypeExpr, TypeKind, TypeRegistry};
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{PlanError, ValidationIssue, ValidationReport};
use crate::model::{DirectiveLevel, DirectivePlan, DirectiveRule, PLAN_VERSION};

/// Plan that passed validation, with the warnings it produced.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: DirectivePlan,
    pub warnings: Vec<ValidationIssue>,
}

/// Check a plan document against the plan JSON Schema.
pub fn validate_plan_json(
    plan_json: &Value,
    plan_schema: &Value,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(plan_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }
    Ok(report)
}

/// Check every rule of a parsed plan against the described types.
///
/// `generators` lists the plugin names available to the engine that will
/// consume the plan.
pub fn validate_plan_against_types(
    plan: &DirectivePlan,
    types: &TypeRegistry,
    generators: &[&str],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if plan.plan_version != PLAN_VERSION {
        report.push(
            ValidationIssue::error(
                "plan_version_mismatch",
                "/plan_version",
                format!(
                    "plan_version '{}' is not supported (expected '{PLAN_VERSION}')",
                    plan.plan_version
                ),
            )
            .with_hint(format!("set plan_version to \"{PLAN_VERSION}\"")),
        );
    }

    let mut seen = HashSet::new();
    for (idx, rule) in plan.directives.iter().enumerate() {
        let base_path = format!("/directives/{idx}");
        if !seen.insert((rule.type_name.as_str(), rule.field.as_str(), rule.level)) {
            report.push(
                ValidationIssue::warning(
                    "duplicate_rule",
                    base_path.clone(),
                    format!(
                        "{} rule for '{}.{}' repeats an earlier rule",
                        level_label(rule.level),
                        rule.type_name,
                        rule.field
                    ),
                )
                .with_hint(match rule.level {
                    DirectiveLevel::Field => "only the first field rule takes effect",
                    DirectiveLevel::Class => "only the last class rule takes effect",
                }),
            );
        }
        validate_rule(rule, &base_path, types, generators, &mut report);
    }

    report
}

/// Validate the plan end to end, returning structured issues on failure.
pub fn validate_plan(
    plan_json: &Value,
    plan_schema: &Value,
    types: &TypeRegistry,
    generators: &[&str],
) -> Result<ValidatedPlan, ValidationReport> {
    let structural = validate_plan_json(plan_json, plan_schema).map_err(|err| {
        ValidationReport::single(ValidationIssue::error(
            "schema_validation_error",
            "/",
            err.to_string(),
        ))
    })?;
    if !structural.is_ok() {
        return Err(structural);
    }

    let plan: DirectivePlan = serde_json::from_value(plan_json.clone()).map_err(|err| {
        ValidationReport::single(ValidationIssue::error(
            "invalid_plan_json",
            "/",
            err.to_string(),
        ))
    })?;

    let mut report = structural;
    report.merge(validate_plan_against_types(&plan, types, generators));
    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedPlan {
        plan,
        warnings: report.warnings,
    })
}

fn validate_rule(
    rule: &DirectiveRule,
    base_path: &str,
    types: &TypeRegistry,
    generators: &[&str],
    report: &mut ValidationReport,
) {
    if rule.field.trim().is_empty() {
        report.push(
            ValidationIssue::error(
                "blank_field",
                format!("{base_path}/field"),
                format!("rule for '{}' names no field", rule.type_name),
            )
            .with_hint("class level rules must name the field they configure"),
        );
        return;
    }

    let Some(descriptor) = types.get(&rule.type_name) else {
        report.push(ValidationIssue::error(
            "unknown_type",
            format!("{base_path}/type"),
            format!("type '{}' is not described", rule.type_name),
        ));
        return;
    };
    let Some(composite) = descriptor.as_composite() else {
        report.push(ValidationIssue::error(
            "not_composite",
            format!("{base_path}/type"),
            format!("type '{}' has no fields", rule.type_name),
        ));
        return;
    };

    let Some(field) = composite.field(&rule.field) else {
        let mut issue = ValidationIssue::error(
            "unknown_field",
            format!("{base_path}/field"),
            format!("field '{}.{}' does not exist", rule.type_name, rule.field),
        );
        let declaring = types
            .composite_chain(&rule.type_name)
            .into_iter()
            .skip(1)
            .find(|(_, ancestor)| ancestor.field(&rule.field).is_some());
        if let Some((ancestor, _)) = declaring {
            issue = issue.with_hint(format!("the field is declared by '{ancestor}'"));
        }
        report.push(issue);
        return;
    };

    if let Some(generator) = &rule.directive.generator
        && !generators.iter().any(|known| *known == generator.as_str())
    {
        report.push(
            ValidationIssue::error(
                "unknown_generator",
                format!("{base_path}/generator"),
                format!("generator '{generator}' is not registered"),
            )
            .with_hint(format!("known generators: {}", generators.join(", "))),
        );
    }

    if rule.directive.cardinality > 0 && !matches!(field.ty, TypeExpr::Array(_)) {
        report.push(ValidationIssue::warning(
            "cardinality_ignored",
            format!("{base_path}/cardinality"),
            format!(
                "cardinality only applies to arrays; '{}' is {}",
                rule.field, field.ty
            ),
        ));
    }

    if !rule.directive.implementations.is_empty() {
        validate_implementations(rule, field, base_path, types, report);
    }
}

fn validate_implementations(
    rule: &DirectiveRule,
    field: &FieldDescriptor,
    base_path: &str,
    types: &TypeRegistry,
    report: &mut ValidationReport,
) {
    let target = field.ty.base_name();
    let is_abstract = target
        .and_then(|name| types.get(name))
        .is_some_and(|descriptor| matches!(descriptor.kind, TypeKind::Abstract { .. }));
    if !is_abstract {
        report.push(ValidationIssue::warning(
            "implementations_ignored",
            format!("{base_path}/implementations"),
            format!(
                "implementations only apply to abstract types; '{}' is {}",
                rule.field, field.ty
            ),
        ));
        return;
    }

    for (idx, implementation) in rule.directive.implementations.iter().enumerate() {
        let path = format!("{base_path}/implementations/{idx}");
        if !types.contains(implementation) {
            report.push(ValidationIssue::error(
                "unknown_implementation",
                path,
                format!("implementation '{implementation}' is not described"),
            ));
        } else if let Some(target) = target
            && !types.is_assignable(target, implementation)
        {
            report.push(ValidationIssue::warning(
                "implementation_not_assignable",
                path,
                format!("'{implementation}' cannot stand in for '{target}'"),
            ));
        }
    }
}

fn level_label(level: DirectiveLevel) -> &'static str {
    match level {
        DirectiveLevel::Field => "field",
        DirectiveLevel::Class => "class",
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
