//! Projection from PEP 621 `[project]` metadata to the Poetry-shaped view.
//!
//! `project` is a pure function over the loaded document tree: deterministic
//! for identical input and touching no process-wide state. The synthesized
//! view is regenerated wholesale on each read miss, never partially mutated.

use crate::document::DevSource;
use compat_core::{parse_dependency, translate, CompatError, CompatResult, VersionConstraint};
use toml::{Table, Value};

/// Entry-point group promoted to the Poetry `plugins` table
const PLUGIN_GROUP: &str = "poetry.application.plugin";

/// URL keys promoted from the `urls` table to top-level view keys
const PROMOTED_URLS: [&str; 3] = ["homepage", "documentation", "repository"];

/// Build the Poetry-shaped view from a PEP 621 document tree.
///
/// `doc` is the whole document as a plain value tree; `dev` supplies the
/// external dev-dependency bucket merged into `group.dev.dependencies`.
pub fn project(doc: &Table, dev: &DevSource) -> CompatResult<Table> {
    let metadata = doc
        .get("project")
        .and_then(Value::as_table)
        .ok_or_else(|| CompatError::UnrecognizedSchema {
            path: "project".to_string(),
            reason: "missing [project] table".to_string(),
        })?;

    let name = metadata
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| CompatError::MissingRequiredField {
            field: "name".to_string(),
        })?;

    let mut view = Table::new();
    view.insert("name".to_string(), Value::String(name.to_string()));
    view.insert(
        "version".to_string(),
        metadata
            .get("version")
            .cloned()
            .unwrap_or_else(|| Value::String("0.0.0".to_string())),
    );
    view.insert(
        "description".to_string(),
        metadata
            .get("description")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    view.insert(
        "authors".to_string(),
        Value::Array(convert_people(metadata.get("authors"))),
    );
    view.insert(
        "maintainers".to_string(),
        Value::Array(convert_people(metadata.get("maintainers"))),
    );

    // Poetry's license field is string-only; table form keeps text over file
    if let Some(license) = metadata.get("license") {
        match license {
            Value::String(_) => {
                view.insert("license".to_string(), license.clone());
            }
            Value::Table(table) => {
                if let Some(license) = table.get("text").or_else(|| table.get("file")) {
                    view.insert("license".to_string(), license.clone());
                }
            }
            _ => {}
        }
    }

    for copied in ["keywords", "classifiers"] {
        if let Some(Value::Array(entries)) = metadata.get(copied) {
            if !entries.is_empty() {
                view.insert(copied.to_string(), Value::Array(entries.clone()));
            }
        }
    }

    if let Some(readme) = metadata.get("readme") {
        match readme {
            Value::String(_) => {
                view.insert("readme".to_string(), readme.clone());
            }
            Value::Table(table) => {
                if let Some(file) = table.get("file") {
                    view.insert("readme".to_string(), file.clone());
                }
            }
            _ => {}
        }
    }

    if let Some(Value::Table(urls)) = metadata.get("urls") {
        let mut remaining = Table::new();
        for (key, value) in urls {
            let lowered = key.to_lowercase();
            if PROMOTED_URLS.contains(&lowered.as_str()) && !view.contains_key(&lowered) {
                view.insert(lowered, value.clone());
            } else {
                remaining.insert(key.clone(), value.clone());
            }
        }
        view.insert("urls".to_string(), Value::Table(remaining));
    }

    if let Some(scripts) = metadata.get("scripts") {
        view.insert("scripts".to_string(), scripts.clone());
    }

    if let Some(plugins) = metadata
        .get("entry-points")
        .and_then(Value::as_table)
        .and_then(|groups| groups.get(PLUGIN_GROUP))
    {
        let mut plugin_groups = Table::new();
        plugin_groups.insert(PLUGIN_GROUP.to_string(), plugins.clone());
        view.insert("plugins".to_string(), Value::Table(plugin_groups));
    }

    let mut dependencies = Table::new();
    if let Some(requires_python) = metadata.get("requires-python").and_then(Value::as_str) {
        let constraint = translate(requires_python);
        // a digit-free constraint (e.g. "*") yields no clauses and no entry
        if !constraint.is_empty() {
            dependencies.insert(
                "python".to_string(),
                Value::String(format!("{},<{}", constraint, python_upper_bound(&constraint))),
            );
        }
    }
    if let Some(Value::Array(lines)) = metadata.get("dependencies") {
        extract_dependencies(lines, &mut dependencies)?;
    }
    view.insert("dependencies".to_string(), Value::Table(dependencies));

    // The dev group is always present, even when empty
    let mut dev_dependencies = Table::new();
    if let Some(lines) = dev.bucket_lines(doc, "dev") {
        let lines: Vec<Value> = lines.into_iter().map(Value::String).collect();
        extract_dependencies(&lines, &mut dev_dependencies)?;
    }
    let mut dev_group = Table::new();
    dev_group.insert(
        "dependencies".to_string(),
        Value::Table(dev_dependencies),
    );
    let mut groups = Table::new();
    groups.insert("dev".to_string(), Value::Table(dev_group));
    view.insert("group".to_string(), Value::Table(groups));

    Ok(view)
}

/// Map requirement lines into a name-keyed descriptor table; the last entry
/// for a repeated name wins
fn extract_dependencies(lines: &[Value], target: &mut Table) -> CompatResult<()> {
    for line in lines {
        let Some(line) = line.as_str() else { continue };
        let (name, descriptor) = parse_dependency(line)?;
        target.insert(name, descriptor.to_value());
    }
    Ok(())
}

/// Poetry expects an explicit upper bound on the python constraint; exclude
/// the next major release line of the first clause (4.0.0 when unparsable)
fn python_upper_bound(constraint: &VersionConstraint) -> String {
    let major = constraint
        .first_clause()
        .and_then(|clause| {
            clause
                .version
                .split('.')
                .next()
                .and_then(|major| major.parse::<u64>().ok())
        })
        .unwrap_or(3);
    format!("{}.0.0", major + 1)
}

/// Convert standard author/maintainer entries to Poetry strings
fn convert_people(entries: Option<&Value>) -> Vec<Value> {
    let Some(Value::Array(entries)) = entries else {
        return Vec::new();
    };
    let mut people = Vec::new();
    for entry in entries {
        match entry {
            Value::Table(person) => {
                let name = person.get("name").and_then(Value::as_str);
                let email = person.get("email").and_then(Value::as_str);
                let rendered = match (name, email) {
                    (Some(name), Some(email)) => format!("{} <{}>", name, email),
                    (Some(name), None) => name.to_string(),
                    (None, Some(email)) => email.to_string(),
                    (None, None) => continue,
                };
                people.push(Value::String(rendered));
            }
            other => people.push(Value::String(
                other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
            )),
        }
    }
    people
}
