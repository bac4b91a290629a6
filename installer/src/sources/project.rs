//! Required-version constraints declared across a project tree.
//!
//! Every file under the working directory whose name ends in one of
//! [`ToolSpec::project_extensions`](crate::config::ToolSpec::project_extensions)
//! is read, and every literal `required_version` in a top-level `terraform`
//! block is collected. Hidden directories are not entered. When `main.tofu`
//! and `main.tf` sit side by side only the extension listed first is read;
//! the same holds for `main.tofu.json` and `main.tf.json`.
//!
//! Unlike the other sources this one accumulates: the result is the
//! conjunction of everything found. Files that fail to parse, non-literal
//! values, and malformed expressions are skipped with a warning because
//! unrelated files may share an extension.

use super::{Result, SourceKind, VersionRequirement, VersionSource, read_optional};
use crate::config::{Config, ToolSpec};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tvm_version::ConstraintSet;
use walkdir::{DirEntry, WalkDir};

/// The value of a matching attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeValue {
    /// A quoted string with no interpolation.
    Literal(String),
    /// Any other expression.
    NonLiteral,
}

/// Scans [`Config::work_path`] for project constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectConstraints;

impl ProjectConstraints {
    /// The conjunction of every valid constraint found under the working
    /// directory; empty when none were found.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Read`](super::SourceError::Read) when a
    /// matching file exists but cannot be read.
    pub fn gather(config: &Config) -> Result<ConstraintSet> {
        let mut combined = ConstraintSet::default();
        for path in project_files(&config.work_path, &config.tool) {
            let Some(text) = read_optional(&path)? else {
                continue;
            };
            for expression in declared_versions(&path, &text, &config.tool) {
                match expression.parse::<ConstraintSet>() {
                    Ok(set) => {
                        log::debug!("{path} requires {set}");
                        combined = combined.and(set);
                    }
                    Err(err) => log::warn!("ignoring \"{expression}\" in {path}: {err}"),
                }
            }
        }
        Ok(combined)
    }
}

impl VersionSource for ProjectConstraints {
    fn kind(&self) -> SourceKind {
        SourceKind::Project
    }

    fn probe(&self, config: &Config) -> Result<Option<VersionRequirement>> {
        let constraints = Self::gather(config)?;
        if constraints.is_empty() {
            log::debug!("no project constraints under {}", config.work_path);
            return Ok(None);
        }
        let requirement = VersionRequirement::new(SourceKind::Project, constraints.to_string())
            .at(&config.work_path);
        log::info!("resolved {requirement}");
        Ok(Some(requirement))
    }
}

/// Matching files under `root`, sorted, with same-stem duplicates of one
/// syntax collapsed to the earliest listed extension.
fn project_files(root: &Utf8Path, tool: &ToolSpec) -> Vec<Utf8PathBuf> {
    let mut chosen: BTreeMap<(Utf8PathBuf, String, bool), (usize, Utf8PathBuf)> = BTreeMap::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping part of {root}: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            continue;
        };
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            continue;
        };
        let Some((rank, stem)) = tool
            .project_extensions
            .iter()
            .enumerate()
            .find_map(|(rank, ext)| name.strip_suffix(ext.as_str()).map(|stem| (rank, stem)))
        else {
            continue;
        };
        // `.tofu` shadows `.tf` only within the same syntax.
        let json = name.ends_with(".json");
        let key = (parent.to_owned(), stem.to_owned(), json);
        if chosen.get(&key).is_some_and(|(kept, _)| *kept < rank) {
            continue;
        }
        chosen.insert(key, (rank, path));
    }
    chosen.into_values().map(|(_, path)| path).collect()
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

/// Literal constraint expressions declared in one file. Problems are logged
/// and yield nothing.
fn declared_versions(path: &Utf8Path, text: &str, tool: &ToolSpec) -> Vec<String> {
    let values = if path.as_str().ends_with(".json") {
        json_attributes(text, &tool.project_block, &tool.project_attribute)
    } else {
        hcl_attributes(text, &tool.project_block, &tool.project_attribute)
    };
    let values = match values {
        Ok(values) => values,
        Err(reason) => {
            log::warn!("skipping {path}: {reason}");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .filter_map(|value| match value {
            AttributeValue::Literal(expression) => Some(expression),
            AttributeValue::NonLiteral => {
                log::warn!(
                    "ignoring {} in {path}: value is not a literal string",
                    tool.project_attribute
                );
                None
            }
        })
        .collect()
}

/// The native form: `attribute` inside every top-level `block`, in order.
/// Nested blocks of the same name are not read.
fn hcl_attributes(
    text: &str,
    block: &str,
    attribute: &str,
) -> std::result::Result<Vec<AttributeValue>, String> {
    let body = hcl::parse(text).map_err(|err| err.to_string())?;
    let values = body
        .blocks()
        .filter(|candidate| candidate.identifier() == block)
        .flat_map(|candidate| candidate.body().attributes())
        .filter(|found| found.key() == attribute)
        .map(|found| match found.expr() {
            hcl::Expression::String(text) => AttributeValue::Literal(text.clone()),
            _ => AttributeValue::NonLiteral,
        })
        .collect();
    Ok(values)
}

/// The JSON form: `block` may be an object or an array of objects.
fn json_attributes(
    text: &str,
    block: &str,
    attribute: &str,
) -> std::result::Result<Vec<AttributeValue>, String> {
    let document: serde_json::Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
    let blocks = match document.get(block) {
        None => return Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };
    let values = blocks
        .into_iter()
        .filter_map(|body| body.get(attribute))
        .map(|value| match value {
            serde_json::Value::String(text) if !text.contains("${") => {
                AttributeValue::Literal(text.clone())
            }
            _ => AttributeValue::NonLiteral,
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;
    use rstest::rstest;
    use std::fs;

    fn write(root: &Utf8Path, relative: &str, text: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, text).expect("write");
    }

    fn terraform(expression: &str) -> String {
        format!("terraform {{\n  required_version = \"{expression}\"\n}}\n")
    }

    #[test]
    fn empty_project_is_not_found() {
        let (_temp, config) = test_config();
        assert_eq!(ProjectConstraints.probe(&config).expect("probe"), None);
    }

    #[test]
    fn constraints_accumulate_across_the_tree() {
        let (_temp, config) = test_config();
        write(&config.work_path, "main.tf", &terraform(">= 1.5.0"));
        write(&config.work_path, "modules/net/versions.tofu", &terraform("< 2.0.0"));

        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.to_string(), ">= 1.5.0, < 2.0.0");

        let found = ProjectConstraints.probe(&config).expect("probe").expect("found");
        assert_eq!(found.origin(), SourceKind::Project);
        assert_eq!(found.raw(), ">= 1.5.0, < 2.0.0");
    }

    #[test]
    fn first_listed_extension_shadows_same_stem() {
        let (_temp, config) = test_config();
        write(&config.work_path, "main.tofu", &terraform(">= 1.6.0"));
        write(&config.work_path, "main.tf", &terraform("< 1.0.0"));
        write(&config.work_path, "other.tf", &terraform("!= 1.6.1"));

        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.to_string(), ">= 1.6.0, != 1.6.1");
    }

    #[test]
    fn json_and_hcl_of_one_stem_are_both_read() {
        let (_temp, config) = test_config();
        write(&config.work_path, "main.tf", &terraform(">= 1.5.0"));
        write(
            &config.work_path,
            "main.tf.json",
            r#"{"terraform": {"required_version": "< 2.0.0"}}"#,
        );

        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.to_string(), ">= 1.5.0, < 2.0.0");
    }

    #[test]
    fn hidden_directories_are_not_entered() {
        let (_temp, config) = test_config();
        write(&config.work_path, ".terraform/modules/vpc/main.tf", &terraform("< 0.12.0"));
        write(&config.work_path, "main.tf", &terraform("~> 1.6"));

        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.clauses().len(), 1);
    }

    #[rstest]
    #[case::object(r#"{"terraform": {"required_version": ">= 1.6.0"}}"#)]
    #[case::array(r#"{"terraform": [{"backend": {}}, {"required_version": ">= 1.6.0"}]}"#)]
    fn json_files_are_read(#[case] text: &str) {
        let (_temp, config) = test_config();
        write(&config.work_path, "versions.tf.json", text);
        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.to_string(), ">= 1.6.0");
    }

    #[rstest]
    #[case::broken_hcl("main.tf", "terraform {\n")]
    #[case::broken_json("main.tf.json", "{ not json")]
    #[case::interpolated("main.tf", "terraform {\n  required_version = \"${var.v}\"\n}\n")]
    #[case::malformed_expression("main.tf", &terraform("around 1.6"))]
    #[case::numeric_json("main.tf.json", r#"{"terraform": {"required_version": 16}}"#)]
    fn problems_are_skipped(#[case] name: &str, #[case] text: &str) {
        let (_temp, config) = test_config();
        write(&config.work_path, name, text);
        write(&config.work_path, "versions.tofu", &terraform("< 2.0.0"));

        let set = ProjectConstraints::gather(&config).expect("gather");
        assert_eq!(set.to_string(), "< 2.0.0");
    }

    fn required(text: &str) -> Vec<AttributeValue> {
        hcl_attributes(text, "terraform", "required_version").expect("valid HCL")
    }

    fn literal(value: &str) -> AttributeValue {
        AttributeValue::Literal(value.to_owned())
    }

    #[test]
    fn finds_attribute_among_other_content() {
        let text = r#"
# providers
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
  required_version = ">= 1.6.0"
}

resource "aws_s3_bucket" "logs" {
  bucket = "logs-${var.env}"
  tags   = { Name = "logs", Env = var.env }
}
"#;
        assert_eq!(required(text), [literal(">= 1.6.0")]);
    }

    #[test]
    fn every_top_level_block_is_read() {
        let text = "terraform {\n  required_version = \">= 1.5\"\n}\n\
                    terraform {\n  required_version = \"< 2.0\"\n}\n";
        assert_eq!(required(text), [literal(">= 1.5"), literal("< 2.0")]);
    }

    #[test]
    fn nested_blocks_of_the_same_name_are_ignored() {
        let text = "module \"m\" {\n  terraform {\n    required_version = \"1.0.0\"\n  }\n}\n";
        assert!(required(text).is_empty());
    }

    #[rstest]
    #[case::interpolated("\"${var.version}\"")]
    #[case::directive("\"%{if true}1.6.0%{endif}\"")]
    #[case::reference("var.version")]
    #[case::function("format(\">= %s\", \"1.6\")")]
    #[case::heredoc("<<EOT\n>= 1.6\nEOT\n")]
    fn non_literal_values_are_reported(#[case] value: &str) {
        let text = format!("terraform {{\n  required_version = {value}\n}}\n");
        assert_eq!(required(&text), [AttributeValue::NonLiteral]);
    }

    #[rstest]
    #[case::escaped_quote(r#""a\"b""#, "a\"b")]
    #[case::unicode(r#""\u00e9""#, "\u{e9}")]
    fn strings_decode_escapes(#[case] value: &str, #[case] expected: &str) {
        let text = format!("terraform {{\n  required_version = {value}\n}}\n");
        assert_eq!(required(&text), [literal(expected)]);
    }

    #[test]
    fn comments_are_skipped() {
        let text = "/* terraform { required_version = \"0.1\" } */\n\
                    // terraform { required_version = \"0.2\" }\n\
                    terraform {\n  required_version = \"1.6.0\" # pinned\n}\n";
        assert_eq!(required(text), [literal("1.6.0")]);
    }

    #[rstest]
    #[case::unclosed_block("terraform {\n  required_version = \"1.6\"\n")]
    #[case::unterminated_string("terraform {\n  required_version = \"1.6\n}\n")]
    #[case::missing_value("terraform {\n  required_version =\n}\n")]
    fn malformed_hcl_is_an_error(#[case] text: &str) {
        assert!(hcl_attributes(text, "terraform", "required_version").is_err());
    }

    #[test]
    fn unrelated_extensions_are_ignored() {
        let (_temp, config) = test_config();
        write(&config.work_path, "main.tf.bak", &terraform("< 0.1.0"));
        write(&config.work_path, "notes.json", r#"{"terraform": {"required_version": "< 0.1.0"}}"#);
        assert!(ProjectConstraints::gather(&config).expect("gather").is_empty());
    }
}
