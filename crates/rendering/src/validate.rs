//! Static template validation — structural checks that run without a
//! rendering context, for authoring-time feedback.

use crate::engine::scan;
use notify_core::types::MessageTemplate;
use serde::{Deserialize, Serialize};

/// Outcome of validating a template. `is_valid` is false only on
/// structural errors, never on warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

const RECOGNIZED_PREFIXES: [&str; 4] = ["user.", "session.", "system.", "custom."];

/// Validate a template's placeholder syntax and variable usage.
pub fn validate(template: &MessageTemplate) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut used_paths: Vec<String> = Vec::new();

    let fields = [
        ("title", Some(template.title_template.as_str())),
        ("body", Some(template.body_template.as_str())),
        ("action_text", template.action_text_template.as_deref()),
        ("action_url", template.action_url_template.as_deref()),
    ];

    for (field, text) in fields {
        let Some(text) = text else { continue };
        let scan = scan(text);
        for issue in &scan.malformed {
            errors.push(format!("{}: {}", field, issue));
        }
        for path in &scan.placeholders {
            let declared = template.variables.iter().any(|v| v.name == *path);
            let recognized = RECOGNIZED_PREFIXES.iter().any(|p| path.starts_with(p));
            if !declared && !recognized {
                warnings.push(format!(
                    "{}: placeholder '{}' is not declared and not under a known namespace",
                    field, path
                ));
            }
            used_paths.push(path.clone());
        }
    }

    if let Some(url) = template.action_url_template.as_deref() {
        let has_variables = !scan(url).placeholders.is_empty();
        let looks_like_url =
            url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/');
        if !has_variables && !looks_like_url {
            warnings.push(format!(
                "action_url: '{}' is neither a variable template nor an absolute/relative URL",
                url
            ));
        }
    }

    for var in &template.variables {
        if var.required && !used_paths.iter().any(|p| p == &var.name) {
            warnings.push(format!(
                "required variable '{}' is declared but never used",
                var.name
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_template, make_variable};
    use notify_core::types::{Language, VariableSource, VariableType};

    #[test]
    fn test_clean_template_is_valid() {
        let template = make_template(
            "Hi {{user.name}}",
            "Session at {{session.start_time}}",
            Language::En,
        );
        let report = validate(&template);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_malformed_braces_are_errors() {
        let template = make_template("Hi {{user.name", "ok", Language::En);
        let report = validate(&template);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("title:"));
    }

    #[test]
    fn test_unknown_placeholder_is_warning_not_error() {
        let template = make_template("Hi {{member.name}}", "ok", Language::En);
        let report = validate(&template);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_declared_placeholder_outside_namespaces_is_accepted() {
        let mut template = make_template("{{phrase.greeting}}", "ok", Language::En);
        template.variables.push(make_variable(
            "phrase.greeting",
            VariableType::String,
            VariableSource::Custom,
            false,
        ));
        let report = validate(&template);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_action_url_shape_warning() {
        let mut template = make_template("t", "b", Language::En);
        template.action_url_template = Some("dashboard".to_string());
        let report = validate(&template);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.starts_with("action_url:")));

        template.action_url_template = Some("/dashboard".to_string());
        assert!(validate(&template).warnings.is_empty());

        template.action_url_template = Some("{{custom.url}}".to_string());
        assert!(validate(&template).warnings.is_empty());
    }

    #[test]
    fn test_unused_required_variable_warning() {
        let mut template = make_template("Hello", "World", Language::En);
        template.variables.push(make_variable(
            "user.name",
            VariableType::String,
            VariableSource::User,
            true,
        ));
        let report = validate(&template);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("declared but never used")));
    }
}
