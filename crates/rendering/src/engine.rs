//! Template rendering — placeholder scanning, dot-path resolution against
//! the context tree, and type-aware value formatting.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use notify_core::error::{NotifyError, NotifyResult};
use notify_core::types::{
    FormatStyle, Language, MessageTemplate, RenderedTemplate, TemplateContext, TemplateVariable,
    VariableFormat, VariableType,
};
use tracing::debug;

/// Result of scanning one template string for `{{...}}` tokens.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Trimmed inner paths of well-formed placeholders, in order.
    pub placeholders: Vec<String>,
    /// Human-readable descriptions of malformed brace sequences.
    pub malformed: Vec<String>,
}

/// Scan a template string for placeholders. An opening `{{` without a
/// closing `}}`, a stray `}}`, and an empty `{{}}` are reported as
/// malformed; the scanner keeps going past them.
pub fn scan(text: &str) -> Scan {
    let mut result = Scan::default();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            match text[i + 2..].find("}}") {
                Some(rel_end) => {
                    let inner = text[i + 2..i + 2 + rel_end].trim();
                    if inner.is_empty() {
                        result.malformed.push("empty placeholder {{}}".to_string());
                    } else {
                        result.placeholders.push(inner.to_string());
                    }
                    i += 2 + rel_end + 2;
                }
                None => {
                    result
                        .malformed
                        .push(format!("unclosed '{{{{' at byte {}", i));
                    i += 2;
                }
            }
        } else if bytes[i..].starts_with(b"}}") {
            result
                .malformed
                .push(format!("stray '}}}}' at byte {}", i));
            i += 2;
        } else {
            i += 1;
        }
    }
    result
}

/// Renders message templates against a typed context tree.
///
/// Rendering is a pure function of template + context: the same inputs
/// always produce the same output, and non-strict rendering never fails.
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render every template string of `template` against `context`.
    ///
    /// In strict mode a `required` variable that resolves to undefined with
    /// no declared default fails with `MissingVariable`. In non-strict mode
    /// unresolved placeholders render as the declared default, else the
    /// empty string; the output never contains placeholder syntax.
    pub fn render(
        &self,
        template: &MessageTemplate,
        context: &TemplateContext,
        strict: bool,
    ) -> NotifyResult<RenderedTemplate> {
        let title = self.render_string(&template.title_template, template, context, strict)?;
        let body = self.render_string(&template.body_template, template, context, strict)?;
        let action_text = template
            .action_text_template
            .as_deref()
            .map(|t| self.render_string(t, template, context, strict))
            .transpose()?;
        let action_url = template
            .action_url_template
            .as_deref()
            .map(|t| self.render_string(t, template, context, strict))
            .transpose()?;

        debug!(template_id = %template.id, strict, "Rendered template");
        Ok(RenderedTemplate {
            title,
            body,
            action_text,
            action_url,
        })
    }

    fn render_string(
        &self,
        text: &str,
        template: &MessageTemplate,
        context: &TemplateContext,
        strict: bool,
    ) -> NotifyResult<String> {
        let mut output = String::with_capacity(text.len());
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i..].starts_with(b"{{") {
                if let Some(rel_end) = text[i + 2..].find("}}") {
                    let path = text[i + 2..i + 2 + rel_end].trim();
                    if !path.is_empty() {
                        output.push_str(&self.substitute(path, template, context, strict)?);
                    }
                    i += 2 + rel_end + 2;
                    continue;
                }
                // Unclosed braces render as nothing; validate reports them.
                i += 2;
                continue;
            }
            if bytes[i..].starts_with(b"}}") {
                // Stray closers are swallowed too.
                i += 2;
                continue;
            }
            let ch = text[i..].chars().next().unwrap_or('\u{fffd}');
            output.push(ch);
            i += ch.len_utf8();
        }
        Ok(output)
    }

    fn substitute(
        &self,
        path: &str,
        template: &MessageTemplate,
        context: &TemplateContext,
        strict: bool,
    ) -> NotifyResult<String> {
        let declared = template.variables.iter().find(|v| v.name == path);
        let resolved = context.resolve(path).cloned();

        let value = match (resolved, declared) {
            (Some(v), _) if !v.is_null() => Some(v),
            (_, Some(var)) if var.default_value.is_some() => var.default_value.clone(),
            (_, Some(var)) if strict && var.required => {
                return Err(NotifyError::MissingVariable {
                    name: var.name.clone(),
                });
            }
            _ => None,
        };

        match value {
            Some(v) => Ok(format_value(&v, declared, template.language)),
            None => Ok(String::new()),
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Value formatting ───────────────────────────────────────────────────

/// Format a resolved value by its declared type. Undeclared variables are
/// coerced to literal strings.
fn format_value(
    value: &serde_json::Value,
    declared: Option<&TemplateVariable>,
    language: Language,
) -> String {
    let var_type = declared.map(|v| v.var_type).unwrap_or(VariableType::String);
    let format = declared.and_then(|v| v.format.as_ref());

    match var_type {
        VariableType::Date => format_date(value, format, language),
        VariableType::Number => format_number(value, format, language),
        VariableType::Boolean => format_boolean(value, language),
        VariableType::String => coerce_string(value),
    }
}

fn coerce_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_boolean(value: &serde_json::Value, language: Language) -> String {
    let truthy = match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s == "true",
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        _ => false,
    };
    match (language, truthy) {
        (Language::En, true) => "yes".to_string(),
        (Language::En, false) => "no".to_string(),
        (Language::Fa, true) => "بله".to_string(),
        (Language::Fa, false) => "خیر".to_string(),
    }
}

fn format_number(
    value: &serde_json::Value,
    format: Option<&VariableFormat>,
    language: Language,
) -> String {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => match s.parse::<f64>() {
            Ok(parsed) => parsed,
            Err(_) => return s.clone(),
        },
        other => return coerce_string(other),
    };

    let style = format.and_then(|f| f.style);
    let decimals = format
        .and_then(|f| f.options.as_ref())
        .and_then(|o| o.get("decimals"))
        .and_then(|d| d.as_u64());

    match style {
        Some(FormatStyle::Currency) => {
            let formatted = group_thousands(n, decimals.unwrap_or(2) as usize);
            match language {
                Language::En => format!("${}", formatted),
                Language::Fa => format!("{} ریال", formatted),
            }
        }
        Some(FormatStyle::Percent) => {
            let formatted = group_thousands(n * 100.0, decimals.unwrap_or(0) as usize);
            format!("{}%", formatted)
        }
        _ => {
            let decimals = decimals
                .map(|d| d as usize)
                .unwrap_or(if n.fract() == 0.0 { 0 } else { 2 });
            group_thousands(n, decimals)
        }
    }
}

/// Fixed-decimal rendering with comma grouping on the integer part.
fn group_thousands(n: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (idx, ch) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn format_date(
    value: &serde_json::Value,
    format: Option<&VariableFormat>,
    language: Language,
) -> String {
    let date = match parse_date(value) {
        Some(d) => d,
        None => return coerce_string(value),
    };

    // A custom strftime pattern in the options blob wins over named styles.
    if let Some(pattern) = format
        .and_then(|f| f.options.as_ref())
        .and_then(|o| o.get("pattern"))
        .and_then(|p| p.as_str())
    {
        return date.format(pattern).to_string();
    }

    let style = format
        .and_then(|f| f.style)
        .unwrap_or(FormatStyle::Medium);

    match language {
        Language::En => match style {
            FormatStyle::Short => date.format("%m/%d/%Y").to_string(),
            FormatStyle::Medium => date.format("%b %-d, %Y").to_string(),
            FormatStyle::Long => date.format("%B %-d, %Y").to_string(),
            FormatStyle::Full => date.format("%A, %B %-d, %Y").to_string(),
            _ => date.format("%b %-d, %Y").to_string(),
        },
        // Numeric styles for fa; month-name localization lives upstream.
        Language::Fa => match style {
            FormatStyle::Short => date.format("%Y/%m/%d").to_string(),
            _ => format!("{}/{:02}/{:02}", date.year(), date.month(), date.day()),
        },
    }
}

fn parse_date(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .ok(),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
