//! Format templates
//!
//! A template is plain text with `{field}` placeholders. `{field:.N}` renders
//! a number with N decimals and `{{` / `}}` produce literal braces. Templates
//! are parsed once at startup so a malformed one fails before the module runs.

use crate::constants::MISSING_FIELD;
use crate::error::{ConfigError, TemplateError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use waystat_types::{Fields, FormatTemplate};

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("valid token regex"));

static FIELD_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*)(?::\.(\d{1,2}))?$").expect("valid field regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { name: String, precision: Option<usize> },
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN.captures_iter(source) {
            let token = caps.get(0).expect("group 0 always present");
            check_literal(&source[last..token.start()], last)?;
            literal.push_str(&source[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                _ => {
                    let spec = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let field = FIELD_SPEC.captures(spec.trim()).ok_or_else(|| {
                        TemplateError::InvalidField {
                            spec: spec.to_string(),
                            offset: token.start(),
                        }
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        name: field[1].to_string(),
                        precision: field.get(2).and_then(|p| p.as_str().parse().ok()),
                    });
                }
            }
        }

        check_literal(&source[last..], last)?;
        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all referenced fields, in order of appearance
    pub fn field_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn render(&self, fields: &Fields) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, precision } => match fields.get(name) {
                    Some(value) => out.push_str(&render_value(value, *precision)),
                    None => out.push_str(MISSING_FIELD),
                },
            }
        }
        out
    }
}

fn check_literal(text: &str, offset: usize) -> Result<(), TemplateError> {
    if let Some(pos) = text.find('{') {
        return Err(TemplateError::Unclosed(offset + pos));
    }
    if let Some(pos) = text.find('}') {
        return Err(TemplateError::UnmatchedClose(offset + pos));
    }
    Ok(())
}

/// Render a single field value the way it appears in bar text
pub fn render_value(value: &Value, precision: Option<usize>) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (precision, n.as_f64()) {
            (Some(p), Some(f)) => format!("{:.*}", p, f),
            _ if n.is_i64() || n.is_u64() => n.to_string(),
            (None, Some(f)) => pad_float(f),
            _ => n.to_string(),
        },
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Null => MISSING_FIELD.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, precision))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Integral floats lose their fraction, everything else gets two decimals
pub fn pad_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// A format with its templates parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormat {
    pub text: Template,
    pub tooltip: Option<Template>,
    pub target: Option<String>,
}

impl CompiledFormat {
    pub fn compile(index: usize, format: &FormatTemplate) -> Result<Self, ConfigError> {
        let wrap = |source| ConfigError::InvalidTemplate { index, source };
        Ok(Self {
            text: Template::parse(&format.text).map_err(wrap)?,
            tooltip: format
                .tooltip
                .as_deref()
                .map(Template::parse)
                .transpose()
                .map_err(wrap)?,
            target: format.target.clone(),
        })
    }

    /// Whether switching from `self` to `next` needs a new collection
    pub fn requires_fetch_for(&self, next: &CompiledFormat) -> bool {
        self.target != next.target
    }
}

/// Compile every format, failing on the first malformed template
pub fn compile_formats(formats: &[FormatTemplate]) -> Result<Vec<CompiledFormat>, ConfigError> {
    formats
        .iter()
        .enumerate()
        .map(|(index, format)| CompiledFormat::compile(index, format))
        .collect()
}
