//! The configuration editor's form.
//!
//! Controls come from a fixed schema rather than from whatever keys the
//! document happens to contain: each field has a path, a kind that decides
//! how input is coerced, and a default used when the document lacks it.
//! Saving rebuilds a fresh nested document from those paths.

use serde_json::{Map, Value};
use thiserror::Error;

use super::format::escape_html;
use crate::api::ConfigDocument;

/// How a control edits its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Checkbox,
    Integer,
    Float,
    Text,
    /// Text rendered as a password input.
    Secret,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Read a document value for a control of `kind`. Values of the wrong
    /// type are treated as missing.
    fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        match kind {
            FieldKind::Checkbox => value.as_bool().map(Self::Bool),
            FieldKind::Integer => value
                .as_i64()
                .or_else(|| value.as_f64().and_then(whole_number))
                .map(Self::Integer),
            FieldKind::Float => value.as_f64().map(Self::Float),
            FieldKind::Text | FieldKind::Secret => {
                value.as_str().map(|s| Self::Text(s.to_string()))
            }
            FieldKind::Choice(options) => value
                .as_str()
                .filter(|s| options.contains(s))
                .map(|s| Self::Text(s.to_string())),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Const-friendly default value.
#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl DefaultValue {
    fn value(self) -> FieldValue {
        match self {
            Self::Bool(b) => FieldValue::Bool(b),
            Self::Int(n) => FieldValue::Integer(n),
            Self::Float(f) => FieldValue::Float(f),
            Self::Str(s) => FieldValue::Text(s.to_string()),
        }
    }
}

/// One schema entry.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    default: DefaultValue,
}

const fn field(key: &'static str, label: &'static str, kind: FieldKind, default: DefaultValue) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind,
        default,
    }
}

pub const THEMES: &[&str] = &["light", "dark"];

/// Fields of every `models.<name>` group.
pub const MODEL_FIELDS: &[FieldSpec] = &[
    field("endpoint", "Endpoint", FieldKind::Text, DefaultValue::Str("")),
    field("api_key", "API key", FieldKind::Secret, DefaultValue::Str("")),
    field("temperature", "Temperature", FieldKind::Float, DefaultValue::Float(0.7)),
    field("max_tokens", "Max tokens", FieldKind::Integer, DefaultValue::Int(4096)),
    field("enabled", "Enabled", FieldKind::Checkbox, DefaultValue::Bool(true)),
];

pub const SYSTEM_FIELDS: &[FieldSpec] = &[
    field("max_tokens", "Max tokens", FieldKind::Integer, DefaultValue::Int(8192)),
    field("concurrent_requests", "Concurrent requests", FieldKind::Integer, DefaultValue::Int(2)),
    field("retries", "Retries", FieldKind::Integer, DefaultValue::Int(3)),
    field("timeout_secs", "Timeout (s)", FieldKind::Integer, DefaultValue::Int(60)),
];

pub const UI_FIELDS: &[FieldSpec] = &[
    field("theme", "Theme", FieldKind::Choice(THEMES), DefaultValue::Str("dark")),
    field("show_timestamps", "Show timestamps", FieldKind::Checkbox, DefaultValue::Bool(true)),
    field("chart_window", "Chart window", FieldKind::Integer, DefaultValue::Int(20)),
];

pub const SERVER_FIELDS: &[FieldSpec] = &[
    field("port", "Port", FieldKind::Integer, DefaultValue::Int(5000)),
    field("debug", "Debug", FieldKind::Checkbox, DefaultValue::Bool(false)),
];

/// Fixed top-level sections, in display order after the model groups.
const SECTIONS: &[(&str, &str, &[FieldSpec])] = &[
    ("system", "System limits", SYSTEM_FIELDS),
    ("ui", "UI options", UI_FIELDS),
    ("server", "Server", SERVER_FIELDS),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not a valid {expected} for '{field}'")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormControl {
    pub path: Vec<String>,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: FieldValue,
}

impl FormControl {
    fn new(path: Vec<String>, spec: &FieldSpec, value: FieldValue) -> Self {
        Self {
            path,
            label: spec.label,
            kind: spec.kind,
            value,
        }
    }

    /// Dotted control name, e.g. `system.max_tokens`.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    /// Coerce raw input by kind and store it. Invalid input leaves the
    /// current value in place.
    pub fn set(&mut self, raw: &str) -> Result<(), FormError> {
        let name = self.name();
        let invalid = |expected| FormError::InvalidValue {
            field: name.clone(),
            value: raw.to_string(),
            expected,
        };
        let raw_trimmed = raw.trim();

        self.value = match self.kind {
            FieldKind::Checkbox => match raw_trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => FieldValue::Bool(true),
                "0" | "false" | "no" | "off" | "" => FieldValue::Bool(false),
                _ => return Err(invalid("boolean")),
            },
            FieldKind::Integer => match raw_trimmed.parse::<i64>() {
                Ok(n) => FieldValue::Integer(n),
                Err(_) => raw_trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(whole_number)
                    .map(FieldValue::Integer)
                    .ok_or_else(|| invalid("integer"))?,
            },
            FieldKind::Float => {
                let number: f64 = raw_trimmed.parse().map_err(|_| invalid("number"))?;
                if !number.is_finite() {
                    return Err(invalid("number"));
                }
                FieldValue::Float(number)
            }
            FieldKind::Text | FieldKind::Secret => FieldValue::Text(raw.to_string()),
            FieldKind::Choice(options) => {
                if !options.contains(&raw_trimmed) {
                    return Err(invalid("choice"));
                }
                FieldValue::Text(raw_trimmed.to_string())
            }
        };
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSection {
    pub title: String,
    pub controls: Vec<FormControl>,
}

/// The rendered configuration editor form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigForm {
    pub sections: Vec<FormSection>,
}

impl ConfigForm {
    /// Build the form for `doc`. Unknown keys are ignored; missing or
    /// mistyped keys take the field's default.
    pub fn render(doc: &ConfigDocument) -> Self {
        let mut sections = Vec::new();

        if let Some(models) = doc.get("models").and_then(Value::as_object) {
            let mut names: Vec<&String> = models.keys().collect();
            names.sort();
            for name in names {
                let model = models.get(name.as_str()).and_then(Value::as_object);
                sections.push(model_section(name, model));
            }
        }

        for (id, title, fields) in SECTIONS {
            let values = doc.get(*id).and_then(Value::as_object);
            let controls = fields
                .iter()
                .map(|spec| {
                    let value = values
                        .and_then(|obj| obj.get(spec.key))
                        .and_then(|v| FieldValue::from_json(spec.kind, v))
                        .unwrap_or_else(|| spec.default.value());
                    FormControl::new(vec![id.to_string(), spec.key.to_string()], spec, value)
                })
                .collect();
            sections.push(FormSection {
                title: title.to_string(),
                controls,
            });
        }

        Self { sections }
    }

    pub fn controls(&self) -> impl Iterator<Item = &FormControl> {
        self.sections.iter().flat_map(|s| s.controls.iter())
    }

    pub fn control(&self, name: &str) -> Option<&FormControl> {
        self.controls().find(|c| c.name() == name)
    }

    /// Value of the control called `name`.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.control(name).map(|c| &c.value)
    }

    /// Set the control called `name`. A `models.<name>.<field>` path for a
    /// model not in the form adds that model's group first.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        if let Some(control) = self.control_mut(name) {
            return control.set(raw);
        }

        let unknown = || FormError::UnknownField(name.to_string());
        let (model, field) = name
            .strip_prefix("models.")
            .and_then(|rest| rest.rsplit_once('.'))
            .ok_or_else(unknown)?;
        if model.is_empty() || !MODEL_FIELDS.iter().any(|spec| spec.key == field) {
            return Err(unknown());
        }

        self.add_model(model);
        let result = self.control_mut(name).ok_or_else(unknown)?.set(raw);
        if result.is_err() {
            let title = model_title(model);
            self.sections.retain(|s| s.title != title);
        }
        result
    }

    fn control_mut(&mut self, name: &str) -> Option<&mut FormControl> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.controls.iter_mut())
            .find(|c| c.name() == name)
    }

    /// Add an empty model group with default fields. Existing groups are
    /// left alone.
    pub fn add_model(&mut self, name: &str) {
        let title = model_title(name);
        if self.sections.iter().any(|s| s.title == title) {
            return;
        }
        let insert_at = self
            .sections
            .iter()
            .position(|s| !s.title.starts_with("Model: "))
            .unwrap_or(self.sections.len());
        self.sections.insert(insert_at, model_section(name, None));
    }

    /// Build a fresh nested document from every control.
    pub fn to_document(&self) -> ConfigDocument {
        let mut doc = Map::new();
        for control in self.controls() {
            insert_at(&mut doc, &control.path, control.value.to_json());
        }
        doc
    }

    pub fn render_html(&self) -> String {
        let mut html = String::from(r#"<form id="config-form">"#);
        for section in &self.sections {
            html.push_str(&format!(
                "<fieldset><legend>{}</legend>",
                escape_html(&section.title)
            ));
            for control in &section.controls {
                html.push_str(&control_html(control));
            }
            html.push_str("</fieldset>");
        }
        html.push_str(r#"<button type="submit" class="btn save-config">Save</button></form>"#);
        html
    }
}

fn model_title(name: &str) -> String {
    format!("Model: {name}")
}

fn model_section(name: &str, values: Option<&Map<String, Value>>) -> FormSection {
    let controls = MODEL_FIELDS
        .iter()
        .map(|spec| {
            let value = values
                .and_then(|obj| obj.get(spec.key))
                .and_then(|v| FieldValue::from_json(spec.kind, v))
                .unwrap_or_else(|| spec.default.value());
            FormControl::new(
                vec!["models".to_string(), name.to_string(), spec.key.to_string()],
                spec,
                value,
            )
        })
        .collect();
    FormSection {
        title: model_title(name),
        controls,
    }
}

/// `f` as an `i64` when it is a whole number inside the `i64` range.
fn whole_number(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

/// Paths come from the schema, so intermediate entries are always maps.
fn insert_at(doc: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut current = doc;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        current = map;
    }
    current.insert(leaf.clone(), value);
}

fn control_html(control: &FormControl) -> String {
    let name = escape_html(&control.name());
    let label = escape_html(control.label);
    let input = match (&control.kind, &control.value) {
        (FieldKind::Checkbox, value) => format!(
            r#"<input type="checkbox" name="{name}"{}>"#,
            if *value == FieldValue::Bool(true) { " checked" } else { "" }
        ),
        (FieldKind::Integer, value) => {
            format!(r#"<input type="number" step="1" name="{name}" value="{value}">"#)
        }
        (FieldKind::Float, value) => {
            format!(r#"<input type="number" step="any" name="{name}" value="{value}">"#)
        }
        (FieldKind::Secret, value) => format!(
            r#"<input type="password" name="{name}" value="{}">"#,
            escape_html(&value.to_string())
        ),
        (FieldKind::Text, value) => format!(
            r#"<input type="text" name="{name}" value="{}">"#,
            escape_html(&value.to_string())
        ),
        (FieldKind::Choice(options), value) => {
            let current = value.to_string();
            let opts: String = options
                .iter()
                .map(|o| {
                    let selected = if *o == current { " selected" } else { "" };
                    format!(r#"<option value="{o}"{selected}>{o}</option>"#)
                })
                .collect();
            format!(r#"<select name="{name}">{opts}</select>"#)
        }
    };
    format!(r#"<label class="form-field"><span>{label}</span>{input}</label>"#)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> ConfigDocument {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_system_section_uses_defaults() {
        let form = ConfigForm::render(&doc(json!({ "ui": { "theme": "light" } })));
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(8192)));
        assert_eq!(
            form.value("system.concurrent_requests"),
            Some(&FieldValue::Integer(2))
        );
        assert_eq!(form.value("ui.theme"), Some(&FieldValue::Text("light".to_string())));
    }

    #[test]
    fn unknown_and_mistyped_keys_are_ignored() {
        let form = ConfigForm::render(&doc(json!({
            "system": { "max_tokens": "lots", "mystery": 1 },
            "plugins": { "x": true },
            "ui": { "theme": "sepia" },
        })));
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(8192)));
        assert!(form.control("system.mystery").is_none());
        assert!(form.control("plugins.x").is_none());
        assert_eq!(form.value("ui.theme"), Some(&FieldValue::Text("dark".to_string())));
    }

    #[test]
    fn models_render_one_sorted_group_each() {
        let form = ConfigForm::render(&doc(json!({
            "models": {
                "zeta": { "temperature": 0.1 },
                "alpha": { "endpoint": "http://a", "max_tokens": 100.0 },
            }
        })));
        assert_eq!(form.sections[0].title, "Model: alpha");
        assert_eq!(form.sections[1].title, "Model: zeta");
        assert_eq!(form.value("models.alpha.max_tokens"), Some(&FieldValue::Integer(100)));
        assert_eq!(form.value("models.zeta.temperature"), Some(&FieldValue::Float(0.1)));
        assert_eq!(form.value("models.zeta.enabled"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn set_coerces_by_kind() {
        let mut form = ConfigForm::render(&Map::new());
        form.set("server.debug", "on").unwrap();
        form.set("system.retries", "5").unwrap();
        form.set("ui.theme", "light").unwrap();

        assert_eq!(form.value("server.debug"), Some(&FieldValue::Bool(true)));
        assert_eq!(form.value("system.retries"), Some(&FieldValue::Integer(5)));
        assert_eq!(form.value("ui.theme"), Some(&FieldValue::Text("light".to_string())));
    }

    #[test]
    fn invalid_input_leaves_control_unchanged() {
        let mut form = ConfigForm::render(&Map::new());
        assert!(matches!(
            form.set("system.retries", "2.5"),
            Err(FormError::InvalidValue { .. })
        ));
        assert!(form.set("server.debug", "maybe").is_err());
        assert!(form.set("ui.theme", "sepia").is_err());
        assert_eq!(
            form.set("nope.nothing", "1"),
            Err(FormError::UnknownField("nope.nothing".to_string()))
        );
        assert_eq!(form.value("system.retries"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn to_document_builds_nested_typed_values() {
        let mut form = ConfigForm::render(&doc(json!({ "models": { "gpt-4o": {} } })));
        form.set("models.gpt-4o.temperature", "0.25").unwrap();
        form.set("models.gpt-4o.api_key", "sk-123").unwrap();

        let out = Value::Object(form.to_document());
        assert_eq!(out["system"]["max_tokens"], json!(8192));
        assert_eq!(out["server"]["port"], json!(5000));
        assert_eq!(out["server"]["debug"], json!(false));
        assert_eq!(out["models"]["gpt-4o"]["temperature"], json!(0.25));
        assert_eq!(out["models"]["gpt-4o"]["api_key"], json!("sk-123"));
        assert!(out["models"]["gpt-4o"]["max_tokens"].is_i64());
    }

    #[test]
    fn add_model_inserts_before_fixed_sections() {
        let mut form = ConfigForm::render(&Map::new());
        form.add_model("local");
        form.add_model("local");
        assert_eq!(form.sections[0].title, "Model: local");
        assert_eq!(form.sections.len(), 4);
        assert_eq!(
            form.value("models.local.endpoint"),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn html_uses_input_types_per_kind() {
        let html = ConfigForm::render(&doc(json!({ "models": { "m": {} } }))).render_html();
        assert!(html.contains(r#"<input type="password" name="models.m.api_key" value="">"#));
        assert!(html.contains(r#"<input type="checkbox" name="ui.show_timestamps" checked>"#));
        assert!(html.contains(r#"<option value="dark" selected>dark</option>"#));
        assert!(html.contains(r#"name="system.max_tokens" value="8192""#));
    }

    #[test]
    fn defaults_agree_with_backend_schema() {
        let defaults = crate::config::DashConfig::default();
        let form = ConfigForm::render(&Map::new());
        let doc = Value::Object(form.to_document());
        let backend = serde_json::to_value(&defaults).unwrap();
        for section in ["system", "ui", "server"] {
            for (key, value) in doc[section].as_object().unwrap() {
                assert_eq!(&backend[section][key], value, "{section}.{key}");
            }
        }

        let model_defaults = serde_json::to_value(crate::config::schema::ModelConfig::default()).unwrap();
        let mut form = ConfigForm::render(&Map::new());
        form.add_model("m");
        let doc = Value::Object(form.to_document());
        assert_eq!(doc["models"]["m"], model_defaults);
    }

    #[test]
    fn integers_outside_i64_range_are_rejected() {
        let mut form = ConfigForm::render(&Map::new());
        assert!(matches!(
            form.set("system.max_tokens", "1e30"),
            Err(FormError::InvalidValue { expected: "integer", .. })
        ));
        assert!(form.set("system.max_tokens", "-1e19").is_err());
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(8192)));

        form.set("system.max_tokens", "9223372036854775807").unwrap();
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(i64::MAX)));
        form.set("system.max_tokens", "2e3").unwrap();
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(2000)));

        // Out-of-range document values fall back to the default.
        let form = ConfigForm::render(&doc(json!({ "system": { "max_tokens": 1e30 } })));
        assert_eq!(form.value("system.max_tokens"), Some(&FieldValue::Integer(8192)));
    }

    #[test]
    fn setting_a_new_model_field_adds_the_group() {
        let mut form = ConfigForm::render(&Map::new());
        form.set("models.local.endpoint", "http://localhost:11434").unwrap();
        assert_eq!(
            form.value("models.local.endpoint"),
            Some(&FieldValue::Text("http://localhost:11434".into()))
        );
        assert_eq!(form.value("models.local.max_tokens"), Some(&FieldValue::Integer(4096)));

        // A rejected value does not leave an empty group behind.
        assert!(form.set("models.other.max_tokens", "lots").is_err());
        assert!(form.control("models.other.endpoint").is_none());

        assert_eq!(
            form.set("models.local.colour", "red"),
            Err(FormError::UnknownField("models.local.colour".into()))
        );
        assert!(form.set("models..endpoint", "x").is_err());
    }
}
