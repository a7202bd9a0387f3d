//! Form data: the field -> value mapping behind one generation request

use crate::schema::{business_name_value, TemplateKind};
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Values entered for one template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormData {
    /// Template file name selecting the document family
    pub template_type: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl FormData {
    pub fn new(kind: TemplateKind) -> Self {
        Self {
            template_type: kind.file_name().to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_values(kind: TemplateKind, values: BTreeMap<String, String>) -> Self {
        Self {
            template_type: kind.file_name().to_string(),
            values,
        }
    }

    pub fn kind(&self) -> Result<TemplateKind, ValidationError> {
        TemplateKind::from_template_type(&self.template_type)
            .ok_or_else(|| ValidationError::UnknownTemplate(self.template_type.clone()))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Copy in values for fields not already set
    pub fn fill_missing(&mut self, defaults: &BTreeMap<String, String>) {
        for (field, value) in defaults {
            if field != "template_type" {
                self.values
                    .entry(field.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    /// Reduce a `"Label: Company Name"` business name to the company name
    pub fn normalize_business_name(&mut self) {
        if let Some(value) = self.values.get_mut("business_name") {
            let name = business_name_value(value).to_string();
            *value = name;
        }
    }

    /// Placeholder values, `template_type` included
    pub fn substitution_values(&self) -> BTreeMap<String, String> {
        let mut values = self.values.clone();
        values.insert("template_type".to_string(), self.template_type.clone());
        values
    }

    /// JSON object for the submission log: `template_type` first, then the
    /// fields in name order
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "template_type".to_string(),
            Value::String(self.template_type.clone()),
        );
        for (field, value) in &self.values {
            map.insert(field.clone(), Value::String(value.clone()));
        }
        map
    }
}
