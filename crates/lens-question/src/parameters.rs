use crate::card::{Card, CardParameter};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Runtime values bound to parameters, keyed by parameter id
pub type ParameterValues = BTreeMap<String, Value>;

/// A card parameter template merged with its runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub parameter_type: Option<String>,
    pub target: Option<Value>,
    pub value: Option<Value>,
}

impl Parameter {
    fn from_template(template: &CardParameter, values: &ParameterValues) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            slug: template.slug.clone(),
            parameter_type: template.parameter_type.clone(),
            target: template.target.clone(),
            value: values
                .get(&template.id)
                .or(template.default.as_ref())
                .cloned(),
        }
    }

    /// Form sent along with an ad-hoc dataset query. Parameters without a
    /// value or target are not sent.
    pub fn to_dataset_parameter(&self) -> Option<Value> {
        let value = self.value.as_ref()?;
        let target = self.target.as_ref()?;
        Some(json!({
            "type": self.parameter_type,
            "target": target,
            "value": value,
        }))
    }
}

/// Parameters of a card with runtime values applied.
///
/// Cards that declare no parameters expose their native template tags as
/// parameters instead.
pub fn card_parameters(card: &Card, values: &ParameterValues) -> Vec<Parameter> {
    match &card.parameters {
        Some(templates) => templates
            .iter()
            .map(|template| Parameter::from_template(template, values))
            .collect(),
        None => template_tag_parameters(card)
            .iter()
            .map(|template| Parameter::from_template(template, values))
            .collect(),
    }
}

fn template_tag_parameters(card: &Card) -> Vec<CardParameter> {
    let tags = card
        .dataset_query
        .as_ref()
        .and_then(|dq| dq.native.as_ref())
        .and_then(|native| native.template_tags.as_ref());

    let Some(tags) = tags else {
        return Vec::new();
    };

    tags.iter()
        // Dimension tags are wired up by filters, not bound as plain values
        .filter(|(_, tag)| tag.get("type").and_then(Value::as_str) != Some("dimension"))
        .map(|(name, tag)| CardParameter {
            id: tag
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or(name.as_str())
                .to_string(),
            name: tag
                .get("display_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            slug: Some(name.clone()),
            parameter_type: tag
                .get("type")
                .and_then(Value::as_str)
                .map(|t| format!("{}/=", t)),
            target: Some(json!(["variable", ["template-tag", name]])),
            default: tag.get("default").filter(|v| !v.is_null()).cloned(),
        })
        .collect()
}
