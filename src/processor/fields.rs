//! Field rule evaluation

use serde_json::{Map, Value};

use crate::context::Context;
use crate::error::EvalError;
use crate::model::{FieldParseRule, Request};
use crate::resolver::ExpressionEvaluator;

/// Reserved output key carrying a region's data type
pub const DATA_TYPE_KEY: &str = "dataType";

/// Records extracted from a region's nodes.
///
/// A single node collapses to a flat record; several nodes are keyed by
/// their index (`"0"`, `"1"`, ...) when converted to JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutput {
    Record(Map<String, Value>),
    Indexed(Vec<Map<String, Value>>),
}

impl FieldOutput {
    /// Tag every record with the region's data type. The tag replaces a
    /// field of the same name.
    pub fn tag(&mut self, data_type: &str) {
        let tag = |record: &mut Map<String, Value>| {
            record.insert(DATA_TYPE_KEY.to_string(), Value::String(data_type.to_string()));
        };
        match self {
            FieldOutput::Record(record) => tag(record),
            FieldOutput::Indexed(records) => records.iter_mut().for_each(tag),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            FieldOutput::Record(record) => Value::Object(record),
            FieldOutput::Indexed(records) => Value::Object(
                records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| (i.to_string(), Value::Object(record)))
                    .collect(),
            ),
        }
    }
}

/// Apply `rules` to every node of `context`; `None` when there are no nodes
pub fn evaluate_fields(
    evaluator: &dyn ExpressionEvaluator,
    context: &Context,
    request: &Request,
    rules: &[FieldParseRule],
) -> Result<Option<FieldOutput>, EvalError> {
    let mut records = Vec::new();
    for node in context.nodes() {
        let mut record = Map::new();
        for rule in rules {
            let value = evaluator
                .resolve(request, &node, &rule.rule)?
                .map(|resolved| resolved.to_value())
                .unwrap_or(Value::Null);
            record.insert(rule.field_name.clone(), value);
        }
        records.push(record);
    }

    Ok(match records.len() {
        0 => None,
        1 => records.pop().map(FieldOutput::Record),
        _ => Some(FieldOutput::Indexed(records)),
    })
}
