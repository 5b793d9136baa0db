//! JSON encoding of object IR in the gluonts serde layout
//!
//! ```json
//! {"__kind__": "instance", "class": "mymodule.Trainer", "args": ["abcd"], "kwargs": {"epochs": 100}}
//! ```

use super::builder::ObjectForest;
use super::error::{IrError, IrResult};
use super::node::{ArgSlot, IrValue, ObjectNode};
use crate::values::Value;
use serde_json::{json, Map, Value as Json};

const KIND_FIELD: &str = "__kind__";
const INSTANCE_KIND: &str = "instance";

/// Encode one node; positional arguments must be dense
pub fn encode_node(node: &ObjectNode) -> IrResult<Json> {
    let positional = node.densify().map_err(|gap| IrError::PositionalGap {
        path: node.path.clone(),
        missing: gap.missing,
    })?;

    let args = positional
        .into_iter()
        .map(encode_value)
        .collect::<IrResult<Vec<_>>>()?;

    let mut kwargs = Map::new();
    for (name, value) in &node.named_args {
        kwargs.insert(name.clone(), encode_value(value)?);
    }

    Ok(json!({
        "__kind__": INSTANCE_KIND,
        "class": node.class_ref,
        "args": args,
        "kwargs": kwargs,
    }))
}

fn encode_value(value: &IrValue) -> IrResult<Json> {
    match value {
        IrValue::Value(v) => Ok(v.to_json()),
        IrValue::Node(node) => encode_node(node),
    }
}

/// Encode every root, keyed by root name
pub fn encode_forest(forest: &ObjectForest) -> IrResult<Json> {
    let mut roots = Map::new();
    for node in forest.iter() {
        roots.insert(node.path.clone(), encode_node(node)?);
    }
    Ok(Json::Object(roots))
}

pub fn is_encoded_instance(json: &Json) -> bool {
    json.get(KIND_FIELD).and_then(Json::as_str) == Some(INSTANCE_KIND)
}

/// Decode a node; nested paths are derived from `path` and the slot names
pub fn decode_node(json: &Json, path: &str) -> IrResult<ObjectNode> {
    let object = json
        .as_object()
        .ok_or_else(|| IrError::malformed(path, "expected a JSON object"))?;

    if !is_encoded_instance(json) {
        return Err(IrError::malformed(path, "__kind__ must be \"instance\""));
    }

    let class_ref = object
        .get("class")
        .and_then(Json::as_str)
        .ok_or_else(|| IrError::malformed(path, "missing string field 'class'"))?;

    let mut node = ObjectNode::new(path, class_ref);

    if let Some(args) = object.get("args") {
        let args = args
            .as_array()
            .ok_or_else(|| IrError::malformed(path, "'args' must be an array"))?;
        for (index, arg) in args.iter().enumerate() {
            let value = decode_value(arg, &format!("{}.{}", path, index))?;
            node.set_arg(ArgSlot::Positional(index), value)?;
        }
    }

    if let Some(kwargs) = object.get("kwargs") {
        let kwargs = kwargs
            .as_object()
            .ok_or_else(|| IrError::malformed(path, "'kwargs' must be an object"))?;
        for (name, arg) in kwargs {
            let value = decode_value(arg, &format!("{}.{}", path, name))?;
            node.set_arg(ArgSlot::Named(name.clone()), value)?;
        }
    }

    Ok(node)
}

fn decode_value(json: &Json, path: &str) -> IrResult<IrValue> {
    if is_encoded_instance(json) {
        Ok(IrValue::Node(Box::new(decode_node(json, path)?)))
    } else {
        Ok(IrValue::Value(Value::from_json(json.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::ObjectIrBuilder;
    use crate::lexical::FlatArgs;
    use assert_matches::assert_matches;

    fn forest(pairs: &[(&str, Value)]) -> ObjectForest {
        let args: FlatArgs = pairs.iter().cloned().collect();
        ObjectIrBuilder::new().build(&args).unwrap()
    }

    #[test]
    fn test_encode_trainer() {
        let forest = forest(&[
            ("trainer.__class__", Value::from("mymodule.Trainer")),
            ("trainer.epochs", Value::Int(100)),
            ("trainer.0", Value::from("abcd")),
        ]);

        let encoded = encode_node(forest.get("trainer").unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "__kind__": "instance",
                "class": "mymodule.Trainer",
                "args": ["abcd"],
                "kwargs": {"epochs": 100},
            })
        );
    }

    #[test]
    fn test_nested_encoding_decodes_to_same_tree() {
        let forest = forest(&[
            ("a.__class__", Value::from("X")),
            ("a.cb.__class__", Value::from("Y")),
            ("a.cb.name", Value::from("n")),
            ("a.0", Value::Json(json!([1, 2]))),
        ]);
        let original = forest.get("a").unwrap();

        let encoded = encode_node(original).unwrap();
        assert_eq!(encoded["kwargs"]["cb"]["class"], "Y");

        let decoded = decode_node(&encoded, "a").unwrap();
        assert_eq!(&decoded, original);
    }

    #[test]
    fn test_encode_rejects_gaps() {
        let forest = forest(&[("t.__class__", Value::from("T")), ("t.1", Value::Int(1))]);
        assert_matches!(
            encode_node(forest.get("t").unwrap()),
            Err(IrError::PositionalGap { missing: 0, .. })
        );
    }

    #[test]
    fn test_encode_forest_keys_by_root() {
        let forest = forest(&[
            ("b.__class__", Value::from("B")),
            ("a.__class__", Value::from("A")),
        ]);
        let encoded = encode_forest(&forest).unwrap();
        let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_decode_rejects_malformed_documents() {
        assert_matches!(
            decode_node(&json!([1]), "x"),
            Err(IrError::MalformedEncoding { .. })
        );
        assert_matches!(
            decode_node(&json!({"__kind__": "type", "class": "X"}), "x"),
            Err(IrError::MalformedEncoding { .. })
        );
        assert_matches!(
            decode_node(&json!({"__kind__": "instance"}), "x"),
            Err(IrError::MalformedEncoding { .. })
        );
        assert_matches!(
            decode_node(&json!({"__kind__": "instance", "class": "X", "args": {}}), "x"),
            Err(IrError::MalformedEncoding { .. })
        );
    }

    #[test]
    fn test_decode_defaults_missing_argument_lists() {
        let node = decode_node(&json!({"__kind__": "instance", "class": "X"}), "x").unwrap();
        assert!(node.positional_args.is_empty());
        assert!(node.named_args.is_empty());
    }
}
