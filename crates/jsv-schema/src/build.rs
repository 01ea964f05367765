//! Schema node construction.
//!
//! [`SchemaSet::build`] reserves a node for a location, indexes it, and only
//! then parses the keywords, building sub-schemas and reference targets
//! recursively. A reference back to a location under construction finds the
//! reserved id.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Number, Value};

use crate::dialect::Dialect;
use crate::error::SchemaError;
use crate::registry::SchemaSet;
use crate::schema::{
    kind_name, Applicators, ArrayKeywords, Exclusive, GenericKeywords, Items, Keywords, Metadata,
    NumericKeywords, ObjectKeywords, References, Schema, SchemaBody, SchemaId, SchemaUri,
    StringKeywords, TypeSet,
};

impl SchemaSet {
    /// Build the node at `uri`, or return the existing one.
    pub(crate) fn build(&mut self, uri: SchemaUri) -> Result<SchemaId, SchemaError> {
        if let Some(id) = self.lookup(&uri) {
            return Ok(id);
        }
        let id = SchemaId(self.nodes.len());
        self.nodes.push(Schema::placeholder(id, uri.clone()));
        self.index.insert(uri.clone(), id);

        let document = self.document(uri.document());
        let value = document
            .as_deref()
            .and_then(|document| uri.pointer().resolve(&document.value));

        let (body, declared) = match value {
            None => {
                tracing::warn!(%uri, "no schema at location, accepting every instance");
                (SchemaBody::Bool(true), None)
            }
            Some(Value::Bool(b)) => (SchemaBody::Bool(*b), None),
            Some(Value::Object(map)) => {
                let parser = KeywordParser {
                    set: self,
                    id,
                    uri: &uri,
                    map,
                };
                let keywords = parser.parse()?;
                (
                    SchemaBody::Keywords(Box::new(keywords)),
                    declared_dialect(map),
                )
            }
            Some(other) => {
                return Err(SchemaError::NotASchema {
                    uri: uri.to_string(),
                    found: kind_name(other),
                })
            }
        };

        tracing::debug!(%uri, %id, "built schema node");
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.body = body;
            node.declared_dialect = declared;
        }
        Ok(id)
    }
}

fn declared_dialect(map: &Map<String, Value>) -> Option<Dialect> {
    let uri = map.get("$schema")?.as_str()?;
    let dialect = Dialect::from_uri(uri);
    if dialect.is_none() {
        tracing::warn!(schema = uri, "unrecognized $schema on sub-schema");
    }
    dialect
}

/// Reads the keywords of one object schema.
struct KeywordParser<'p> {
    set: &'p mut SchemaSet,
    id: SchemaId,
    uri: &'p SchemaUri,
    map: &'p Map<String, Value>,
}

impl KeywordParser<'_> {
    fn parse(mut self) -> Result<Keywords, SchemaError> {
        Ok(Keywords {
            numeric: self.numeric(),
            string: self.string(),
            array: self.array()?,
            object: self.object()?,
            generic: self.generic()?,
            applicators: self.applicators()?,
            references: self.references()?,
            metadata: self.metadata(),
        })
    }

    fn numeric(&self) -> NumericKeywords {
        NumericKeywords {
            multiple_of: self.number("multipleOf"),
            maximum: self.number("maximum"),
            exclusive_maximum: self.exclusive("exclusiveMaximum"),
            minimum: self.number("minimum"),
            exclusive_minimum: self.exclusive("exclusiveMinimum"),
            divisible_by: self.number("divisibleBy"),
        }
    }

    fn string(&self) -> StringKeywords {
        StringKeywords {
            max_length: self.count("maxLength"),
            min_length: self.count("minLength"),
            pattern: self.text("pattern"),
            format: self.text("format"),
            content_encoding: self.text("contentEncoding"),
            content_media_type: self.text("contentMediaType"),
        }
    }

    fn array(&mut self) -> Result<ArrayKeywords, SchemaError> {
        let items = match self.map.get("items") {
            Some(Value::Array(_)) => self.child_list("items")?.map(Items::Tuple),
            Some(_) => Some(Items::Single(self.child(&["items"])?)),
            None => None,
        };
        Ok(ArrayKeywords {
            prefix_items: self.child_list("prefixItems")?,
            items,
            additional_items: self.optional_child("additionalItems")?,
            unevaluated_items: self.optional_child("unevaluatedItems")?,
            max_items: self.count("maxItems"),
            min_items: self.count("minItems"),
            unique_items: self.flag("uniqueItems"),
            contains: self.optional_child("contains")?,
            min_contains: self.count("minContains"),
            max_contains: self.count("maxContains"),
        })
    }

    fn object(&mut self) -> Result<ObjectKeywords, SchemaError> {
        let map = self.map;
        let (required, required_flag) = match map.get("required") {
            Some(Value::Array(names)) => (strings(names), false),
            Some(Value::Bool(flag)) => (Vec::new(), *flag),
            _ => (Vec::new(), false),
        };

        let mut dependent_required = BTreeMap::new();
        let mut dependent_schemas = BTreeMap::new();
        if let Some(Value::Object(dependencies)) = map.get("dependencies") {
            for (property, dependency) in dependencies {
                match dependency {
                    Value::Array(names) => {
                        dependent_required.insert(property.clone(), strings(names));
                    }
                    Value::String(name) => {
                        dependent_required.insert(property.clone(), vec![name.clone()]);
                    }
                    Value::Object(_) | Value::Bool(_) => {
                        let id = self.child(&["dependencies", property.as_str()])?;
                        dependent_schemas.insert(property.clone(), id);
                    }
                    _ => {}
                }
            }
        }
        if let Some(Value::Object(dependencies)) = map.get("dependentRequired") {
            for (property, names) in dependencies {
                if let Value::Array(names) = names {
                    dependent_required.insert(property.clone(), strings(names));
                }
            }
        }
        for (property, id) in self.child_map::<Vec<_>>("dependentSchemas")? {
            dependent_schemas.insert(property, id);
        }

        Ok(ObjectKeywords {
            max_properties: self.count("maxProperties"),
            min_properties: self.count("minProperties"),
            required,
            required_flag,
            properties: self.child_map("properties")?,
            pattern_properties: self.child_map("patternProperties")?,
            additional_properties: self.optional_child("additionalProperties")?,
            unevaluated_properties: self.optional_child("unevaluatedProperties")?,
            property_names: self.optional_child("propertyNames")?,
            dependent_required,
            dependent_schemas,
        })
    }

    fn generic(&mut self) -> Result<GenericKeywords, SchemaError> {
        let map = self.map;
        let types = match map.get("type") {
            Some(Value::String(name)) => Some(TypeSet {
                names: BTreeSet::from([name.clone()]),
                schemas: Vec::new(),
            }),
            Some(Value::Array(entries)) => {
                let mut set = TypeSet::default();
                for (index, entry) in entries.iter().enumerate() {
                    match entry {
                        Value::String(name) => {
                            set.names.insert(name.clone());
                        }
                        Value::Object(_) | Value::Bool(_) => {
                            set.schemas.push(self.child(&["type", index.to_string().as_str()])?);
                        }
                        _ => {}
                    }
                }
                Some(set)
            }
            _ => None,
        };

        let mut disallow = BTreeSet::new();
        let mut disallow_schemas = Vec::new();
        match map.get("disallow") {
            Some(Value::String(name)) => {
                disallow.insert(name.clone());
            }
            Some(Value::Array(entries)) => {
                for (index, entry) in entries.iter().enumerate() {
                    match entry {
                        Value::String(name) => {
                            disallow.insert(name.clone());
                        }
                        _ => disallow_schemas
                            .push(self.child(&["disallow", index.to_string().as_str()])?),
                    }
                }
            }
            _ => {}
        }

        Ok(GenericKeywords {
            constant: map.get("const").cloned(),
            enumeration: match map.get("enum") {
                Some(Value::Array(values)) => Some(values.clone()),
                _ => None,
            },
            types,
            disallow,
            disallow_schemas,
        })
    }

    fn applicators(&mut self) -> Result<Applicators, SchemaError> {
        let mut all_of = self.child_list("allOf")?.unwrap_or_default();
        match self.map.get("extends") {
            Some(Value::Array(_)) => {
                all_of.extend(self.child_list("extends")?.unwrap_or_default());
            }
            Some(Value::Object(_) | Value::Bool(_)) => all_of.push(self.child(&["extends"])?),
            _ => {}
        }
        Ok(Applicators {
            condition: self.optional_child("if")?,
            then_branch: self.optional_child("then")?,
            else_branch: self.optional_child("else")?,
            all_of,
            any_of: self.child_list("anyOf")?,
            one_of: self.child_list("oneOf")?,
            not: self.optional_child("not")?,
        })
    }

    fn references(&mut self) -> Result<References, SchemaError> {
        Ok(References {
            reference: self.reference("$ref")?,
            recursive_reference: self.reference("$recursiveRef")?,
            recursive_anchor: self.flag("$recursiveAnchor"),
        })
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            title: self.text("title"),
            description: self.text("description"),
            default: self.map.get("default").cloned(),
            examples: match self.map.get("examples") {
                Some(Value::Array(values)) => Some(values.clone()),
                _ => None,
            },
        }
    }

    /// Build a sub-schema of this node and record this node as its parent.
    fn child(&mut self, path: &[&str]) -> Result<SchemaId, SchemaError> {
        let child = self.set.build(self.uri.join(path.iter().copied()))?;
        self.set.assign_parent(child, self.id)?;
        Ok(child)
    }

    fn optional_child(&mut self, keyword: &str) -> Result<Option<SchemaId>, SchemaError> {
        if self.map.contains_key(keyword) {
            self.child(&[keyword]).map(Some)
        } else {
            Ok(None)
        }
    }

    fn child_list(&mut self, keyword: &str) -> Result<Option<Vec<SchemaId>>, SchemaError> {
        let Some(Value::Array(entries)) = self.map.get(keyword) else {
            return Ok(None);
        };
        (0..entries.len())
            .map(|index| self.child(&[keyword, index.to_string().as_str()]))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn child_map<C>(&mut self, keyword: &str) -> Result<C, SchemaError>
    where
        C: FromIterator<(String, SchemaId)>,
    {
        let map = self.map;
        let Some(Value::Object(entries)) = map.get(keyword) else {
            return Ok(C::from_iter(std::iter::empty()));
        };
        entries
            .keys()
            .map(|name| Ok((name.clone(), self.child(&[keyword, name.as_str()])?)))
            .collect()
    }

    /// Resolve a `$ref`-style keyword against the base URI of this node.
    fn reference(&mut self, keyword: &'static str) -> Result<Option<SchemaId>, SchemaError> {
        let Some(Value::String(reference)) = self.map.get(keyword) else {
            return Ok(None);
        };
        let base = self.set.base_uri(self.uri);
        let target = base
            .join(reference)
            .map_err(|e| SchemaError::InvalidReference {
                uri: self.uri.to_string(),
                keyword,
                reference: reference.clone(),
                reason: e.to_string(),
            })?;
        let location = self.set.locate(&target);
        self.set.build(location).map(Some)
    }

    fn number(&self, keyword: &str) -> Option<Number> {
        match self.map.get(keyword) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        }
    }

    fn exclusive(&self, keyword: &str) -> Option<Exclusive> {
        match self.map.get(keyword) {
            Some(Value::Bool(flag)) => Some(Exclusive::Flag(*flag)),
            Some(Value::Number(n)) => Some(Exclusive::Limit(n.clone())),
            _ => None,
        }
    }

    /// A non-negative integer; `2.0` counts, `-1` and `2.5` do not.
    fn count(&self, keyword: &str) -> Option<u64> {
        let Some(Value::Number(n)) = self.map.get(keyword) else {
            return None;
        };
        n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
    }

    fn text(&self, keyword: &str) -> Option<String> {
        self.map.get(keyword).and_then(Value::as_str).map(str::to_string)
    }

    fn flag(&self, keyword: &str) -> bool {
        matches!(self.map.get(keyword), Some(Value::Bool(true)))
    }
}

fn strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
