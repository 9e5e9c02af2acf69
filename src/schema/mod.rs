pub mod block;
pub mod validate;
pub mod value;

use std::collections::BTreeMap;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, NestedBlock};
use tf_provider::schema::{Block, Description};

use crate::error::ProviderError;
use crate::secret;

pub use validate::Validator;
pub use value::{Attributes, Node, State, Value};

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Bool,
    Map,
    List,
    /// Computed list of objects with the given string, list and map members.
    ObjectList(Vec<(&'static str, FieldKind)>),
    /// Nested block holding at most one element.
    Block(Fields),
}

impl FieldKind {
    fn attr_type(&self) -> AttributeType {
        match self {
            // Blocks render as nested blocks, never through this.
            FieldKind::String | FieldKind::Block(_) => AttributeType::String,
            FieldKind::Bool => AttributeType::Bool,
            FieldKind::Map => AttributeType::Map(Box::new(AttributeType::String)),
            FieldKind::List => AttributeType::List(Box::new(AttributeType::String)),
            FieldKind::ObjectList(members) => AttributeType::List(Box::new(AttributeType::Object(
                members
                    .iter()
                    .map(|(name, kind)| (name.to_string(), kind.attr_type()))
                    .collect(),
            ))),
        }
    }
}

/// One attribute or block of a resource, with the checks Terraform leaves to
/// the provider: defaults, replacement, conflicts and value validation.
#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    pub memo: bool,
    pub default: Option<serde_json::Value>,
    pub env_default: Option<&'static str>,
    pub description: &'static str,
    pub conflicts_with: Vec<&'static str>,
    pub exactly_one_of: Vec<&'static str>,
    pub validators: Vec<Validator>,
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            memo: false,
            default: None,
            env_default: None,
            description: "",
            conflicts_with: Vec::new(),
            exactly_one_of: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String)
    }

    pub fn bool() -> Self {
        Self::of(FieldKind::Bool)
    }

    pub fn map() -> Self {
        Self::of(FieldKind::Map)
    }

    pub fn list() -> Self {
        Self::of(FieldKind::List)
    }

    pub fn objects(members: Vec<(&'static str, FieldKind)>) -> Self {
        Self::of(FieldKind::ObjectList(members))
    }

    pub fn block(fields: Fields) -> Self {
        Self::of(FieldKind::Block(fields))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn env_default(mut self, var: &'static str) -> Self {
        self.env_default = Some(var);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn conflicts_with(mut self, names: &[&'static str]) -> Self {
        self.conflicts_with = names.to_vec();
        self
    }

    pub fn exactly_one_of(mut self, names: &[&'static str]) -> Self {
        self.exactly_one_of = names.to_vec();
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Computed, never set from configuration.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.env_default.is_some()
    }

    fn memo() -> Self {
        let mut memo = Field::string()
            .computed()
            .sensitive()
            .description("A hash of the secret attribute it is paired with");
        memo.memo = true;
        memo
    }

    // Defaults are filled in by the plan hook, so Terraform must accept a
    // planned value the configuration left out.
    fn constraint(&self) -> AttributeConstraint {
        if self.is_computed_only() {
            AttributeConstraint::Computed
        } else if self.has_default() || self.computed {
            AttributeConstraint::OptionalComputed
        } else if self.required {
            AttributeConstraint::Required
        } else {
            AttributeConstraint::Optional
        }
    }

    fn to_attribute(&self) -> Attribute {
        Attribute {
            attr_type: self.kind.attr_type(),
            description: Description::plain(self.description),
            constraint: self.constraint(),
            sensitive: self.sensitive,
            ..Default::default()
        }
    }

    fn default_value(&self) -> Option<Value<Node>> {
        let from_env = self
            .env_default
            .and_then(|var| std::env::var(var).ok())
            .map(|v| match self.kind {
                FieldKind::Bool => Value::Value(Node::Bool(v.eq_ignore_ascii_case("true"))),
                _ => value::string(v),
            });
        from_env.or_else(|| self.default.clone().map(value::from_json))
    }
}

/// Attribute set of one resource, data source or nested block.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    fields: BTreeMap<String, Field>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field: Field) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    /// Add a sensitive attribute together with its `<name>_hash` memo.
    pub fn secret(mut self, name: &str, field: Field) -> Self {
        self.fields.insert(secret::memo_key(name), Field::memo());
        self.fields.insert(name.to_string(), field.sensitive());
        self
    }

    /// Add fields from `other`, which win on name clashes.
    pub fn merge(mut self, other: Fields) -> Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    /// Terraform schema block: plain fields become attributes, blocks become
    /// nested list blocks.
    pub fn to_block(&self, description: &'static str) -> Block {
        let attributes = self
            .fields
            .iter()
            .filter(|(_, f)| !matches!(f.kind, FieldKind::Block(_)))
            .map(|(name, f)| (name.clone(), f.to_attribute()))
            .collect();
        let blocks = self
            .fields
            .iter()
            .filter_map(|(name, f)| match &f.kind {
                FieldKind::Block(inner) => {
                    Some((name.clone(), NestedBlock::List(inner.to_block(f.description))))
                }
                _ => None,
            })
            .collect();

        Block {
            attributes,
            blocks,
            description: Description::plain(description),
            ..Default::default()
        }
    }

    /// Fill unset attributes from their environment variable, then their static default.
    pub fn apply_defaults(&self, attrs: &mut Attributes) {
        for (name, field) in &self.fields {
            if !value::is_set(attrs.get(name)) {
                if let Some(default) = field.default_value() {
                    attrs.insert(name.clone(), default);
                }
            }

            if let FieldKind::Block(inner) = &field.kind {
                for_each_block_mut(attrs.get_mut(name), |block| inner.apply_defaults(block));
            }
        }
    }

    /// Give every declared attribute a value: null for plain attributes, an
    /// empty list for absent blocks.
    pub fn complete(&self, attrs: &mut Attributes) {
        for (name, field) in &self.fields {
            let entry = attrs.entry(name.clone()).or_insert(Value::Null);
            if let FieldKind::Block(inner) = &field.kind {
                if matches!(entry, Value::Null) {
                    *entry = Value::Value(Node::List(Vec::new()));
                }
                for_each_block_mut(Some(entry), |block| inner.complete(block));
            }
        }
    }

    /// Turn empty strings the API reports back into null wherever `reference`
    /// left the attribute unset.
    pub fn reconcile(&self, reference: &Attributes, attrs: &mut Attributes) {
        for (name, field) in &self.fields {
            if field.is_computed_only() {
                continue;
            }
            match &field.kind {
                FieldKind::Block(inner) => {
                    if let (Some(reference), Some(block)) = (
                        value::first_block(reference.get(name)),
                        value::first_block_mut(attrs.get_mut(name)),
                    ) {
                        inner.reconcile(reference, block);
                    }
                }
                _ => {
                    let unset = matches!(reference.get(name), None | Some(Value::Null));
                    if unset && value::as_str(attrs.get(name)) == Some("") {
                        attrs.insert(name.clone(), Value::Null);
                    }
                }
            }
        }
    }

    /// Check configuration, reporting every problem at once. Unknown values
    /// count as set and are not checked further.
    pub fn validate(&self, attrs: &Attributes) -> Result<(), ProviderError> {
        let mut errors = Vec::new();
        self.validate_into(attrs, "", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(errors.join("; ")))
        }
    }

    fn validate_into(&self, attrs: &Attributes, prefix: &str, errors: &mut Vec<String>) {
        for (name, field) in &self.fields {
            let path = format!("{prefix}{name}");
            let current = attrs.get(name);

            if !value::is_set(current) {
                if field.required {
                    errors.push(format!("{path}: required attribute is not set"));
                }
            } else if !field.is_computed_only() {
                if let Some(Value::Value(node)) = current {
                    check_value(field, node, &path, errors);
                }

                for other in &field.conflicts_with {
                    if value::is_set(attrs.get(*other)) {
                        errors.push(format!("{path}: conflicts with {prefix}{other}"));
                    }
                }
            }

            if !field.exactly_one_of.is_empty() {
                let set = field
                    .exactly_one_of
                    .iter()
                    .filter(|n| value::is_set(attrs.get(**n)))
                    .count();
                let names = field.exactly_one_of.join(",");
                let problem = match set {
                    0 => Some(format!("{prefix}one of `{names}` must be specified")),
                    1 => None,
                    _ => Some(format!("{prefix}only one of `{names}` can be specified")),
                };
                // Every member of the group carries the same rule; report it once.
                if let Some(problem) = problem.filter(|p| !errors.contains(p)) {
                    errors.push(problem);
                }
            }
        }
    }
}

fn for_each_block_mut(value: Option<&mut Value<Node>>, mut f: impl FnMut(&mut Attributes)) {
    if let Some(Value::Value(Node::List(items))) = value {
        for item in items.iter_mut() {
            if let Value::Value(Node::Object(block)) = item {
                f(block);
            }
        }
    }
}

fn check_value(field: &Field, node: &Node, path: &str, errors: &mut Vec<String>) {
    match (&field.kind, node) {
        (FieldKind::String, Node::String(s)) => {
            for validator in &field.validators {
                if let Err(e) = validator.check(path, s) {
                    errors.push(e);
                }
            }
        }
        (FieldKind::Bool, Node::Bool(_)) => {}
        (FieldKind::Map, Node::Object(m)) => {
            if m.values().any(|v| matches!(v, Value::Value(n) if !matches!(n, Node::String(_)))) {
                errors.push(format!("{path}: expected a map of strings"));
            }
        }
        (FieldKind::List | FieldKind::ObjectList(_), Node::List(_)) => {}
        (FieldKind::Block(inner), Node::List(items)) => {
            if items.len() > 1 {
                errors.push(format!(
                    "{path}: expected at most one block, got {}",
                    items.len()
                ));
            }
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Value(Node::Object(block)) => {
                        inner.validate_into(block, &format!("{path}.{i}."), errors)
                    }
                    Value::Unknown => {}
                    _ => errors.push(format!("{path}.{i}: expected an object")),
                }
            }
        }
        (kind, _) => errors.push(format!("{path}: expected {}", kind_name(kind))),
    }
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "a string",
        FieldKind::Bool => "a bool",
        FieldKind::Map => "a map",
        FieldKind::List | FieldKind::ObjectList(_) => "a list",
        FieldKind::Block(_) => "a block",
    }
}
