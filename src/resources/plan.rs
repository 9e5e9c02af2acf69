//! Plan hooks: defaults, computed values, secret memo suppression and
//! replacement for one proposed change.

use crate::error::ProviderError;
use crate::schema::value::{self, first_block, first_block_mut};
use crate::schema::{Attributes, FieldKind, Fields, Node, Value};
use crate::secret;

/// Planned new state plus what changed against the prior state.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub state: Attributes,
    /// Attribute paths that differ, nested ones as `block.0.attribute`.
    pub changed: Vec<String>,
    /// Top-level attributes whose change forces a new endpoint.
    pub requires_replace: Vec<String>,
}

impl PlannedChange {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

pub fn plan(
    fields: &Fields,
    prior: Option<&Attributes>,
    config: &Attributes,
) -> Result<PlannedChange, ProviderError> {
    let mut planned = config.clone();
    fields.apply_defaults(&mut planned);
    fields.complete(&mut planned);
    fields.validate(&planned)?;

    let Some(prior) = prior else {
        mark_computed_unknown(fields, &mut planned, &|_| true);
        let changed = fields
            .iter()
            .filter(|(name, f)| !f.is_computed_only() && value::is_set(planned.get(*name)))
            .map(|(name, _)| name.clone())
            .collect();
        return Ok(PlannedChange {
            state: planned,
            changed,
            requires_replace: Vec::new(),
        });
    };

    carry_computed(fields, prior, &mut planned);
    plan_memos(fields, prior, &mut planned);

    let mut changed = Vec::new();
    let mut requires_replace = Vec::new();
    diff(fields, prior, &planned, "", &mut changed, &mut requires_replace);

    if !changed.is_empty() {
        // The id survives an update, memos were settled above.
        mark_computed_unknown(fields, &mut planned, &|name| name != "id");
    }

    Ok(PlannedChange {
        state: planned,
        changed,
        requires_replace,
    })
}

fn mark_computed_unknown(fields: &Fields, attrs: &mut Attributes, include: &dyn Fn(&str) -> bool) {
    for (name, field) in fields.iter() {
        let settled_memo = field.memo && is_settled(attrs.get(name));
        if field.is_computed_only() && !settled_memo && include(name) {
            attrs.insert(name.clone(), Value::Unknown);
        }
        if let FieldKind::Block(inner) = &field.kind {
            if let Some(block) = first_block_mut(attrs.get_mut(name)) {
                mark_computed_unknown(inner, block, include);
            }
        }
    }
}

fn is_settled(value: Option<&Value<Node>>) -> bool {
    matches!(value, Some(Value::Value(_)))
}

/// Computed values come from prior state, including those inside blocks.
fn carry_computed(fields: &Fields, prior: &Attributes, planned: &mut Attributes) {
    for (name, field) in fields.iter() {
        if field.is_computed_only() {
            if let Some(v) = prior.get(name) {
                planned.insert(name.clone(), v.clone());
            }
        }
        if let FieldKind::Block(inner) = &field.kind {
            if let (Some(prior), Some(block)) =
                (first_block(prior.get(name)), first_block_mut(planned.get_mut(name)))
            {
                carry_computed(inner, prior, block);
            }
        }
    }
}

/// Keep a memo when its secret still matches it, otherwise leave it to apply.
fn plan_memos(fields: &Fields, prior: &Attributes, planned: &mut Attributes) {
    for (name, field) in fields.iter() {
        if let FieldKind::Block(inner) = &field.kind {
            match (first_block(prior.get(name)), first_block_mut(planned.get_mut(name))) {
                (Some(prior), Some(block)) => plan_memos(inner, prior, block),
                (None, Some(block)) => mark_computed_unknown(inner, block, &|_| true),
                _ => {}
            }
            continue;
        }
        if !field.sensitive || field.is_computed_only() {
            continue;
        }

        let memo_name = secret::memo_key(name);
        let memo = match planned.get(name) {
            Some(Value::Unknown) => Value::Unknown,
            None | Some(Value::Null) => value::string(""),
            current => match value::as_str(current) {
                Some("") => value::string(""),
                Some(secret_value) => {
                    let prior_memo = value::as_str(prior.get(&memo_name)).unwrap_or("");
                    if secret::suppress_diff(secret_value, prior_memo) {
                        value::string(prior_memo)
                    } else {
                        Value::Unknown
                    }
                }
                None => Value::Unknown,
            },
        };
        planned.insert(memo_name, memo);
    }
}

fn diff(
    fields: &Fields,
    prior: &Attributes,
    planned: &Attributes,
    prefix: &str,
    changed: &mut Vec<String>,
    requires_replace: &mut Vec<String>,
) {
    for (name, field) in fields.iter() {
        if field.is_computed_only() {
            continue;
        }
        let path = format!("{prefix}{name}");
        let before = changed.len();

        match &field.kind {
            FieldKind::Block(inner) => {
                match (first_block(prior.get(name)), first_block(planned.get(name))) {
                    (None, None) => {}
                    // Nested changes are recorded under their own paths.
                    (Some(old), Some(new)) => diff(
                        inner,
                        old,
                        new,
                        &format!("{path}.0."),
                        changed,
                        requires_replace,
                    ),
                    _ => changed.push(path),
                }
            }
            _ => {
                // A memo planned unchanged means the secret still matches it.
                let memo_name = secret::memo_key(name);
                let compared = match value::as_str(prior.get(&memo_name)) {
                    Some(memo) if field.sensitive && !memo.is_empty() => &memo_name,
                    _ => name,
                };
                if !same(prior.get(compared), planned.get(compared)) {
                    changed.push(path);
                }
            }
        }

        if field.force_new && changed.len() > before && prefix.is_empty() {
            requires_replace.push(name.clone());
        }
    }
}

fn same(old: Option<&Value<Node>>, new: Option<&Value<Node>>) -> bool {
    match (old, new) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (Some(Value::Value(a)), Some(Value::Value(b))) => a == b,
        _ => false,
    }
}
