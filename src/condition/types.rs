use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::belief::{Belief, BeliefKind};

/// Tolerance applied to fluent equality. Values coming back from the
/// execution backend are not bit-exact.
pub const FLUENT_EPSILON: f64 = 1e-6;

/// Placeholder name → concrete argument.
pub type Binding = BTreeMap<String, String>;

/// One argument position of a clause pattern. Serialized as a plain string;
/// `{name}` denotes a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Term {
    Value(String),
    Placeholder(String),
}

impl Term {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::Placeholder(name.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    pub fn resolve(&self, binding: &Binding) -> Option<String> {
        match self {
            Self::Value(value) => Some(value.clone()),
            Self::Placeholder(name) => binding.get(name).cloned(),
        }
    }

    pub fn substitute(&self, binding: &Binding) -> Term {
        match self {
            Self::Placeholder(name) => match binding.get(name) {
                Some(value) => Self::Value(value.clone()),
                None => self.clone(),
            },
            Self::Value(_) => self.clone(),
        }
    }
}

impl TryFrom<String> for Term {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("term cannot be empty".to_string());
        }
        match trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) if name.trim().is_empty() => {
                Err(format!("placeholder '{trimmed}' has no name"))
            }
            Some(name) => Ok(Self::Placeholder(name.trim().to_string())),
            None => Ok(Self::Value(trimmed.to_string())),
        }
    }
}

impl From<Term> for String {
    fn from(term: Term) -> Self {
        term.to_string()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Placeholder(name) => write!(f, "{{{name}}}"),
        }
    }
}

/// A belief whose parameters may reference placeholders; instantiated once
/// a binding is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefTemplate {
    pub name: String,
    #[serde(default)]
    pub kind: BeliefKind,
    #[serde(default)]
    pub params: Vec<Term>,
    #[serde(default)]
    pub value: f64,
}

impl BeliefTemplate {
    pub fn predicate(name: impl Into<String>, params: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            kind: BeliefKind::Predicate,
            params,
            value: 0.0,
        }
    }

    /// `None` when a parameter references a placeholder missing from
    /// `binding`.
    pub fn instantiate(&self, binding: &Binding) -> Option<Belief> {
        let params = self
            .params
            .iter()
            .map(|term| term.resolve(binding))
            .collect::<Option<Vec<_>>>()?;
        Some(Belief {
            name: self.name.clone(),
            kind: self.kind,
            params,
            value: self.value,
        })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter_map(|term| match term {
            Term::Placeholder(name) => Some(name.as_str()),
            Term::Value(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl Comparator {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        let equal = (lhs - rhs).abs() <= FLUENT_EPSILON;
        match self {
            Self::Eq => equal,
            Self::Lt => lhs < rhs && !equal,
            Self::Gt => lhs > rhs && !equal,
            Self::Le => lhs < rhs || equal,
            Self::Ge => lhs > rhs || equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub op: Comparator,
    pub value: f64,
}

/// A single literal test against the belief set. Without a comparison the
/// clause tests presence; with one it tests a fluent's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub name: String,
    #[serde(default)]
    pub kind: BeliefKind,
    #[serde(default)]
    pub params: Vec<Term>,
    #[serde(default)]
    pub compare: Option<Comparison>,
    #[serde(default)]
    pub negated: bool,
}

impl Clause {
    pub fn predicate(name: impl Into<String>, params: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            kind: BeliefKind::Predicate,
            params,
            compare: None,
            negated: false,
        }
    }

    pub fn fluent(name: impl Into<String>, params: Vec<Term>, op: Comparator, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: BeliefKind::Fluent,
            params,
            compare: Some(Comparison { op, value }),
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is_ground(&self) -> bool {
        !self.params.iter().any(Term::is_placeholder)
    }

    /// Tries to match `belief` under `binding`, returning the binding
    /// extended with any placeholder first bound by this clause. Ignores the
    /// negation flag.
    pub fn unify(&self, belief: &Belief, binding: &Binding) -> Option<Binding> {
        if belief.name != self.name
            || belief.kind != self.kind
            || belief.params.len() != self.params.len()
        {
            return None;
        }

        let mut extended = binding.clone();
        for (term, actual) in self.params.iter().zip(&belief.params) {
            match term {
                Term::Value(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Term::Placeholder(name) => match extended.get(name) {
                    Some(bound) if bound != actual => return None,
                    Some(_) => {}
                    None => {
                        extended.insert(name.clone(), actual.clone());
                    }
                },
            }
        }

        if let Some(comparison) = self.compare {
            if !belief.is_fluent() || !comparison.op.holds(belief.value, comparison.value) {
                return None;
            }
        }

        Some(extended)
    }

    pub fn substitute(&self, binding: &Binding) -> Clause {
        Clause {
            params: self.params.iter().map(|term| term.substitute(binding)).collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conjunction {
    pub clauses: Vec<Clause>,
}

impl Conjunction {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn is_ground(&self) -> bool {
        self.clauses.iter().all(Clause::is_ground)
    }
}

/// OR of ANDs. No conjunctions at all means "no condition" and is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionDnf {
    pub conjunctions: Vec<Conjunction>,
}

impl ConditionDnf {
    pub fn new(conjunctions: Vec<Conjunction>) -> Self {
        Self { conjunctions }
    }

    pub fn single(clauses: Vec<Clause>) -> Self {
        Self::new(vec![Conjunction::new(clauses)])
    }

    pub fn is_empty(&self) -> bool {
        self.conjunctions.is_empty()
    }

    pub fn substitute(&self, binding: &Binding) -> ConditionDnf {
        ConditionDnf {
            conjunctions: self
                .conjunctions
                .iter()
                .map(|conjunction| Conjunction {
                    clauses: conjunction
                        .clauses
                        .iter()
                        .map(|clause| clause.substitute(binding))
                        .collect(),
                })
                .collect(),
        }
    }
}
