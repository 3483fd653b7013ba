use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    belief::Belief,
    condition::{BeliefTemplate, Binding},
};

pub const ROOT_TYPE: &str = "object";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEffect {
    Add { belief: BeliefTemplate },
    Del { belief: BeliefTemplate },
}

/// Declared shape of a domain action. Effect templates reference the
/// action's parameters as placeholders, e.g. `{r}` for parameter `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<TypedParameter>,
    #[serde(default)]
    pub effects: Vec<ActionEffect>,
}

impl ActionDefinition {
    /// Binds parameter names positionally to `args`. `None` on arity
    /// mismatch.
    pub fn bind_args(&self, args: &[String]) -> Option<Binding> {
        if args.len() != self.parameters.len() {
            return None;
        }
        Some(
            self.parameters
                .iter()
                .zip(args)
                .map(|(param, arg)| (param.name.clone(), arg.clone()))
                .collect(),
        )
    }
}

/// Domain actions plus the problem instances they can be applied to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainDefinition {
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    /// Instance name → declared type.
    #[serde(default)]
    pub instances: BTreeMap<String, String>,
    /// Type name → parent type. Types without an entry derive from `object`.
    #[serde(default)]
    pub supertypes: BTreeMap<String, String>,
    #[serde(default)]
    pub initial_beliefs: Vec<Belief>,
}

impl DomainDefinition {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read domain {}", path.display()))?;
        let domain: DomainDefinition = json5::from_str(&content)
            .with_context(|| format!("failed to parse domain {}", path.display()))?;
        domain.check()?;
        Ok(domain)
    }

    pub fn action(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn is_instance_of(&self, instance: &str, type_name: &str) -> bool {
        let Some(mut current) = self.instances.get(instance).map(String::as_str) else {
            return false;
        };
        if type_name == ROOT_TYPE {
            return true;
        }

        let mut visited = BTreeSet::new();
        loop {
            if current == type_name {
                return true;
            }
            if !visited.insert(current) {
                return false;
            }
            match self.supertypes.get(current) {
                Some(parent) => current = parent.as_str(),
                None => return false,
            }
        }
    }

    fn check(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for action in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(anyhow!("duplicate action definition '{}'", action.name));
            }
            let params: BTreeSet<&str> = action
                .parameters
                .iter()
                .map(|param| param.name.as_str())
                .collect();
            for effect in &action.effects {
                let (ActionEffect::Add { belief } | ActionEffect::Del { belief }) = effect;
                if let Some(missing) = belief.placeholders().find(|name| !params.contains(*name)) {
                    return Err(anyhow!(
                        "action '{}' effect on '{}' references unknown parameter '{}'",
                        action.name,
                        belief.name,
                        missing
                    ));
                }
            }
        }
        Ok(())
    }
}
