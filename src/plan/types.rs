use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Unknown,
    Running,
    Success,
    Failure,
}

impl ActionStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanExecStatus {
    #[default]
    Idle,
    Running,
    Success,
    Aborted,
    Failed,
}

impl PlanExecStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Aborted | Self::Failed)
    }
}

/// One scheduled action as handed to the executor. Times are seconds
/// relative to plan start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub planned_start: f64,
    pub duration: f64,
    #[serde(default)]
    pub committed: bool,
}

impl PlanItem {
    pub fn new(name: impl Into<String>, args: &[&str], planned_start: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            planned_start,
            duration,
            committed: false,
        }
    }

    pub fn full_name(&self) -> String {
        full_action_name(&self.name, &self.args)
    }

    pub fn planned_end(&self) -> f64 {
        self.planned_start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExecutionInfo {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub planned_start: f64,
    pub duration: f64,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub committed: bool,
    #[serde(default)]
    pub exec_start: Option<f64>,
    #[serde(default)]
    pub exec_end: Option<f64>,
    #[serde(default)]
    pub progress: f32,
}

impl ActionExecutionInfo {
    pub fn key(&self) -> ActionKey {
        ActionKey::new(&self.name, &self.args, self.planned_start)
    }

    pub fn full_name(&self) -> String {
        full_action_name(&self.name, &self.args)
    }

    pub fn planned_end(&self) -> f64 {
        self.planned_start + self.duration
    }

    pub fn to_item(&self) -> PlanItem {
        PlanItem {
            name: self.name.clone(),
            args: self.args.clone(),
            planned_start: self.planned_start,
            duration: self.duration,
            committed: self.committed,
        }
    }
}

impl From<&PlanItem> for ActionExecutionInfo {
    fn from(item: &PlanItem) -> Self {
        Self {
            name: item.name.clone(),
            args: item.args.clone(),
            planned_start: item.planned_start,
            duration: item.duration,
            status: ActionStatus::Unknown,
            committed: item.committed,
            exec_start: None,
            exec_end: None,
            progress: 0.0,
        }
    }
}

/// Identity of an action occurrence across feedback refreshes: the full
/// action name plus its planned start at millisecond resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey {
    pub full_name: String,
    pub planned_start_ms: i64,
}

impl ActionKey {
    pub fn new(name: &str, args: &[String], planned_start: f64) -> Self {
        Self::from_full_name(&full_action_name(name, args), planned_start)
    }

    pub fn from_full_name(full_name: &str, planned_start: f64) -> Self {
        Self {
            full_name: normalize_full_name(full_name),
            planned_start_ms: (planned_start * 1000.0).round() as i64,
        }
    }
}

/// `moveTo` with `[r1, kitchen]` → `(moveTo r1 kitchen)`.
pub fn full_action_name(name: &str, args: &[String]) -> String {
    let mut full = format!("({name}");
    for arg in args {
        full.push(' ');
        full.push_str(arg);
    }
    full.push(')');
    full
}

fn normalize_full_name(raw: &str) -> String {
    let inner = raw.trim().trim_start_matches('(').trim_end_matches(')');
    format!("({})", inner.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Snapshot reported by the execution backend for the running plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFeedback {
    pub status: PlanExecStatus,
    pub current_time: f64,
    pub actions: Vec<ActionExecutionInfo>,
}
