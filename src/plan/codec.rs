use std::fmt;

use crate::plan::types::PlanItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTextError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for PlanTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for PlanTextError {}

fn line_error(line: usize, message: impl Into<String>) -> PlanTextError {
    PlanTextError {
        line,
        message: message.into(),
    }
}

/// One item per line, `<start>: (<action> <args>...) [<duration>]`.
pub fn format_plan_text(items: &[PlanItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{:.3}: {} [{:.3}]",
                item.planned_start,
                item.full_name(),
                item.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses executor plan text. Both `0.0: (a x) [1.0]` and the bracketed
/// `[0.0](a x)[1.0]` layouts are accepted; blank lines and `;` comments are
/// skipped.
pub fn parse_plan_text(text: &str) -> Result<Vec<PlanItem>, PlanTextError> {
    let mut items = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let open = line
            .find('(')
            .ok_or_else(|| line_error(line_no, "missing '(' before action"))?;
        let close = line
            .rfind(')')
            .filter(|close| *close > open)
            .ok_or_else(|| line_error(line_no, "missing ')' after action"))?;

        let start_text = strip_brackets(line[..open].trim().trim_end_matches(':'));
        let duration_text = strip_brackets(&line[close + 1..]);
        let planned_start = parse_number(line_no, "start", start_text)?;
        let duration = parse_number(line_no, "duration", duration_text)?;
        if duration < 0.0 {
            return Err(line_error(line_no, "duration cannot be negative"));
        }

        let mut words = line[open + 1..close].split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| line_error(line_no, "empty action"))?
            .to_string();
        let args = words.map(str::to_string).collect();

        items.push(PlanItem {
            name,
            args,
            planned_start,
            duration,
            committed: false,
        });
    }
    Ok(items)
}

fn strip_brackets(text: &str) -> &str {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
}

fn parse_number(line: usize, field: &str, text: &str) -> Result<f64, PlanTextError> {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| line_error(line, format!("invalid {field} '{text}'")))
}
