//! Session state output formatting.

use chips_filter_rs::{
    ControlStatus, DraftOption, FilterEngine, Item, OptionListPresentation, Qualifier, Value,
};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for the session state.
#[derive(Serialize)]
pub struct StateOutput<'a> {
    pub items: &'a [Item],
    /// 1-based position of the chip being edited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<usize>,
    pub draft: DraftOutput,
    pub options: Vec<&'a str>,
    pub option_list: &'static str,
    pub active: bool,
}

/// JSON output structure for the draft.
#[derive(Serialize)]
pub struct DraftOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    pub resolved: bool,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON output structure for a search request.
#[derive(Serialize)]
pub struct SearchOutput<'a> {
    pub search: &'a [Item],
}

/// JSON output structure for value suggestions.
#[derive(Serialize)]
pub struct SuggestionsOutput<'a> {
    pub suggestions: &'a [Value],
}

/// Position of the edited chip, 1-based.
fn editing_position(engine: &FilterEngine) -> Option<usize> {
    let key = engine.editing()?;
    engine
        .items()
        .iter()
        .position(|item| item.key() == key)
        .map(|i| i + 1)
}

fn presentation_name(presentation: OptionListPresentation) -> &'static str {
    match presentation {
        OptionListPresentation::Shown => "shown",
        OptionListPresentation::Hidden => "hidden",
        OptionListPresentation::Shadowed => "shadowed",
    }
}

fn qualifier_label(qualifier: &Qualifier) -> String {
    qualifier
        .icon
        .clone()
        .unwrap_or_else(|| qualifier.value.to_string())
}

fn draft_output(engine: &FilterEngine) -> DraftOutput {
    let draft = engine.draft();
    let option = match &draft.option {
        Some(DraftOption::Resolved(option)) => Some(option.title.clone()),
        Some(DraftOption::Unresolved(text)) => Some(text.clone()),
        None => None,
    };
    let (status, error) = match engine.control().status() {
        ControlStatus::Valid => ("valid", None),
        ControlStatus::Pending => ("pending", None),
        ControlStatus::Invalid(e) => ("invalid", Some(e.to_string())),
    };

    DraftOutput {
        option,
        resolved: draft.resolved().is_some(),
        value: engine.format_value(draft.value.as_ref()),
        qualifier: draft.qualifier.as_ref().map(qualifier_label),
        status,
        error,
    }
}

/// Formats the session state as JSON.
pub fn format_state_json(engine: &FilterEngine) -> Result<String, serde_json::Error> {
    let output = StateOutput {
        items: engine.items(),
        editing: editing_position(engine),
        draft: draft_output(engine),
        options: engine
            .filtered_options()
            .iter()
            .map(|o| o.title.as_str())
            .collect(),
        option_list: presentation_name(engine.option_list_presentation()),
        active: engine.is_active(),
    };
    serde_json::to_string(&output)
}

/// Formats the session state for the terminal.
pub fn format_state_table(engine: &FilterEngine, use_colors: bool) -> String {
    let mut output = String::new();
    let editing = editing_position(engine);

    if engine.items().is_empty() {
        output.push_str("No chips.\n");
    }
    for (index, item) in engine.items().iter().enumerate() {
        let position = index + 1;
        let marker = if editing == Some(position) { '*' } else { ' ' };
        let mut text = engine.format_item(item);
        if let Some(qualifier) = &item.qualifier {
            text.push_str(&format!(" [{}]", qualifier_label(qualifier)));
        }

        let line = format!("{position:>3}{marker} {text}");
        let line = if !use_colors {
            line
        } else if editing == Some(position) {
            line.yellow().to_string()
        } else if item.option.readonly {
            line.dimmed().to_string()
        } else {
            line
        };
        output.push_str(&line);
        output.push('\n');
    }

    let draft = draft_output(engine);
    let mut draft_line = format!(
        "Draft: {} = {}",
        draft.option.as_deref().unwrap_or("-"),
        if draft.value.is_empty() { "-" } else { draft.value.as_str() }
    );
    if let Some(qualifier) = &draft.qualifier {
        draft_line.push_str(&format!(" [{qualifier}]"));
    }
    if let Some(error) = &draft.error {
        let note = format!(" ({error})");
        if use_colors {
            draft_line.push_str(&note.red().to_string());
        } else {
            draft_line.push_str(&note);
        }
    }
    output.push_str(&draft_line);
    output.push('\n');

    let titles: Vec<&str> = engine
        .filtered_options()
        .iter()
        .map(|o| o.title.as_str())
        .collect();
    let presentation = engine.option_list_presentation();
    let options_line = format!(
        "Options ({}): {}",
        presentation_name(presentation),
        if titles.is_empty() {
            "-".to_string()
        } else {
            titles.join(", ")
        }
    );
    if use_colors && presentation != OptionListPresentation::Shown {
        output.push_str(&options_line.dimmed().to_string());
    } else {
        output.push_str(&options_line);
    }
    output.push('\n');

    output
}

/// Formats the items of a search request as JSON.
pub fn format_search_json(items: &[Item]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&SearchOutput { search: items })
}

/// Formats value suggestions as JSON.
pub fn format_suggestions_json(values: &[Value]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SuggestionsOutput {
        suggestions: values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chips_filter_rs::{FilterOption, OptionType};

    fn engine() -> FilterEngine {
        let report = FilterOption::new("Report", OptionType::Integer)
            .readonly()
            .shared();
        let branch = FilterOption::new("Branch", OptionType::Integer).shared();
        FilterEngine::new(
            vec![report.clone(), branch],
            vec![Item::new(report, Some(Value::Integer(1203001)))],
        )
    }

    #[test]
    fn test_state_table_lists_chips_draft_and_options() {
        let output = format_state_table(&engine(), false);
        assert!(output.contains("  1  Report: 1203001"));
        assert!(output.contains("Draft: Branch = -"));
        assert!(output.contains("Options (hidden): Branch"));
    }

    #[test]
    fn test_state_json() {
        let json = format_state_json(&engine()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["items"][0]["option"], "Report");
        assert_eq!(parsed["items"][0]["value"], 1203001);
        assert_eq!(parsed["draft"]["option"], "Branch");
        assert_eq!(parsed["draft"]["status"], "valid");
        assert_eq!(parsed["options"][0], "Branch");
        assert_eq!(parsed["option_list"], "hidden");
        assert!(parsed.get("editing").is_none());
    }

    #[test]
    fn test_search_json() {
        let engine = engine();
        let json = format_search_json(engine.items()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["search"][0]["option"], "Report");
    }

    #[test]
    fn test_suggestions_json() {
        let json = format_suggestions_json(&[Value::Integer(680), Value::text("date")]).unwrap();
        assert_eq!(json, r#"{"suggestions":[680,"date"]}"#);
    }
}
