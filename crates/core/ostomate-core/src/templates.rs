//! Template engine for language model prompts

use crate::extractor::ExtractionRequest;
use crate::{OstomateError, Result};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Template engine wrapper
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // prompts are plain text
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template with data
    pub fn render(
        &self,
        template: &str,
        data: &HashMap<String, serde_json::Value>,
    ) -> Result<String> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| OstomateError::template(e.to_string()))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the extraction prompt for a request
pub fn render_extraction_prompt(request: &ExtractionRequest) -> Result<String> {
    let mut data: HashMap<String, serde_json::Value> = HashMap::new();
    data.insert("FREE_TEXT".to_string(), request.free_text.clone().into());
    data.insert(
        "REFERENCE_TIMESTAMP".to_string(),
        request.reference_timestamp.to_rfc3339().into(),
    );
    TemplateEngine::new().render(EXTRACTION_TEMPLATE, &data)
}

/// Prompt asking the model to split a daily log into typed entries
pub const EXTRACTION_TEMPLATE: &str = r#"You help a person with a colostomy keep a health diary.
Split their description of the day into separate log entries.

# Reference time
{{REFERENCE_TIMESTAMP}}

# Description
{{FREE_TEXT}}

# Categories
- breakfast, lunch, dinner, snack, drink: something eaten or drunk
- symptom: gas, bloating, pain, cramping, nausea, heartburn, diarrhea, constipation
- output: bowel movement, stoma output, consistency, pouch change
- irrigation: an irrigation session
- medication: a medicine taken

# Response
Reply with JSON only, no prose. Use this shape:
{"entries": [
  {"category": "<category>",
   "description": "<short description>",
   "timestampOrOffset": "<ISO-8601 time, HH:MM on the reference day, or minutes from the reference time>",
   "confidence": <number between 0 and 1>,
   "details": {"ingredients": [], "quantity": null, "severity": null, "volume": null, "consistency": null}}
]}
Resolve relative times ("this morning", "two hours ago") against the reference time.
If nothing in the description fits a category, reply {"entries": []}.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_render_fills_and_blanks_variables() {
        let engine = TemplateEngine::new();
        let mut data = HashMap::new();
        data.insert("NAME".to_string(), serde_json::json!("toast"));
        assert_eq!(engine.render("ate {{NAME}}{{MISSING}}", &data).unwrap(), "ate toast");
        assert!(engine.render("ate {{#if NAME}}", &data).is_err());
    }

    #[test]
    fn test_extraction_prompt_is_not_html_escaped() {
        let reference = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 14, 12, 0, 0)
            .unwrap();
        let request = ExtractionRequest::new("beans & toast <3", reference);
        let prompt = render_extraction_prompt(&request).unwrap();
        assert!(prompt.contains("beans & toast <3"));
        assert!(prompt.contains("2024-05-14T12:00:00+00:00"));
    }
}
