//! Prompts for business extraction and the receptionist persona.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Markdown beyond this many characters is cut before it is sent to the LLM.
pub const MAX_MARKDOWN_CHARS: usize = 15_000;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You extract structured business information from \
website content. Reply with a single JSON object and nothing else. Never invent facts that \
are not supported by the content; use null or an empty list instead.";

/// Business facts extracted from a scraped website.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBusiness {
    pub name: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub services: Vec<String>,
    /// Either an object keyed by weekday or free text
    pub opening_hours: Option<Value>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// ISO 639-1 code of the site's main language
    pub language: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON object found in model reply")]
    NoJson,
    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model reply has no business name")]
    MissingName,
}

/// User message asking the model for the extraction JSON.
pub fn extraction_prompt(url: &str, markdown: &str) -> String {
    let content: String = markdown.chars().take(MAX_MARKDOWN_CHARS).collect();

    format!(
        r#"Extract information about the business behind {url}.

Return JSON with exactly these keys:
{{
  "name": "business name as customers know it",
  "industry": "short industry label, e.g. hairdresser, plumber, dentist",
  "description": "one or two sentences about what the business does",
  "services": ["service", "..."],
  "opening_hours": {{"monday": "08:00-17:00", "...": "..."}},
  "address": "street address with postal code and city",
  "phone": "main phone number",
  "email": "contact email",
  "language": "two-letter language code of the website"
}}

Website content (markdown):
---
{content}
---"#
    )
}

/// Parses the model reply. Code fences and prose around the object are
/// ignored; values of the wrong shape are dropped rather than failing.
pub fn parse_extraction(reply: &str) -> Result<ExtractedBusiness, ExtractionError> {
    let json = extract_json_object(reply).ok_or(ExtractionError::NoJson)?;
    let value: Value =
        serde_json::from_str(json).map_err(|err| ExtractionError::InvalidJson(err.to_string()))?;

    let name = text_field(&value, "name").ok_or(ExtractionError::MissingName)?;

    let services = value
        .get("services")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Object(obj) => obj
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let opening_hours = match value.get("opening_hours") {
        Some(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map.clone())),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Value::String(s.trim().to_string())),
        _ => None,
    };

    Ok(ExtractedBusiness {
        name,
        industry: text_field(&value, "industry"),
        description: text_field(&value, "description"),
        services,
        opening_hours,
        address: text_field(&value, "address"),
        phone: text_field(&value, "phone"),
        email: text_field(&value, "email"),
        language: text_field(&value, "language").map(|l| l.to_lowercase()),
    })
}

fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

/// System prompt for the business's AI receptionist (Swedish).
pub fn assistant_system_prompt(business: &ExtractedBusiness) -> String {
    let mut prompt = format!(
        "Du är en vänlig och professionell AI-receptionist för {}. \
Du svarar i telefon på företagets vägnar och pratar alltid svenska, \
om inte den som ringer pratar ett annat språk.\n",
        business.name
    );

    if let Some(industry) = &business.industry {
        prompt.push_str(&format!("Bransch: {}\n", industry));
    }
    if let Some(description) = &business.description {
        prompt.push_str(&format!("Om företaget: {}\n", description));
    }
    if !business.services.is_empty() {
        prompt.push_str("Tjänster:\n");
        for service in &business.services {
            prompt.push_str(&format!("- {}\n", service));
        }
    }
    if let Some(hours) = business.opening_hours.as_ref().and_then(describe_opening_hours) {
        prompt.push_str(&format!("Öppettider:\n{}\n", hours));
    }
    if let Some(address) = &business.address {
        prompt.push_str(&format!("Adress: {}\n", address));
    }
    if let Some(phone) = &business.phone {
        prompt.push_str(&format!("Telefon: {}\n", phone));
    }
    if let Some(email) = &business.email {
        prompt.push_str(&format!("E-post: {}\n", email));
    }

    prompt.push_str(
        "\nRiktlinjer:\n\
- Håll svaren korta och naturliga, det här är ett telefonsamtal.\n\
- Hitta aldrig på priser, tider eller löften som inte står ovan.\n\
- Kan du inte svara, erbjud att ta ett meddelande: fråga efter namn, telefonnummer och ärende.\n\
- Bekräfta uppgifterna innan samtalet avslutas.\n",
    );

    prompt
}

/// Greeting spoken when the assistant picks up.
pub fn assistant_first_message(business: &ExtractedBusiness) -> String {
    format!(
        "Hej och välkommen till {}! Jag är en AI-assistent. Vad kan jag hjälpa dig med?",
        business.name
    )
}

fn describe_opening_hours(hours: &Value) -> Option<String> {
    match hours {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .filter_map(|(day, value)| value.as_str().map(|v| format!("- {}: {}", day, v)))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}
