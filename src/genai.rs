use crate::config::GenerationSettings;
use crate::schedule::{slots_for_day, DAYS};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for an OpenAI-compatible chat-completions endpoint. Constructed
/// explicitly from workspace settings; the daemon runs fine without one,
/// generation requests just report `not_configured`.
pub struct TextGenerator {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

impl TextGenerator {
    /// Returns None when the configured API key variable is not set in the
    /// environment.
    pub fn from_settings(settings: &GenerationSettings) -> Option<Self> {
        let api_key = match std::env::var(&settings.api_key_env) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                log::warn!(
                    "{} not set; timetable generation disabled",
                    settings.api_key_env
                );
                return None;
            }
        };
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One prompt in, one text payload out. The payload is untrusted; the
    /// recovery parser deals with whatever comes back.
    pub fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let snippet: String = detail.chars().take(300).collect();
            return Err(anyhow!("generation service returned {}: {}", status, snippet));
        }

        let parsed: CompletionResponse = response
            .json()
            .context("generation service returned an unexpected response shape")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(anyhow!("generation service returned an empty completion"));
        }
        Ok(content)
    }
}

pub struct PromptContext<'a> {
    pub preferences: Option<&'a str>,
    pub instructions: Option<&'a str>,
    pub prior_timetable: Option<&'a str>,
    pub subjects: &'a [String],
    pub faculty: &'a [String],
    pub rooms: &'a [String],
}

/// Assemble the generation prompt. Pure; the grid description is derived
/// from the same canonical constants the normalizer reconciles against, so
/// a cooperative model can hit the canonical keys exactly.
pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a university timetable planner. Produce a weekly class \
         schedule as a single JSON object and nothing else: no prose, no \
         markdown fences.\n\n",
    );

    prompt.push_str("Days and time slots (use these exact strings as keys):\n");
    for day in DAYS {
        prompt.push_str(&format!("- {}: {}\n", day, slots_for_day(day).join(", ")));
    }
    prompt.push_str(
        "\nEach scheduled cell is an object with fields \"courseCode\", \
         \"facultyInitials\", and \"room\". Leave free periods out entirely. \
         Use at most 2 distinct rooms, vary courses and faculty across the \
         week, and fill at least a third of the grid.\n",
    );

    if !ctx.subjects.is_empty() {
        prompt.push_str("\nSubjects to schedule:\n");
        for s in ctx.subjects {
            prompt.push_str(&format!("- {}\n", s));
        }
    }
    if !ctx.faculty.is_empty() {
        prompt.push_str("\nAvailable faculty (use their initials):\n");
        for f in ctx.faculty {
            prompt.push_str(&format!("- {}\n", f));
        }
    }
    if !ctx.rooms.is_empty() {
        prompt.push_str("\nAvailable rooms:\n");
        for r in ctx.rooms {
            prompt.push_str(&format!("- {}\n", r));
        }
    }
    if let Some(prefs) = ctx.preferences {
        if !prefs.trim().is_empty() {
            prompt.push_str(&format!("\nUser preferences: {}\n", prefs.trim()));
        }
    }
    if let Some(extra) = ctx.instructions {
        if !extra.trim().is_empty() {
            prompt.push_str(&format!("\nAdditional instructions: {}\n", extra.trim()));
        }
    }
    if let Some(prior) = ctx.prior_timetable {
        prompt.push_str(&format!(
            "\nThe previous timetable, for reference (improve on it rather \
             than repeating it):\n{}\n",
            prior
        ));
    }
    prompt
}
