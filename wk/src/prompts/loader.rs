//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to
//! embedded defaults, then renders them with Handlebars.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{Activity, DayPlan, Preferences};
use crate::schema;

/// Context for the system instruction
#[derive(Debug, Clone, Serialize)]
pub struct SystemContext {
    pub vibe: String,
    pub budget: String,
    pub interests: String,
    pub group: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Scope city, or a generic fallback when the address has no city token
    pub city: String,
    pub distance: String,
    pub pace: String,
    pub dietary_needs: String,
    pub occasion: String,
    pub accommodation: String,
    pub transportation: String,
    pub dates_start: String,
    pub dates_end: String,
    /// Pretty-printed itinerary schema
    pub schema: String,
}

impl SystemContext {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        debug!(address = %prefs.location.address, "SystemContext::from_preferences: called");
        let city = prefs.city().unwrap_or_else(|| "the user's home city".to_string());
        Self {
            vibe: prefs.vibe.clone(),
            budget: prefs.budget.clone(),
            interests: prefs.interests.join(", "),
            group: prefs.group.clone(),
            address: prefs.location.address.clone(),
            latitude: prefs.location.latitude,
            longitude: prefs.location.longitude,
            city,
            distance: or_unspecified(&prefs.distance),
            pace: or_unspecified(&prefs.pace),
            dietary_needs: prefs.dietary_needs.join(", "),
            occasion: prefs.occasion.clone(),
            accommodation: prefs.accommodation.join(", "),
            transportation: prefs.transportation.clone(),
            dates_start: prefs.dates.start.clone(),
            dates_end: prefs.dates.end.clone(),
            schema: serde_json::to_string_pretty(&schema::itinerary_schema()).unwrap_or_default(),
        }
    }
}

fn or_unspecified(value: &str) -> String {
    if value.trim().is_empty() {
        "any".to_string()
    } else {
        value.to_string()
    }
}

fn activity_json(activity: &Activity) -> String {
    serde_json::to_string_pretty(activity).unwrap_or_default()
}

/// Context for the structured replacement prompt
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceContext {
    pub day: String,
    pub theme: String,
    pub address: String,
    pub budget: String,
    pub current_total: String,
    /// 1-based position of the target activity
    pub position: usize,
    pub activity_count: usize,
    pub target: String,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub preference: String,
}

impl ReplaceContext {
    /// Build the context for replacing `day.activities[index]`
    ///
    /// Returns `None` when the index is out of range.
    pub fn new(prefs: &Preferences, day: &DayPlan, index: usize, preference: &str, current_total: &str) -> Option<Self> {
        debug!(day = %day.day, %index, "ReplaceContext::new: called");
        let target = day.activities.get(index)?;
        let previous = index.checked_sub(1).and_then(|i| day.activities.get(i));
        let next = day.activities.get(index + 1);

        Some(Self {
            day: day.day.clone(),
            theme: day.theme.clone(),
            address: prefs.location.address.clone(),
            budget: prefs.budget.clone(),
            current_total: if current_total.trim().is_empty() {
                "N/A".to_string()
            } else {
                current_total.to_string()
            },
            position: index + 1,
            activity_count: day.activities.len(),
            target: activity_json(target),
            previous: previous.map(activity_json),
            next: next.map(activity_json),
            preference: preference.trim().to_string(),
        })
    }
}

/// Context for the chat-based alternative request
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeContext {
    pub day: String,
    pub title: String,
    pub position: usize,
    pub preference: String,
}

impl AlternativeContext {
    /// Returns `None` when the index is out of range
    pub fn new(day: &DayPlan, index: usize, preference: &str) -> Option<Self> {
        debug!(day = %day.day, %index, "AlternativeContext::new: called");
        let target = day.activities.get(index)?;
        Some(Self {
            day: day.day.clone(),
            title: target.title.clone(),
            position: index + 1,
            preference: preference.trim().to_string(),
        })
    }
}

/// Loads and renders prompt templates
pub struct PromptBuilder {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `~/.config/weekender/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptBuilder {
    /// Create a prompt builder that checks `override_dir` before the embedded templates
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        let override_dir = override_dir.filter(|d| d.exists());
        debug!(?override_dir, "PromptBuilder::new: called");
        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a builder that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptBuilder::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{override_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptBuilder::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptBuilder::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptBuilder::load_template: not found in override directory");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptBuilder::load_template: using embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptBuilder::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// System instruction for a session over these preferences
    ///
    /// Deterministic: identical preferences render identical text.
    pub fn system_instruction(&self, prefs: &Preferences) -> Result<String> {
        debug!("PromptBuilder::system_instruction: called");
        let rendered = self.render("system", &SystemContext::from_preferences(prefs))?;
        info!(len = rendered.len(), "Rendered system instruction");
        Ok(rendered)
    }

    /// Structured replacement prompt for `day.activities[index]`
    pub fn replacement_prompt(&self, ctx: &ReplaceContext) -> Result<String> {
        debug!(day = %ctx.day, position = ctx.position, "PromptBuilder::replacement_prompt: called");
        self.render("replace", ctx)
    }

    /// System instruction for the structured replacement call
    pub fn replacement_system(&self) -> Result<String> {
        debug!("PromptBuilder::replacement_system: called");
        Ok(self.render("replace_system", &())?.trim().to_string())
    }

    /// Free-text chat message asking for an alternative
    pub fn alternative_message(&self, ctx: &AlternativeContext) -> Result<String> {
        debug!(day = %ctx.day, position = ctx.position, "PromptBuilder::alternative_message: called");
        Ok(self.render("alternative", ctx)?.trim().to_string())
    }
}
