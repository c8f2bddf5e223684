//! Interactive chat about one itinerary

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::display;
use crate::domain::Itinerary;
use crate::llm::Role;
use crate::planner::Planner;
use crate::session::ItinerarySession;
use crate::store::PlanStore;

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// A parsed `/alt` or `/swap` edit: zero-based indices plus the free-text wish
#[derive(Debug, PartialEq, Eq)]
pub struct EditArgs {
    pub day_index: usize,
    pub activity_index: usize,
    pub preference: String,
}

/// Parse `<day> <activity> [preference...]` with 1-based positions
pub fn parse_edit_args(args: &[&str]) -> Option<EditArgs> {
    let day: usize = args.first()?.parse().ok()?;
    let activity: usize = args.get(1)?.parse().ok()?;
    if day == 0 || activity == 0 {
        return None;
    }
    let preference = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
    Some(EditArgs {
        day_index: day - 1,
        activity_index: activity - 1,
        preference: if preference.is_empty() {
            "Suggest a different option that fits my preferences.".to_string()
        } else {
            preference
        },
    })
}

/// Chat REPL over one plan
pub struct ChatRepl<'a> {
    planner: &'a Planner,
    store: Arc<dyn PlanStore>,
    session: ItinerarySession,
    plan: Itinerary,
    plan_id: Option<String>,
    email: Option<String>,
    unsaved: bool,
}

impl<'a> ChatRepl<'a> {
    pub fn new(
        planner: &'a Planner,
        store: Arc<dyn PlanStore>,
        session: ItinerarySession,
        plan: Itinerary,
        plan_id: Option<String>,
        email: Option<String>,
    ) -> Self {
        let unsaved = plan_id.is_none();
        Self {
            planner,
            store,
            session,
            plan,
            plan_id,
            email,
            unsaved,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.send(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }

        if self.unsaved {
            println!("{}", "Plan has unsaved changes.".yellow());
        }
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Weekender Chat".bright_cyan().bold());
        display::print_itinerary(&self.plan);
        println!("Describe a change, or type {} for commands", "/help".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        debug!(%cmd, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return SlashResult::Quit,
            "/show" => display::print_itinerary(&self.plan),
            "/history" => self.print_history(),
            "/save" => self.save().await,
            "/alt" | "/swap" => match parse_edit_args(&parts[1..]) {
                Some(edit) if cmd == "/alt" => self.replace(edit).await,
                Some(edit) => self.replace_via_chat(edit).await,
                None => println!("Usage: {} <day> <activity> [what you want instead]", cmd.yellow()),
            },
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:28} Show this help", "/help".yellow());
        println!("  {:28} Show the current plan", "/show".yellow());
        println!("  {:28} Replace one activity (structured)", "/alt <day> <activity> [wish]".yellow());
        println!("  {:28} Replace one activity via chat", "/swap <day> <activity> [wish]".yellow());
        println!("  {:28} Save the plan", "/save".yellow());
        println!("  {:28} Show conversation history", "/history".yellow());
        println!("  {:28} Exit", "/quit".yellow());
        println!();
    }

    fn print_history(&self) {
        let history = self.session.history();
        if history.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }
        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in history.iter().enumerate() {
            let role = match msg.role {
                Role::User => "User".bright_green(),
                Role::Model => "Model".bright_blue(),
            };
            let preview: String = msg.text.chars().take(60).collect();
            let ellipsis = if msg.text.chars().count() > 60 { "..." } else { "" };
            println!("  {:>3} {}: {}{}", i + 1, role, preview, ellipsis);
        }
        println!();
    }

    fn accept(&mut self, plan: Itinerary) {
        self.plan = plan;
        self.unsaved = true;
        display::print_itinerary(&self.plan);
    }

    async fn send(&mut self, message: &str) {
        println!("{}", "Thinking...".dimmed());
        match self.planner.send_message(&mut self.session, &self.plan, message).await {
            Ok(plan) => self.accept(plan),
            Err(e) => println!("{} {}", "✗".red(), e.user_message()),
        }
    }

    async fn replace(&mut self, edit: EditArgs) {
        println!("{}", "Finding an alternative...".dimmed());
        match self
            .planner
            .replace_activity(&self.plan, edit.day_index, edit.activity_index, &edit.preference)
            .await
        {
            Ok(plan) => {
                println!("{} Activity has been replaced!", "✓".green());
                self.accept(plan);
            }
            Err(e) => println!("{} {}", "✗".red(), e.user_message()),
        }
    }

    async fn replace_via_chat(&mut self, edit: EditArgs) {
        println!("{}", "Asking for an alternative...".dimmed());
        match self
            .planner
            .replace_activity_via_chat(
                &mut self.session,
                &self.plan,
                edit.day_index,
                edit.activity_index,
                &edit.preference,
            )
            .await
        {
            Ok(plan) => self.accept(plan),
            Err(e) => println!("{} {}", "✗".red(), e.user_message()),
        }
    }

    async fn save(&mut self) {
        if !self.unsaved {
            println!("{}", "Nothing to save.".dimmed());
            return;
        }
        let result = match (&self.plan_id, &self.email) {
            (Some(id), _) => self.store.update(id, &self.plan).await,
            (None, Some(email)) => self.store.create(email, &self.plan).await,
            (None, None) => {
                println!("{} Start the chat with --email to save this plan", "✗".red());
                return;
            }
        };
        match result {
            Ok(saved) => {
                info!(id = %saved.id, "save: plan saved from chat");
                println!("{} Plan saved: {}", "✓".green(), saved.id.cyan());
                self.plan_id = Some(saved.id);
                self.unsaved = false;
            }
            Err(e) => println!("{} {}", "✗".red(), e.user_message()),
        }
    }
}
