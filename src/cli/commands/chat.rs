//! Interactive chat command.
//!
//! Guided setup, optional account link, then a REPL that talks to the agent
//! directly instead of going through the message queue.

use crate::cli::output::waiting_dots;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Personas, Settings};
use crate::context::AppContext;
use crate::error::{ErrorKind, PokeError, Result};
use crate::integration::ConnectionPoller;
use crate::store::User;
use console::style;
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Inputs that end the session.
const QUIT_WORDS: &[&str] = &["quit", "exit", "q", "bye", "goodbye"];

/// Message sent to the agent when the session is interrupted.
const INTERRUPT_FAREWELL: &str = "The user pressed Ctrl+C to end the conversation";

/// Run the interactive chat command.
pub async fn run_chat(
    name: Option<String>,
    no_link: bool,
    model: Option<String>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    match preflight::check(Operation::Chat) {
        Ok(warnings) => warnings.iter().for_each(|w| Output::warning(w)),
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let mut session = ChatSession::new(AppContext::from_settings(settings)?);

    let user = session.setup_user(name).await?;
    let researched = if no_link {
        false
    } else {
        session.link_account(&user).await
    };

    println!("\n{}", style("=".repeat(50)).dim());
    if !researched {
        session.introduce(&user).await;
    }

    session.converse(&user).await?;
    Ok(())
}

/// State of one terminal chat session.
struct ChatSession {
    ctx: AppContext,
    input: Lines<BufReader<Stdin>>,
}

impl ChatSession {
    fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print a prompt and read one line. `None` on end of input.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{} ", prompt);
        std::io::stdout().flush()?;
        Ok(self.input.next_line().await?.map(|line| line.trim().to_string()))
    }

    /// Create the session user, asking for a name unless one was given.
    async fn setup_user(&mut self, name: Option<String>) -> Result<User> {
        println!("\n{}", style("=".repeat(50)).dim());
        println!("{}", style("Welcome to Poke!").bold().cyan());
        println!("{}", style("=".repeat(50)).dim());

        let name = match name {
            Some(name) => name,
            None => {
                Output::agent_message("I'm your personal AI assistant. Let me get to know you better!")
                    .await;
                self.read_line("\nWhat's your name?").await?.unwrap_or_default()
            }
        };
        let name = if name.trim().is_empty() {
            None
        } else {
            Some(name.trim().to_string())
        };

        let user = self.ctx.records.create_user(None, name);
        debug!("Created chat user {}", user.user_id);
        Output::agent_message(&format!("Great to meet you, {}!", user.display_name())).await;
        Ok(user)
    }

    /// Link an external account and run the research greeting once it is
    /// active. Returns whether the greeting was shown.
    async fn link_account(&self, user: &User) -> bool {
        match self.try_link_account(user).await {
            Ok(researched) => researched,
            Err(e) => {
                Output::error("Error setting up the account link. Please try again later.");
                report(&e);
                false
            }
        }
    }

    async fn try_link_account(&self, user: &User) -> Result<bool> {
        let settings = &self.ctx.settings.integration;

        println!("\n{}", style("=".repeat(50)).dim());
        Output::info("Would you like to connect your Gmail for enhanced features?");

        let request = self
            .ctx
            .integrations
            .initiate_connection(&user.user_id, settings.auth_config_id.as_deref())
            .await?;

        Output::info("Please visit this URL to authorize access:");
        println!(
            "   {}",
            request.redirect_url.as_deref().unwrap_or("(no redirect URL returned)")
        );
        println!();

        let spinner = Output::spinner("Waiting for you to complete the authorization...");
        let poller = ConnectionPoller::new(
            self.ctx.integrations.as_ref(),
            settings.poll_interval(),
            settings.max_poll_attempts,
        );
        let outcome = poller
            .wait(&request.connection_id, |attempt| {
                spinner.set_message(format!("Still waiting{}", waiting_dots(attempt)));
            })
            .await;
        spinner.finish_and_clear();

        if let Err(e) = outcome?.into_result() {
            match e.kind() {
                ErrorKind::Timeout => Output::warning("Connection timeout. You can try again later."),
                _ => Output::error("Connection failed."),
            }
            report(&e);
            return Ok(false);
        }

        Output::success("Gmail connected successfully!");

        let greeting = render(&self.ctx.personas.link_greeting, "name", user.display_name());
        let spinner = Output::spinner("Let me learn about you... analyzing your emails and searching online");
        let result = self.ctx.agent.process(&user.user_id, &greeting).await;
        spinner.finish_and_clear();

        let findings = result?;
        Output::info("Here's what I discovered about you:");
        Output::agent_message(&findings).await;
        Ok(true)
    }

    /// Proactive greeting for sessions without research.
    async fn introduce(&self, user: &User) {
        let prompt = render(&self.ctx.personas.introduction, "name", user.display_name());
        match self.ctx.agent.process(&user.user_id, &prompt).await {
            Ok(intro) => Output::agent_message(&intro).await,
            Err(e) => {
                Output::error("Poke couldn't introduce itself. Say hi anyway!");
                report(&e);
            }
        }
    }

    /// REPL until a quit word, end of input or Ctrl+C.
    async fn converse(&mut self, user: &User) -> Result<()> {
        loop {
            let prompt = format!("\n{}", style("You:").green().bold());
            let line = unless_interrupted(self.read_line(&prompt), tokio::signal::ctrl_c()).await;
            let Some(line) = line else {
                println!();
                self.farewell(user, INTERRUPT_FAREWELL).await;
                return Ok(());
            };

            let Some(input) = line? else {
                println!();
                Output::info("See you later!");
                return Ok(());
            };

            if input.is_empty() {
                continue;
            }

            if is_quit_word(&input) {
                let message = render(&self.ctx.personas.farewell, "input", &input);
                self.farewell(user, &message).await;
                return Ok(());
            }

            if input == "/info" {
                self.show_info(user);
                continue;
            }

            let spinner = Output::spinner("typing...");
            let result = unless_interrupted(
                self.ctx.agent.process(&user.user_id, &input),
                tokio::signal::ctrl_c(),
            )
            .await;
            spinner.finish_and_clear();

            let Some(result) = result else {
                println!();
                self.farewell(user, INTERRUPT_FAREWELL).await;
                return Ok(());
            };

            match result {
                Ok(reply) => {
                    self.ctx.records.record_exchange(&user.user_id, &input, &reply);
                    Output::agent_message(&reply).await;
                }
                Err(e) => {
                    Output::error("Something went wrong. Please try again.");
                    report(&e);
                }
            }
        }
    }

    async fn farewell(&self, user: &User, message: &str) {
        match self.ctx.agent.process(&user.user_id, message).await {
            Ok(reply) => Output::agent_message(&reply).await,
            Err(_) => Output::info("See you later!"),
        }
    }

    fn show_info(&self, user: &User) {
        let Some(user) = self.ctx.records.get_user(&user.user_id) else {
            Output::error("User not found");
            return;
        };
        let memory = self.ctx.records.memory(&user.user_id);

        Output::header("User Information");
        Output::kv("ID", &user.user_id);
        Output::kv("Name", user.display_name());
        Output::kv("Created", &user.created_at.to_rfc3339());

        Output::header("Memory");
        Output::kv(
            "Conversation history",
            &format!("{} messages", memory.conversation_history.len()),
        );
    }
}

/// Run `work` unless `interrupt` resolves first.
async fn unless_interrupted<T, I>(work: impl Future<Output = T>, interrupt: I) -> Option<T>
where
    I: Future,
{
    tokio::select! {
        value = work => Some(value),
        _ = interrupt => None,
    }
}

fn is_quit_word(input: &str) -> bool {
    let input = input.to_lowercase();
    QUIT_WORDS.contains(&input.as_str())
}

fn render(template: &str, key: &str, value: &str) -> String {
    let vars = HashMap::from([(key, value)]);
    Personas::render(template, &vars)
}

/// Print the error kind only; the full error goes to the log.
fn report(error: &PokeError) {
    debug!("Chat error: {}", error);
    Output::debug_info(&error.kind().to_string());
}
