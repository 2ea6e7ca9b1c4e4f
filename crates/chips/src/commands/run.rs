//! Run command implementation.
//!
//! Drives a filter engine from line commands, read interactively from stdin
//! or from a script file. Each line is one command:
//!
//! ```text
//! option <text>      type into the option field
//! select <text>      pick the best matching option from the list
//! value [text]       type into the value field (empty clears it)
//! suggest            list candidates for the typed value
//! add | keep         commit the draft (keep stays in edit mode)
//! edit <n>           edit chip n (tags toggle instead)
//! remove <n>         remove chip n with its group
//! toggle <n>         cycle the qualifier of chip n
//! toggle-draft       cycle the draft qualifier
//! cancel             leave edit mode
//! popup open|close   report the option popup state
//! blur               report that an input lost focus
//! focus in|out       report whether focus is inside the widget
//! tick [n]           run deferred work n times (default 1)
//! list | options     show the state or the selectable options
//! search             emit the committed items as JSON
//! quit
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::Path;

use chips_filter_rs::{Catalog, EngineConfig, EngineEvent, FilterEngine, ItemKey, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, trace};

use super::config::load_config;
use super::{CommandContext, CommandError, Result};
use crate::output::{
    format_search_json, format_state_json, format_state_table, format_suggestions_json,
};

/// One parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Option(String),
    Select(String),
    Value(Option<String>),
    Suggest,
    Add { keep_editing: bool },
    Edit(usize),
    Remove(usize),
    Toggle(usize),
    ToggleDraft,
    Cancel,
    Popup(bool),
    Blur,
    Focus(bool),
    Tick(usize),
    List,
    Options,
    Search,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses a line. Returns `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "option" | "o" => Self::Option(rest.to_string()),
            "select" | "s" => Self::Select(rest.to_string()),
            "value" | "v" => Self::Value((!rest.is_empty()).then(|| rest.to_string())),
            "suggest" => Self::Suggest,
            "add" | "a" => Self::Add {
                keep_editing: false,
            },
            "keep" => Self::Add { keep_editing: true },
            "edit" | "e" => Self::Edit(parse_position(rest)?),
            "remove" | "rm" => Self::Remove(parse_position(rest)?),
            "toggle" | "t" => Self::Toggle(parse_position(rest)?),
            "toggle-draft" => Self::ToggleDraft,
            "cancel" => Self::Cancel,
            "popup" => Self::Popup(parse_switch(rest, "open", "close")?),
            "blur" => Self::Blur,
            "focus" => Self::Focus(parse_switch(rest, "in", "out")?),
            "tick" => Self::Tick(if rest.is_empty() {
                1
            } else {
                rest.parse()
                    .map_err(|_| format!("expected a tick count, got '{rest}'"))?
            }),
            "list" | "ls" => Self::List,
            "options" => Self::Options,
            "search" => Self::Search,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command '{other}' (try 'help')")),
        };

        Ok(Some(command))
    }
}

/// Parses a 1-based chip number.
fn parse_position(text: &str) -> std::result::Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a chip number, got '{text}'")),
    }
}

fn parse_switch(text: &str, on: &str, off: &str) -> std::result::Result<bool, String> {
    match text {
        t if t.eq_ignore_ascii_case(on) => Ok(true),
        t if t.eq_ignore_ascii_case(off) => Ok(false),
        _ => Err(format!("expected '{on}' or '{off}', got '{text}'")),
    }
}

/// What to show after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    State,
    Options,
    Suggestions,
    Help,
    Silent,
    Quit,
}

/// A filter engine plus the bookkeeping a terminal host needs.
pub struct Session {
    engine: FilterEngine,
}

impl Session {
    pub fn new(catalog: Catalog, config: &EngineConfig) -> Self {
        Self {
            engine: FilterEngine::with_config(catalog.options, catalog.items, config),
        }
    }

    fn item_key(&self, position: usize) -> std::result::Result<ItemKey, String> {
        position
            .checked_sub(1)
            .and_then(|index| self.engine.items().get(index))
            .map(|item| item.key())
            .ok_or_else(|| format!("no chip #{position}"))
    }

    /// Applies one command to the engine.
    ///
    /// Errors are user-facing messages; the engine state is unchanged when
    /// one is returned.
    pub async fn apply(&mut self, command: SessionCommand) -> std::result::Result<Reply, String> {
        trace!(?command, "applying session command");

        match command {
            SessionCommand::Option(text) => self.engine.set_option_text(text),
            SessionCommand::Select(text) => {
                let option = self
                    .engine
                    .select_option_text(&text)
                    .ok_or_else(|| "no options are selectable".to_string())?;
                debug!(text = %text, option = %option.title, "option selected");
            }
            SessionCommand::Value(text) => {
                let request = self.engine.set_value(text.map(Value::text));
                let outcome = request.run().await;
                self.engine.complete_validation(&outcome);
            }
            SessionCommand::Suggest => {
                let request = self
                    .engine
                    .suggestions_request()
                    .ok_or_else(|| "the draft option has no value list".to_string())?;
                let outcome = request.run().await;
                self.engine.complete_suggestions(&outcome);
                return Ok(Reply::Suggestions);
            }
            SessionCommand::Add { keep_editing } => self.engine.add(keep_editing),
            SessionCommand::Edit(n) => {
                let key = self.item_key(n)?;
                if !self.engine.edit(key) {
                    return Err(format!("chip #{n} cannot be edited"));
                }
            }
            SessionCommand::Remove(n) => {
                let key = self.item_key(n)?;
                self.engine.remove(key);
            }
            SessionCommand::Toggle(n) => {
                let key = self.item_key(n)?;
                if !self.engine.toggle_qualifier(key) {
                    return Err(format!("chip #{n} has no qualifier to toggle"));
                }
            }
            SessionCommand::ToggleDraft => {
                if !self.engine.toggle_draft_qualifier() {
                    return Err("the draft has no qualifier to toggle".to_string());
                }
            }
            SessionCommand::Cancel => self.engine.cancel(true),
            SessionCommand::Popup(open) => self.engine.toggle_popup(open),
            SessionCommand::Blur => self.engine.blur(),
            SessionCommand::Focus(inside) => self.engine.set_focus_within(inside),
            SessionCommand::Tick(n) => {
                for _ in 0..n {
                    self.engine.tick();
                }
            }
            SessionCommand::List => {}
            SessionCommand::Options => return Ok(Reply::Options),
            SessionCommand::Search => {
                self.engine.request_search();
                return Ok(Reply::Silent);
            }
            SessionCommand::Help => return Ok(Reply::Help),
            SessionCommand::Quit => return Ok(Reply::Quit),
        }

        Ok(Reply::State)
    }

    /// Parses and applies one line, then prints its results.
    async fn run_line(
        &mut self,
        ctx: &CommandContext,
        line: &str,
    ) -> std::result::Result<Reply, String> {
        let Some(command) = SessionCommand::parse(line)? else {
            return Ok(Reply::Silent);
        };

        let reply = self.apply(command).await?;
        self.print_events(ctx).map_err(|e| e.to_string())?;
        self.print_reply(ctx, reply).map_err(|e| e.to_string())?;
        Ok(reply)
    }

    fn print_events(&mut self, ctx: &CommandContext) -> Result<()> {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::SearchRequested(items) => {
                    println!("{}", format_search_json(&items)?);
                }
                EngineEvent::ItemsChanged(items) => {
                    debug!(count = items.len(), "items changed");
                }
                EngineEvent::FocusRequested(target) => {
                    if ctx.verbose {
                        eprintln!("focus -> {target:?}");
                    }
                }
            }
        }
        Ok(())
    }

    fn print_reply(&self, ctx: &CommandContext, reply: Reply) -> Result<()> {
        if ctx.quiet {
            return Ok(());
        }

        match reply {
            Reply::State if ctx.json_output => println!("{}", format_state_json(&self.engine)?),
            Reply::State => print!("{}", format_state_table(&self.engine, ctx.use_colors)),
            Reply::Options => {
                for (index, option) in self.engine.filtered_options().iter().enumerate() {
                    println!("{:>3}  {}", index + 1, option.title);
                }
            }
            Reply::Suggestions if ctx.json_output => {
                println!("{}", format_suggestions_json(self.engine.suggestions())?);
            }
            Reply::Suggestions => {
                for value in self.engine.suggestions() {
                    println!("  {}", self.engine.format_value(Some(value)));
                }
            }
            Reply::Help => println!("{}", HELP),
            Reply::Silent | Reply::Quit => {}
        }
        Ok(())
    }
}

const HELP: &str = "commands: option <text>, select <text>, value [text], suggest, add, keep, \
edit <n>, remove <n>, toggle <n>, toggle-draft, cancel, popup open|close, blur, \
focus in|out, tick [n], list, options, search, quit";

/// Executes the run command.
pub async fn execute(
    ctx: &CommandContext,
    catalog: Option<&Path>,
    script: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let path = catalog
        .map(Path::to_path_buf)
        .or_else(|| config.default_catalog.clone())
        .ok_or_else(|| {
            CommandError::Config(
                "no catalog given; pass --catalog or set default_catalog".to_string(),
            )
        })?;

    let catalog = Catalog::from_path(&path)?;
    debug!(path = %path.display(), options = catalog.options.len(), "starting session");
    let mut session = Session::new(catalog, &config.engine);

    match script {
        Some(script) => {
            let content = tokio::fs::read_to_string(script).await?;
            for (index, line) in content.lines().enumerate() {
                let reply = session
                    .run_line(ctx, line)
                    .await
                    .map_err(|message| CommandError::Script {
                        line: index + 1,
                        message,
                    })?;
                if reply == Reply::Quit {
                    break;
                }
            }
        }
        None => {
            session.print_reply(ctx, Reply::State)?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                match session.run_line(ctx, &line).await {
                    Ok(Reply::Quit) => break,
                    Ok(_) => {}
                    Err(message) => eprintln!("Error: {message}"),
                }
            }
        }
    }

    Ok(())
}
