//! Interactive chat mode
//!
//! A read-act-print loop over any [`Agent`]. `exit`/`quit` end the session,
//! `clear` wipes the agent's memory, anything else is sent as a task.

use std::borrow::Cow;
use std::io::Write;

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, Span, Suggestion,
};
use tracing::debug;

use ss_core::Agent;

const GOODBYE: &str = "Ending conversation...";
const CLEARED: &str = "Conversation history cleared.";

/// Commands offered for completion
const COMMANDS: &[(&str, &str)] = &[
    ("exit", "End the conversation"),
    ("quit", "End the conversation"),
    ("clear", "Clear conversation history"),
];

/// What a line of input asks for
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    Clear,
    Empty,
    /// Forwarded to the agent verbatim
    Task(&'a str),
}

/// Classify a line. Commands match case-insensitively after trimming.
pub fn parse_command(input: &str) -> Command<'_> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    match trimmed.to_lowercase().as_str() {
        "exit" | "quit" => Command::Exit,
        "clear" => Command::Clear,
        _ => Command::Task(input),
    }
}

/// Whether the loop keeps going after a line
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Act on one line of input, writing everything the user sees to `out`.
/// Agent errors are printed and do not end the session.
pub async fn handle_input<A, W>(agent: &mut A, input: &str, out: &mut W) -> std::io::Result<Flow>
where
    A: Agent + ?Sized,
    W: Write,
{
    match parse_command(input) {
        Command::Empty => Ok(Flow::Continue),
        Command::Exit => {
            writeln!(out, "{}", GOODBYE)?;
            Ok(Flow::Exit)
        }
        Command::Clear => {
            agent.clear_conversation_history();
            writeln!(out, "{}", CLEARED)?;
            Ok(Flow::Continue)
        }
        Command::Task(task) => {
            write!(out, "\nAssistant: ")?;
            out.flush()?;

            match agent.run(task).await {
                Ok(reply) => writeln!(out, "{}", reply)?,
                Err(e) => writeln!(out, "\nError: {}", e)?,
            }
            Ok(Flow::Continue)
        }
    }
}

/// Completes the built-in commands
#[derive(Clone, Default)]
struct CommandCompleter;

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let typed = line.trim_start().to_lowercase();
        if typed.is_empty() || typed.contains(' ') {
            return Vec::new();
        }

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(typed.as_str()))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: Span::new(0, pos),
                append_whitespace: false,
                style: None,
            })
            .collect()
    }
}

struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(self.style.paint("You: ").to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

fn keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

fn line_editor() -> Reedline {
    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40)),
    );
    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    Reedline::create()
        .with_completer(Box::new(CommandCompleter))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings())))
}

fn print_banner() {
    println!("\n===== Interactive MCP Chat =====");
    println!("Type 'exit' or 'quit' to end the conversation");
    println!("Type 'clear' to clear conversation history");
    println!("==================================\n");
}

/// Run the interactive loop until the user leaves. Ctrl-C abandons the
/// current line, Ctrl-D ends the session.
pub async fn run_repl<A: Agent + ?Sized>(agent: &mut A) -> anyhow::Result<()> {
    print_banner();

    let mut editor = line_editor();
    let prompt = ColoredPrompt::new();
    let mut stdout = std::io::stdout();

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if handle_input(agent, &line, &mut stdout).await? == Flow::Exit {
                    break;
                }
            }
            Ok(Signal::CtrlC) => {
                debug!("Input interrupted");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", GOODBYE);
                break;
            }
            Err(err) => {
                eprintln!("\nError: {}", err);
                break;
            }
        }
    }

    Ok(())
}
