use crate::components::gemini::{ModelReply, ModelSession};
use crate::components::google_calendar::CalendarApi;
use crate::error::AgentResult;
use crate::functions::FunctionRegistry;
use inquire::{Confirm, InquireError, Text};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bound on function-call rounds within one user turn, so a model that
/// keeps proposing calls cannot loop forever
const MAX_FUNCTION_ROUNDS: usize = 8;

/// Driver states; transitions are logged at debug level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    AwaitingInput,
    AwaitingModel,
    AwaitingConfirmation,
    Executing,
    Idle,
}

/// Console seam between the driver and the terminal
///
/// Flow tests script input and confirmations and capture output
/// through this trait.
pub trait Console {
    /// Next line of user input; `None` means end-of-input
    fn read_input(&mut self) -> AgentResult<Option<String>>;
    /// Show a proposed action and ask for a yes/no confirmation
    fn confirm(&mut self, proposal: &str) -> AgentResult<bool>;
    /// Show text to the user
    fn reply(&mut self, text: &str);
}

/// Interactive console backed by inquire prompts
#[derive(Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_input(&mut self) -> AgentResult<Option<String>> {
        match Text::new("You:").prompt() {
            Ok(line) => Ok(Some(line)),
            // Esc / ctrl-c / ctrl-d all end the session cleanly
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn confirm(&mut self, proposal: &str) -> AgentResult<bool> {
        println!("\n{}", proposal);
        match Confirm::new("Confirm action?").with_default(true).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn reply(&mut self, text: &str) {
        println!("\n{}", text);
    }
}

/// Read-evaluate-print driver wiring the model session, the function
/// registry and the calendar together
pub struct Repl<C: Console> {
    session: ModelSession,
    registry: FunctionRegistry,
    calendar: Arc<dyn CalendarApi>,
    console: C,
    state: ReplState,
}

impl<C: Console> Repl<C> {
    pub fn new(
        session: ModelSession,
        registry: FunctionRegistry,
        calendar: Arc<dyn CalendarApi>,
        console: C,
    ) -> Self {
        Self {
            session,
            registry,
            calendar,
            console,
            state: ReplState::Idle,
        }
    }

    /// Run until explicit quit or end-of-input
    ///
    /// Remote failures (model or calendar) are reported as text and the
    /// loop keeps accepting input; only console failures end the run.
    pub async fn run(&mut self) -> AgentResult<()> {
        loop {
            self.transition(ReplState::AwaitingInput);
            let Some(line) = self.console.read_input()? else {
                self.console.reply("Agent: Goodbye!");
                return Ok(());
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                self.console.reply("Agent: Goodbye!");
                return Ok(());
            }

            self.handle_turn(input).await?;
        }
    }

    async fn handle_turn(&mut self, input: &str) -> AgentResult<()> {
        self.transition(ReplState::AwaitingModel);
        let mut reply = match self.session.send_user(input).await {
            Ok(reply) => reply,
            Err(e) => {
                self.console.reply(&format!("An error occurred: {}", e));
                return Ok(());
            }
        };

        let mut rounds = 0;
        loop {
            match reply {
                ModelReply::Text(text) => {
                    self.transition(ReplState::Idle);
                    if !text.is_empty() {
                        self.console.reply(&format!("Agent: {}", text));
                    }
                    return Ok(());
                }
                ModelReply::FunctionCall { name, args } => {
                    rounds += 1;
                    if rounds > MAX_FUNCTION_ROUNDS {
                        warn!(rounds, "Function-call round limit reached");
                        // The pending call still needs a response turn in the
                        // history or later requests in this session get rejected.
                        self.session.record_function_result(
                            &name,
                            "Aborted: too many function calls in one turn.",
                        );
                        self.console
                            .reply("Agent: Too many function calls in one turn; giving up.");
                        return Ok(());
                    }

                    let result = self.handle_proposal(&name, &args).await?;
                    reply = match self.session.send_function_result(&name, &result).await {
                        Ok(reply) => reply,
                        Err(e) => {
                            self.console.reply(&format!("An error occurred: {}", e));
                            return Ok(());
                        }
                    };
                }
            }
        }
    }

    /// Validate, confirm and execute one proposal
    ///
    /// Always produces the result string fed back to the model: the
    /// operation's output, a cancellation note, or the error verbatim.
    async fn handle_proposal(&mut self, name: &str, args: &Value) -> AgentResult<String> {
        let call = match self.registry.parse(name, args) {
            Ok(call) => call,
            Err(e) => {
                warn!(function = name, "Rejected function proposal: {}", e);
                return Ok(format!("{}", e));
            }
        };

        if call.is_mutating() {
            self.transition(ReplState::AwaitingConfirmation);
            let proposal = call.confirmation_text().unwrap_or_default();
            if !self.console.confirm(&proposal)? {
                debug!(function = call.name(), "User declined proposal");
                return Ok("Action cancelled by user.".to_string());
            }
        }

        self.transition(ReplState::Executing);
        match self.registry.execute(&call, self.calendar.as_ref()).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(function = call.name(), "Function execution failed: {}", e);
                Ok(format!("{}", e))
            }
        }
    }

    fn transition(&mut self, next: ReplState) {
        debug!(from = ?self.state, to = ?next, "REPL state");
        self.state = next;
    }
}
