//! Multi-step flow orchestration.
//!
//! A flow runs a list of prompt configurations in order over one engine
//! session, accumulating answers keyed by prompt name. Steps with a `when`
//! predicate are skipped when it returns false against the answers so far.
//! Cancellation anywhere aborts the whole flow: the terminal is restored
//! and no partial answers escape.

use tracing::debug;

use crate::engine::{Engine, SessionOptions};
use crate::error::{Error, Result};
use crate::prompts::{Answers, PromptConfig, PromptResult};
use crate::terminal::{StdTerminal, Terminal};

/// Conventional exit code for an interrupted interactive session
/// (128 + SIGINT). The library never exits the process itself; hosts that
/// catch [`Error::Cancelled`] can pass this to `std::process::exit`.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Run the steps in order on an already-constructed engine.
///
/// The session stays armed across steps so the terminal does not flicker
/// between prompts. The engine is stopped before returning, on every path.
pub fn run_flow<T: Terminal>(
    engine: &mut Engine<T>,
    steps: Vec<PromptConfig>,
) -> Result<Answers> {
    let mut answers = Answers::new();

    for step in steps {
        if !step.should_run(&answers) {
            debug!(name = step.name(), "step skipped");
            continue;
        }
        let PromptResult { name, value, cancelled } = match engine.run(step) {
            Ok(result) => result,
            Err(err) => {
                engine.stop()?;
                return Err(err);
            }
        };
        if cancelled {
            engine.stop()?;
            return Err(Error::Cancelled);
        }
        if let Some(value) = value {
            answers.insert(name, value);
        }
    }

    engine.stop()?;
    Ok(answers)
}

/// Ask a single prompt on the process's real terminal.
pub fn ask(config: impl Into<PromptConfig>) -> Result<PromptResult> {
    let mut engine = Engine::new(StdTerminal::new());
    let result = match engine.run(config.into()) {
        Ok(result) => result,
        Err(err) => {
            engine.stop()?;
            return Err(err);
        }
    };
    engine.stop()?;
    if result.cancelled {
        return Err(Error::Cancelled);
    }
    Ok(result)
}

/// Run a whole flow on the process's real terminal.
pub fn flow(steps: Vec<PromptConfig>) -> Result<Answers> {
    flow_with_options(steps, SessionOptions::default())
}

/// Like [`flow`], with explicit screen behavior.
pub fn flow_with_options(steps: Vec<PromptConfig>, options: SessionOptions) -> Result<Answers> {
    let mut engine = Engine::new(StdTerminal::new()).with_options(options);
    run_flow(&mut engine, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseCapabilities, StdinReader};
    use crate::prompts::{confirm, select, text, Answer, SelectOption};
    use crate::terminal::CaptureTerminal;

    #[test]
    fn test_should_run_consults_prior_answers() {
        let mut answers = Answers::new();
        let step: PromptConfig = text("token", "API token")
            .when(|a: &Answers| a.get("auth").and_then(Answer::as_bool) == Some(true))
            .into();

        assert!(!step.should_run(&answers));
        answers.insert("auth".into(), Answer::Bool(true));
        assert!(step.should_run(&answers));
    }

    #[test]
    fn test_steps_without_predicate_always_run() {
        let answers = Answers::new();
        let step: PromptConfig = confirm("ok", "Proceed?", true).into();
        assert!(step.should_run(&answers));
    }

    #[test]
    fn test_cancellation_mid_flow_aborts_and_restores_terminal() {
        let caps = MouseCapabilities {
            supports_sgr: true,
            supports_urxvt: true,
            supports_pixel: false,
            max_coordinates: u16::MAX,
        };
        let mut engine = Engine::with_capabilities(CaptureTerminal::new(), caps);
        // Enter submits the first step, Ctrl-C cancels the second.
        engine.set_reader(StdinReader::scripted(&[b"\r", b"\x03"]));

        let steps: Vec<PromptConfig> = vec![
            confirm("first", "First?", true).into(),
            confirm("second", "Second?", true).into(),
            confirm("third", "Third?", true).into(),
        ];
        let result = run_flow(&mut engine, steps);

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!engine.terminal().raw);
        assert_eq!(engine.terminal().count_of("\x1b[?1000l"), 1);
        let text = engine.terminal().text();
        assert!(text.contains("Second?"));
        assert!(!text.contains("Third?"));
    }

    #[test]
    fn test_step_names_key_the_answer_map() {
        let step: PromptConfig =
            select("fruit", "Pick", vec![SelectOption::new("a", "Apple")]).into();
        assert_eq!(step.name(), "fruit");
    }
}
