// Interactive session
// Line-oriented question/answer loop over any reader and writer


use std::io::{BufRead, Write};

use console::style;
use tracing::{error, info};

use crate::agent::{ChatCompletion, RagAgent};
use crate::retriever::{join_context, retrieve};
use crate::store::SimilaritySearch;
use crate::Result;

pub const PROMPT: &str = "Question: ";

/// What the loop does with one line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Skip,
    Ask(String),
}

impl Command {
    #[inline]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Skip
        } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            Self::Exit
        } else {
            Self::Ask(trimmed.to_string())
        }
    }
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub answered: usize,
    pub failed: usize,
}

/// Retrieve context for `query` and ask the agent about it
#[inline]
pub async fn answer_question<S, C>(
    query: &str,
    store: &S,
    agent: &RagAgent<C>,
    top_k: usize,
) -> Result<String>
where
    S: SimilaritySearch + ?Sized,
    C: ChatCompletion,
{
    let texts = retrieve(query, store, top_k).await?;
    let context = join_context(&texts);
    agent.answer(query, &context)
}

/// Run the prompt loop until `exit`, `quit` or end of input
///
/// A question that fails is reported and the loop keeps going. Only I/O
/// errors on `input` or `output` end the session early.
#[inline]
pub async fn run<R, W, S, C>(
    mut input: R,
    mut output: W,
    store: &S,
    agent: &RagAgent<C>,
    top_k: usize,
) -> Result<SessionSummary>
where
    R: BufRead,
    W: Write,
    S: SimilaritySearch + ?Sized,
    C: ChatCompletion,
{
    let mut summary = SessionSummary::default();
    let mut line = String::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let query = match Command::parse(&line) {
            Command::Exit => break,
            Command::Skip => continue,
            Command::Ask(query) => query,
        };

        match answer_question(&query, store, agent, top_k).await {
            Ok(answer) => {
                summary.answered += 1;
                writeln!(output, "\n{}\n{}\n", style("Answer:").green().bold(), answer)?;
            }
            Err(e) => {
                summary.failed += 1;
                error!("Failed to answer question: {}", e);
                writeln!(output, "\n{} {}\n", style("Error:").red().bold(), e)?;
            }
        }
    }

    info!(
        "Session ended: {} answered, {} failed",
        summary.answered, summary.failed
    );
    Ok(summary)
}
