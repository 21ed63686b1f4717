//! Line-oriented command console.
//!
//! The console owns a storage instance and never learns which backend it is.
//! Command output goes to the writer passed in; storage failures are shown
//! as `** <error> **` and do not stop the loop.

mod commands;
mod error;
mod parser;


use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::storage::Storage;
use parser::{Line, parse_line};

pub use error::{ConsoleError, ConsoleResult};
pub use parser::{parse_param, parse_value, tokenize};

pub const PROMPT: &str = "(hbnb) ";

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<S: Storage> {
    storage: S,
    prompt: bool,
}

impl<S: Storage> Console<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            prompt: false,
        }
    }

    /// Print the prompt before every line (interactive sessions).
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Execute one line.
    pub async fn onecmd<W: Write>(&mut self, line: &str, out: &mut W) -> ConsoleResult<Flow> {
        match self.dispatch(line, out).await {
            Err(ConsoleError::Storage(e)) => {
                debug!(error = ?e, "Command failed");
                writeln!(out, "** {} **", e)?;
                Ok(Flow::Continue)
            }
            other => other,
        }
    }

    async fn dispatch<W: Write>(&mut self, line: &str, out: &mut W) -> ConsoleResult<Flow> {
        let storage = &mut self.storage;
        let (name, args) = match parse_line(line) {
            Some(Line::Empty) => return Ok(Flow::Continue),
            Some(Line::UpdateFromJson { class, id, json }) => {
                commands::update_from_json(storage, &class, &id, &json, out).await?;
                return Ok(Flow::Continue);
            }
            Some(Line::Command { name, args }) => (name, args),
            None => {
                writeln!(out, "*** Unknown syntax: {}", line.trim())?;
                return Ok(Flow::Continue);
            }
        };

        match name.as_str() {
            "create" => commands::create(storage, &args, out).await?,
            "show" => commands::show(storage, &args, out).await?,
            "destroy" => commands::destroy(storage, &args, out).await?,
            "all" => commands::all(storage, &args, out).await?,
            "count" => commands::count(storage, &args, out).await?,
            "update" => commands::update(storage, &args, out).await?,
            "help" => commands::help(&args, out)?,
            "quit" | "EOF" => return Ok(Flow::Quit),
            _ => writeln!(out, "*** Unknown syntax: {}", line.trim())?,
        }
        Ok(Flow::Continue)
    }

    /// Read and execute lines until `quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> ConsoleResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(out, "{}", PROMPT)?;
                out.flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                if self.prompt {
                    writeln!(out)?;
                }
                return Ok(());
            };

            if self.onecmd(&line, out).await? == Flow::Quit {
                return Ok(());
            }
        }
    }
}
