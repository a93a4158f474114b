//! Driver protocol: s-expression messages in, responses and events out.

pub mod dispatch;
pub mod framing;

pub use dispatch::handle_message;
pub use framing::{encode, Framing, MessageBuffer};

use std::io::{self, Read, Write};

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::session::{RecentAnswers, Session};

/// Everything the dispatcher mutates for one input stream.
pub struct DriverState {
    pub session: Session,
    /// Latest `:time-ms` seen, used for status queries.
    pub last_time_ms: u64,
    /// Most recently confirmed answers, oldest first.
    pub answers: RecentAnswers,
    /// Log every message at debug level.
    pub ipc_trace: bool,
}

impl DriverState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
            last_time_ms: 0,
            answers: RecentAnswers::default(),
            ipc_trace: false,
        }
    }
}

/// Read messages from `input` until end of stream, dispatching each one and
/// writing its events and response to `output`.
pub fn run<R: Read, W: Write>(
    state: &mut DriverState,
    framing: Framing,
    mut input: R,
    mut output: W,
) -> anyhow::Result<()> {
    let mut buffer = MessageBuffer::new(framing);
    let mut chunk = [0u8; 4096];
    let mut processed: u64 = 0;

    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        buffer.push(&chunk[..n]);
        for msg in buffer.extract_messages() {
            process(state, framing, &msg, &mut output)?;
            processed += 1;
        }
    }

    if let Some(msg) = buffer.finish() {
        process(state, framing, &msg, &mut output)?;
        processed += 1;
    }
    if buffer.pending() > 0 {
        debug!(bytes = buffer.pending(), "discarding incomplete trailing message");
    }

    info!(
        messages = processed,
        answers = state.session.answers_given(),
        "input stream closed"
    );
    Ok(())
}

fn process<W: Write>(
    state: &mut DriverState,
    framing: Framing,
    msg: &str,
    output: &mut W,
) -> anyhow::Result<()> {
    if state.ipc_trace {
        debug!("<- {}", msg);
    }
    for reply in handle_message(state, msg) {
        if state.ipc_trace {
            debug!("-> {}", reply);
        }
        output.write_all(&encode(framing, &reply))?;
    }
    output.flush()?;
    Ok(())
}
