// src/manager/worker.rs

//! Supervising task for one worker process.
//!
//! The task emits the `Starting run` marker, spawns the worker, tees both of
//! its output streams through an [`InterceptedWriter`] and waits for the
//! process. The stream readers then get [`OUTPUT_DRAIN_GRACE`] to reach EOF;
//! a reader still blocked after that (a background child of the worker kept
//! the pipe open) is aborted. Only then is `Completed run` emitted and the
//! exit recorded, so anyone who observes the exit finds every event of the
//! run already in the channel.

use std::io::Write;
use std::process::ExitStatus;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::WorkerCommand;
use crate::errors::Result;
use crate::events::{EventSender, InterceptedWriter};
use crate::types::{COMPLETED_RUN, RunId, STARTING_RUN};

/// How long the stream readers may keep running after the worker exited.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Terminal outcome of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, negated signal number on Unix, or `None` if the worker
    /// never ran.
    pub code: Option<i32>,
}

impl WorkerExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Handle on a running (or finished) worker.
#[derive(Debug)]
pub struct WorkerHandle {
    exit: Arc<OnceLock<WorkerExit>>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn the supervising task on the current Tokio runtime.
    ///
    /// `command` is the already-resolved worker description; a resolution
    /// error is reported through the event channel like any other failure
    /// of the run.
    pub fn spawn(
        run_id: RunId,
        command: Result<WorkerCommand>,
        events: EventSender,
        mirror_output: bool,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("starting a worker requires a Tokio runtime")?;

        let exit = Arc::new(OnceLock::new());
        let exit_slot = Arc::clone(&exit);

        let task = runtime.spawn(async move {
            let outcome = supervise(&run_id, command, &events, mirror_output).await;
            info!(
                run_id = %run_id,
                exit_code = ?outcome.code,
                success = outcome.success(),
                "worker finished"
            );
            let _ = exit_slot.set(outcome);
        });

        Ok(Self { exit, task })
    }

    /// The recorded exit, once the worker is done.
    ///
    /// A supervising task that died without recording one (it panicked)
    /// counts as finished with no exit code.
    pub fn exit(&self) -> Option<WorkerExit> {
        match self.exit.get() {
            Some(exit) => Some(*exit),
            None if self.task.is_finished() => Some(WorkerExit { code: None }),
            None => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.exit().is_none()
    }
}

async fn supervise(
    run_id: &RunId,
    command: Result<WorkerCommand>,
    events: &EventSender,
    mirror_output: bool,
) -> WorkerExit {
    events.send(STARTING_RUN);

    let code = match run_worker_process(run_id, command, events, mirror_output).await {
        Ok(code) => code,
        Err(err) => {
            error!(run_id = %run_id, error = %err, "worker could not be started");
            events.send(format!("Failed to start worker: {err}"));
            None
        }
    };

    events.send(COMPLETED_RUN);
    WorkerExit { code }
}

async fn run_worker_process(
    run_id: &RunId,
    command: Result<WorkerCommand>,
    events: &EventSender,
    mirror_output: bool,
) -> Result<Option<i32>> {
    let command = command?;
    debug!(run_id = %run_id, program = %command.program, args = ?command.args, "spawning worker");

    let mut child = command
        .to_command()
        .spawn()
        .with_context(|| format!("spawning worker process '{}'", command.program))?;

    info!(run_id = %run_id, pid = ?child.id(), "worker process started");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_pump = stdout.map(|out| {
        let tee = InterceptedWriter::new(Vec::new(), events.clone());
        let local = local_stream(mirror_output, Stream::Stdout);
        tokio::spawn(pump_lines(out, tee, local, run_id.clone(), Stream::Stdout))
    });
    let stderr_pump = stderr.map(|err| {
        let tee = InterceptedWriter::new(Vec::new(), events.clone());
        let local = local_stream(mirror_output, Stream::Stderr);
        tokio::spawn(pump_lines(err, tee, local, run_id.clone(), Stream::Stderr))
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for worker of run {run_id}"))?;

    for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
        drain_or_abort(pump, run_id).await;
    }

    Ok(exit_code(status))
}

/// Wait up to [`OUTPUT_DRAIN_GRACE`] for a stream reader, then cancel it.
///
/// The aborted task is awaited, so it cannot emit anything after this
/// returns.
async fn drain_or_abort(mut pump: JoinHandle<()>, run_id: &RunId) {
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut pump).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(run_id = %run_id, error = %e, "output reader task failed"),
        Err(_) => {
            warn!(
                run_id = %run_id,
                grace = ?OUTPUT_DRAIN_GRACE,
                "worker exited but its output is still open; dropping the rest"
            );
            pump.abort();
            let _ = pump.await;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

type LocalStream = Box<dyn AsyncWrite + Send + Unpin>;

fn local_stream(mirror_output: bool, stream: Stream) -> Option<LocalStream> {
    match (mirror_output, stream) {
        (false, _) => None,
        (true, Stream::Stdout) => Some(Box::new(tokio::io::stdout())),
        (true, Stream::Stderr) => Some(Box::new(tokio::io::stderr())),
    }
}

/// Copy one worker stream line by line through the tee until EOF.
///
/// The tee buffers into memory; whatever it forwarded is then written to the
/// local stream asynchronously, so a slow terminal never blocks a runtime
/// thread.
async fn pump_lines<R>(
    reader: R,
    mut tee: InterceptedWriter<Vec<u8>>,
    mut local: Option<LocalStream>,
    run_id: RunId,
    stream: Stream,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                // Writing into a Vec cannot fail; the event is queued here.
                let _ = tee.write_all(&line);
                let forwarded = std::mem::take(tee.get_mut());
                if let Some(out) = local.as_mut() {
                    if let Err(e) = out.write_all(&forwarded).await {
                        warn!(run_id = %run_id, stream = stream.name(), error = %e, "could not mirror worker output locally");
                        local = None;
                    }
                }
            }
            Err(e) => {
                warn!(run_id = %run_id, stream = stream.name(), error = %e, "error reading worker output");
                break;
            }
        }
    }

    let _ = tee.into_inner();
    if let Some(mut out) = local {
        let _ = out.flush().await;
    }
    debug!(run_id = %run_id, stream = stream.name(), "worker stream closed");
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|sig| -sig))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}

