//! # Command Dispatcher
//!
//! Validates requests on the caller, runs them on a bounded worker pool,
//! and delivers exactly one [`Outcome`] per request.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      dispatch(name, args)                               │
//! │                                                                         │
//! │  CALLING CONTEXT (never blocks)                                         │
//! │  ──────────────────────────────                                         │
//! │   name known? ── no ──► Ticket::ready(NotImplemented(name))             │
//! │       │ yes                                                             │
//! │   args valid? ── no ──► Ticket::ready(Error(INVALID_ARGUMENT))          │
//! │       │ yes                                                             │
//! │   runtime.spawn(worker) ──► Ticket::pending(oneshot rx)                 │
//! │                                                                         │
//! │  WORKER                                                                 │
//! │  ──────                                                                 │
//! │   acquire permit (Semaphore, max_concurrent)                            │
//! │       │                                                                 │
//! │   tokio::spawn(handler.handle(cmd)) ── panic ──► Error(failure_kind)    │
//! │       │ ok                                                              │
//! │   deliver(Outcome) ──► oneshot tx / callback                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No ordering between concurrently dispatched commands and no
//! cancellation: once spawned, a command runs to completion.

use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify, Semaphore};
use tracing::{debug, error, info, warn};

use posbridge_core::{
    Command, CommandArgs, CommandError, CommandName, CommandResult, Outcome, Payload,
};

/// Executes validated commands.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn handle(&self, command: Command) -> CommandResult<Payload>;
}

// =============================================================================
// Ticket
// =============================================================================

enum TicketState {
    Ready(Outcome),
    Pending {
        name: CommandName,
        rx: oneshot::Receiver<Outcome>,
    },
}

/// Claim on the outcome of one dispatched command.
pub struct Ticket {
    state: TicketState,
}

impl Ticket {
    fn ready(outcome: Outcome) -> Self {
        Ticket {
            state: TicketState::Ready(outcome),
        }
    }

    /// True when the outcome was decided on the calling context
    /// (unknown command or invalid arguments).
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TicketState::Ready(_))
    }

    /// Waits for the outcome.
    pub async fn outcome(self) -> Outcome {
        match self.state {
            TicketState::Ready(outcome) => outcome,
            TicketState::Pending { name, rx } => rx.await.unwrap_or_else(|_| lost(name)),
        }
    }

    /// Blocks the current thread until the outcome arrives.
    ///
    /// For callers outside the runtime; panics if called from async code.
    pub fn blocking_outcome(self) -> Outcome {
        match self.state {
            TicketState::Ready(outcome) => outcome,
            TicketState::Pending { name, rx } => rx.blocking_recv().unwrap_or_else(|_| lost(name)),
        }
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            TicketState::Ready(outcome) => f.debug_tuple("Ticket::Ready").field(outcome).finish(),
            TicketState::Pending { name, .. } => {
                f.debug_tuple("Ticket::Pending").field(name).finish()
            }
        }
    }
}

/// The worker went away without reporting (runtime shut down).
fn lost(name: CommandName) -> Outcome {
    Outcome::Error(CommandError::new(
        name.failure_kind(),
        format!("{} did not complete: worker stopped", name),
    ))
}

// =============================================================================
// Dispatcher
// =============================================================================

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Command dispatcher backed by a bounded worker pool.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn CommandHandler>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: Arc<InFlight>,
    runtime: Handle,
}

impl Dispatcher {
    /// Creates a dispatcher whose workers run on `runtime`.
    pub fn new(handler: Arc<dyn CommandHandler>, max_concurrent: usize, runtime: Handle) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Dispatcher {
            handler,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(InFlight::default()),
            runtime,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Commands spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Dispatches a command; the outcome arrives through the returned
    /// [`Ticket`].
    pub fn dispatch(&self, name: &str, args: &CommandArgs) -> Ticket {
        match prepare(name, args) {
            Err(outcome) => Ticket::ready(outcome),
            Ok(command) => {
                let name = command.name();
                let (tx, rx) = oneshot::channel();
                self.spawn_worker(command, move |outcome| {
                    // The caller may have dropped its ticket.
                    let _ = tx.send(outcome);
                });
                Ticket {
                    state: TicketState::Pending { name, rx },
                }
            }
        }
    }

    /// Dispatches a command and hands the outcome to `callback`.
    ///
    /// Outcomes decided on the calling context invoke `callback` before
    /// this returns; the rest invoke it on a worker.
    pub fn dispatch_with<F>(&self, name: &str, args: &CommandArgs, callback: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        match prepare(name, args) {
            Err(outcome) => callback(outcome),
            Ok(command) => self.spawn_worker(command, callback),
        }
    }

    /// Waits until no command is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn spawn_worker<F>(&self, command: Command, deliver: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let handler = Arc::clone(&self.handler);
        let permits = Arc::clone(&self.permits);
        let in_flight = Arc::clone(&self.in_flight);

        in_flight.enter();
        self.runtime.spawn(async move {
            let name = command.name();
            let outcome = match permits.acquire_owned().await {
                Ok(_permit) => run_guarded(handler, command).await,
                Err(_) => Outcome::Error(CommandError::new(
                    name.failure_kind(),
                    "worker pool closed",
                )),
            };
            deliver(outcome);
            in_flight.exit();
        });
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("max_concurrent", &self.max_concurrent)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Caller-side checks: known name, well-formed arguments.
fn prepare(name: &str, args: &CommandArgs) -> Result<Command, Outcome> {
    let Ok(command_name) = name.parse::<CommandName>() else {
        warn!(command = %name, "Command not implemented");
        return Err(Outcome::NotImplemented(name.to_string()));
    };

    Command::from_parts(command_name, args).map_err(|e| {
        debug!(command = %command_name, error = %e, "Rejected command arguments");
        Outcome::Error(e.into())
    })
}

/// Runs the handler in its own task so a panic becomes an outcome.
async fn run_guarded(handler: Arc<dyn CommandHandler>, command: Command) -> Outcome {
    let name = command.name();
    debug!(command = %name, "Running command");

    let outcome = match tokio::spawn(async move { handler.handle(command).await }).await {
        Ok(result) => Outcome::from(result),
        Err(join_err) => {
            let reason = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                "task cancelled".to_string()
            };
            Outcome::Error(CommandError::new(
                name.failure_kind(),
                format!("{} failed: {}", name, reason),
            ))
        }
    };

    match &outcome {
        Outcome::Error(err) => error!(command = %name, error = %err, "Command failed"),
        _ => info!(command = %name, "Command completed"),
    }
    outcome
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
