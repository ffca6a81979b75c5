//! Spawned form with a channel-based surface

use super::{FormError, FormEvent, FormRuntime, FormView};
use crate::config::FormConfig;
use crate::script::Script;
use crate::state_machine::Status;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Requests sent to the form task
#[derive(Debug)]
enum Command {
    Submit {
        text: String,
        turn: u64,
        reply: oneshot::Sender<Result<(), FormError>>,
    },
}

/// Handle to a form running on its own task.
///
/// The form starts as soon as it is spawned. Submissions are queued and
/// applied one at a time. Dropping the handle abandons the form: pending
/// timers and callbacks are cancelled.
pub struct ChatForm {
    form_id: String,
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<FormEvent>,
    view_rx: watch::Receiver<FormView>,
    cancel: CancellationToken,
}

impl ChatForm {
    /// Spawn a form on the current tokio runtime
    pub fn spawn(script: Script, config: &FormConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.event_capacity);
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_capacity);

        let runtime = FormRuntime::new(script, config.clone()).with_broadcast(broadcast_tx.clone());
        let (view_tx, view_rx) = watch::channel(runtime.view());
        let runtime = runtime.with_view(view_tx);
        let form_id = runtime.form_id().to_string();

        let cancel = CancellationToken::new();
        tokio::spawn(run(runtime, command_rx, cancel.clone()));

        Self {
            form_id,
            command_tx,
            broadcast_tx,
            view_rx,
            cancel,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Submit an answer to the prompt currently shown
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), FormError> {
        let turn = self.view_rx.borrow().prompt;
        self.submit_for_turn(text, turn).await
    }

    pub async fn submit_for_turn(
        &self,
        text: impl Into<String>,
        turn: u64,
    ) -> Result<(), FormError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(Command::Submit {
                text: text.into(),
                turn,
                reply,
            })
            .await
            .map_err(|_| FormError::Closed)?;
        response.await.map_err(|_| FormError::Closed)?
    }

    /// Latest snapshot
    pub fn view(&self) -> FormView {
        FormView::clone(&self.view_rx.borrow())
    }

    pub fn status(&self) -> Status {
        self.view_rx.borrow().status
    }

    /// Receive incremental events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Receiver that sees every new snapshot
    pub fn watch(&self) -> watch::Receiver<FormView> {
        self.view_rx.clone()
    }

    /// Wait until the form reaches `status`
    pub async fn wait_for_status(&self, status: Status) -> Result<FormView, FormError> {
        let mut view_rx = self.view_rx.clone();
        let view = FormView::clone(
            &*view_rx
                .wait_for(|view| view.status == status || view.halted)
                .await
                .map_err(|_| FormError::Closed)?,
        );
        if view.status != status {
            return Err(FormError::Halted);
        }
        Ok(view)
    }
}

impl Drop for ChatForm {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut runtime: FormRuntime,
    mut command_rx: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) {
    let form_id = runtime.form_id().to_string();

    tokio::select! {
        () = cancel.cancelled() => {
            tracing::info!(form_id = %form_id, "Form abandoned before it started waiting");
            return;
        }
        result = runtime.start() => {
            if let Err(e) = result {
                tracing::error!(form_id = %form_id, error = %e, "Form failed to start");
            }
        }
    }

    loop {
        let command = tokio::select! {
            () = cancel.cancelled() => break,
            command = command_rx.recv() => command,
        };
        let Some(Command::Submit { text, turn, reply }) = command else {
            break;
        };

        tokio::select! {
            () = cancel.cancelled() => break,
            result = runtime.submit_for_turn(text, turn) => {
                // The caller may have stopped waiting for the reply
                let _ = reply.send(result);
            }
        }
    }

    tracing::info!(form_id = %form_id, status = %runtime.status(), "Form stopped");
}
