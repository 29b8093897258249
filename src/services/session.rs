//! Async host for a conversation.
//!
//! One task owns the [`ConversationController`]. Every user action reaches
//! it as a command over an mpsc channel, and reply timers fire inside the
//! same `select!` loop, so no two mutations ever interleave. Changes are
//! published as [`SessionEvent`]s on a broadcast channel.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::sleep_until;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::errors::SessionError;
use crate::models::{
    Answer, ConversationState, EligibilityOutcome, Intent, Message, RequestFormInput,
};
use crate::services::actions::ExternalActions;
use crate::services::clock::Clock;
use crate::services::conversation::{Affordances, ConversationController};
use crate::services::directory::DirectoryProvider;
use crate::services::eligibility::QuestionnaireStatus;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

type Command = Box<dyn FnOnce(&mut ConversationController) + Send>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    MessageAppended { message: Message },
    TypingChanged { typing: bool },
    StateChanged {
        from: ConversationState,
        to: ConversationState,
    },
}

#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
    actions: Arc<dyn ExternalActions>,
    cancel: CancellationToken,
}

/// Starts the session task on the current runtime.
pub fn spawn_session(
    config: AssistantConfig,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn DirectoryProvider>,
    actions: Arc<dyn ExternalActions>,
) -> SessionHandle {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    let cancel = CancellationToken::new();

    let controller = ConversationController::new(config, clock, directory);
    tokio::spawn(run(id, controller, rx, events.clone(), cancel.clone()));

    tracing::info!(session = %id, "session started");

    SessionHandle {
        id,
        tx,
        events,
        actions,
        cancel,
    }
}

async fn run(
    id: Uuid,
    mut controller: ConversationController,
    mut rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut published = Published::new(&controller);

    loop {
        let due = controller.next_reply_due();

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!(session = %id, "session cancelled");
                break;
            }
            command = rx.recv() => match command {
                Some(command) => command(&mut controller),
                None => {
                    tracing::info!(session = %id, "all handles dropped, session ending");
                    break;
                }
            },
            _ = sleep_until(due.unwrap_or_else(tokio::time::Instant::now)), if due.is_some() => {
                let delivered = controller.deliver_due();
                tracing::debug!(session = %id, delivered, "replies delivered");
            }
        }

        published.publish(&controller, &events);
    }
}

/// What subscribers have already been told.
struct Published {
    messages: usize,
    typing: bool,
    state: ConversationState,
}

impl Published {
    fn new(controller: &ConversationController) -> Self {
        Self {
            messages: controller.transcript().len(),
            typing: controller.is_typing(),
            state: controller.state(),
        }
    }

    fn publish(&mut self, controller: &ConversationController, events: &broadcast::Sender<SessionEvent>) {
        // Sends fail only when nobody is subscribed.
        let state = controller.state();
        if state != self.state {
            let _ = events.send(SessionEvent::StateChanged {
                from: self.state,
                to: state,
            });
            self.state = state;
        }

        let messages = controller.transcript().messages();
        for message in messages.iter().skip(self.messages) {
            let _ = events.send(SessionEvent::MessageAppended {
                message: message.clone(),
            });
        }
        self.messages = messages.len();

        let typing = controller.is_typing();
        if typing != self.typing {
            let _ = events.send(SessionEvent::TypingChanged { typing });
            self.typing = typing;
        }
    }
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> BroadcastStream<SessionEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Runs `f` against the controller inside the session task.
    pub async fn call<F, R>(&self, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut ConversationController) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command: Command = Box::new(move |controller| {
            let _ = reply_tx.send(f(controller));
        });

        self.tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn open(&self) -> Result<(), SessionError> {
        self.call(|c| c.open()).await
    }

    pub async fn close(&self) -> Result<(), SessionError> {
        self.call(|c| c.close()).await
    }

    pub async fn dispatch_intent(&self, intent: Intent) -> Result<(), SessionError> {
        self.call(move |c| c.dispatch_intent(intent)).await
    }

    pub async fn send_free_text(&self, text: impl Into<String>) -> Result<Option<Intent>, SessionError> {
        let text = text.into();
        self.call(move |c| c.send_free_text(&text)).await
    }

    pub async fn request_from_bank(&self, bank_id: impl Into<String>) -> Result<(), SessionError> {
        let bank_id = bank_id.into();
        Ok(self.call(move |c| c.request_from_bank(&bank_id)).await??)
    }

    pub async fn submit_request_form(&self, input: RequestFormInput) -> Result<String, SessionError> {
        Ok(self.call(move |c| c.submit_request_form(input)).await??)
    }

    /// Submits the form anchored at `anchor`; a superseded form is refused.
    pub async fn submit_request_form_for(
        &self,
        anchor: Uuid,
        input: RequestFormInput,
    ) -> Result<String, SessionError> {
        Ok(self.call(move |c| c.submit_request_form_for(anchor, input)).await??)
    }

    pub async fn close_confirmation(&self) -> Result<(), SessionError> {
        Ok(self.call(|c| c.close_confirmation()).await??)
    }

    pub async fn answer_eligibility(&self, answer: Answer) -> Result<QuestionnaireStatus, SessionError> {
        Ok(self.call(move |c| c.answer_eligibility(answer)).await??)
    }

    pub async fn eligibility_back(&self) -> Result<QuestionnaireStatus, SessionError> {
        Ok(self.call(|c| c.eligibility_back()).await??)
    }

    pub async fn select_appointment_date(&self, date: NaiveDate) -> Result<(), SessionError> {
        Ok(self.call(move |c| c.select_appointment_date(date)).await??)
    }

    pub async fn finish_eligibility(&self) -> Result<EligibilityOutcome, SessionError> {
        Ok(self.call(|c| c.finish_eligibility()).await??)
    }

    pub async fn complete_eligibility_for(
        &self,
        anchor: Uuid,
        eligible: bool,
        appointment_date: Option<NaiveDate>,
    ) -> Result<(), SessionError> {
        Ok(self
            .call(move |c| c.complete_eligibility_for(anchor, eligible, appointment_date))
            .await??)
    }

    pub async fn anchor(&self) -> Result<Option<Uuid>, SessionError> {
        self.call(|c| c.anchor()).await
    }

    pub async fn cancel_flow(&self) -> Result<(), SessionError> {
        Ok(self.call(|c| c.cancel_flow()).await??)
    }

    pub async fn state(&self) -> Result<ConversationState, SessionError> {
        self.call(|c| c.state()).await
    }

    pub async fn affordances(&self) -> Result<Affordances, SessionError> {
        self.call(|c| c.affordances()).await
    }

    pub async fn messages(&self) -> Result<Vec<Message>, SessionError> {
        self.call(|c| c.transcript().messages().to_vec()).await
    }

    // Platform actions bypass the conversation entirely.

    pub fn dial(&self, phone: &str) {
        self.actions.dial(phone);
    }

    pub fn open_directions(&self, lat: f64, lng: f64) {
        self.actions.open_directions(lat, lng);
    }

    /// Stops the session task. Pending replies are dropped with it.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
