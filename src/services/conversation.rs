use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::errors::FlowError;
use crate::models::{
    Answer, Author, ConversationState, EligibilityOutcome, EmergencyView, FlowPayload, Intent,
    Message, RequestFormData, RequestFormInput, Transcript,
};
use crate::services::clock::Clock;
use crate::services::directory::DirectoryProvider;
use crate::services::eligibility::{check_appointment_date, Questionnaire, QuestionnaireStatus};
use crate::services::intake_form::IntakeForm;
use crate::services::intent::classify_text;
use crate::services::reply_queue::ReplyQueue;

pub const WELCOME_TEXT: &str =
    "Hi — I'm Talash AI. How can I help?\n\n💡 Try: 'Find nearest O- blood' or choose an action below.";
pub const HELP_TEXT: &str = "I can help you with:\n• Finding blood banks\n• Checking availability\n• Requesting blood\n• Donor registration\n\nWhat would you like to do?";
pub const LOCATION_PROMPT: &str = "Allow location to find nearby blood banks?";
pub const BLOOD_TYPE_PROMPT: &str = "Which blood type are you looking for?";
pub const REQUEST_FORM_PROMPT: &str = "Please fill out the request form:";
pub const ELIGIBILITY_PROMPT: &str =
    "Great! Let me check your eligibility. Please answer a few questions:";
pub const ELIGIBILITY_PROMPT_TYPED: &str = "Great! Let me check your eligibility:";
pub const EMERGENCY_TEXT: &str = "⚠️ EMERGENCY MODE ACTIVATED\n\nFor life-threatening situations, call 1122 (Rescue) or 115 (Aman Ambulance) immediately.\n\nShowing blood banks with immediate stock:";
pub const HOW_ELSE: &str = "How else can I help you?";
pub const ANYTHING_ELSE: &str = "Is there anything else I can help you with?";
pub const DEFERRAL_TEXT: &str =
    "Thank you for your interest. Please consult with a healthcare provider for more information.";

/// The live sub-flow together with the working data it owns. The
/// conversation state is derived from this, so exactly one state is ever
/// active and leaving a flow drops its data.
#[derive(Debug)]
enum Flow {
    Home,
    BloodSearch,
    RequestForm(IntakeForm),
    RequestConfirmation { reference_id: String },
    DonorEligibility(Questionnaire),
    Emergency,
}

impl Flow {
    fn state(&self) -> ConversationState {
        match self {
            Flow::Home => ConversationState::Home,
            Flow::BloodSearch => ConversationState::BloodSearch,
            Flow::RequestForm(_) => ConversationState::RequestForm,
            Flow::RequestConfirmation { .. } => ConversationState::RequestConfirmation,
            Flow::DonorEligibility(_) => ConversationState::DonorEligibility,
            Flow::Emergency => ConversationState::Emergency,
        }
    }
}

/// Where an intent came from. Typed intents get the plain reply delay and
/// the shorter eligibility prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    QuickAction,
    FreeText,
}

/// Which controls the widget shell should offer in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub quick_actions: bool,
    pub back_to_menu: bool,
    pub composer_visible: bool,
    pub composer_enabled: bool,
    pub emergency_mode: bool,
}

pub struct ConversationController {
    config: AssistantConfig,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn DirectoryProvider>,
    transcript: Transcript,
    flow: Flow,
    replies: ReplyQueue,
    anchor: Option<Uuid>,
    open: bool,
    welcomed: bool,
}

impl ConversationController {
    pub fn new(
        config: AssistantConfig,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn DirectoryProvider>,
    ) -> Self {
        Self {
            config,
            clock,
            directory,
            transcript: Transcript::new(),
            flow: Flow::Home,
            replies: ReplyQueue::new(),
            anchor: None,
            open: false,
            welcomed: false,
        }
    }

    // ── Widget lifecycle ──

    /// Opens the widget. The welcome message is queued on the first open
    /// only, and only if nothing has been said yet.
    pub fn open(&mut self) {
        self.open = true;
        if !self.welcomed && self.transcript.is_empty() {
            self.welcomed = true;
            self.replies.push(
                self.clock.instant(),
                self.config.welcome_delay,
                WELCOME_TEXT,
                FlowPayload::None,
            );
        }
    }

    /// Hides the widget. Pending replies keep running and the transcript
    /// is kept for the next open.
    pub fn close(&mut self) {
        self.open = false;
        tracing::debug!(pending = self.replies.len(), "widget closed");
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // ── Intents ──

    /// Handles a quick-action tap: echoes the action and routes its intent.
    pub fn dispatch_intent(&mut self, intent: Intent) {
        if let Some(action) = intent.quick_action() {
            self.append_user(action.echo);
        }
        self.route(intent, Origin::QuickAction);
    }

    /// Handles typed text. Returns the classified intent, or `None` for
    /// blank input, which is ignored.
    pub fn send_free_text(&mut self, text: &str) -> Option<Intent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.append_user(text);
        let intent = classify_text(text);
        self.route(intent, Origin::FreeText);
        Some(intent)
    }

    fn route(&mut self, intent: Intent, origin: Origin) {
        let now = self.clock.instant();

        tracing::info!(
            intent = ?intent,
            origin = ?origin,
            state = self.state().as_str(),
            "dispatching intent"
        );

        match intent {
            Intent::FindNearest => {
                self.enter(Flow::BloodSearch);
                let banks = self.directory.nearby_banks(self.config.nearby_limit);
                self.replies.push(
                    now,
                    self.config.reply_delay,
                    LOCATION_PROMPT,
                    FlowPayload::None,
                );
                self.replies.push_after_tail(
                    now,
                    self.config.search_followup,
                    format!("Found {} blood banks near you:", banks.len()),
                    FlowPayload::BankResults { banks },
                );
            }
            Intent::CheckAvailability => {
                self.enter(Flow::Home);
                self.replies.push(
                    now,
                    self.config.reply_delay,
                    BLOOD_TYPE_PROMPT,
                    FlowPayload::None,
                );
            }
            Intent::RequestBlood => {
                self.enter(Flow::RequestForm(IntakeForm::new(None)));
                self.replies.push(
                    now,
                    self.config.reply_delay,
                    REQUEST_FORM_PROMPT,
                    FlowPayload::RequestForm,
                );
            }
            Intent::BecomeDonor => {
                let prompt = match origin {
                    Origin::QuickAction => ELIGIBILITY_PROMPT,
                    Origin::FreeText => ELIGIBILITY_PROMPT_TYPED,
                };
                self.enter(Flow::DonorEligibility(Questionnaire::new()));
                self.replies.push(
                    now,
                    self.config.reply_delay,
                    prompt,
                    FlowPayload::EligibilityFlow,
                );
            }
            Intent::Emergency => {
                let view = EmergencyView::build(
                    self.config.urgent_blood_type,
                    self.directory.emergency_listings(),
                );
                let delay = match origin {
                    Origin::QuickAction => self.config.emergency_delay,
                    Origin::FreeText => self.config.reply_delay,
                };
                self.enter(Flow::Emergency);
                self.replies.push(
                    now,
                    delay,
                    EMERGENCY_TEXT,
                    FlowPayload::EmergencyView { view },
                );
            }
            Intent::Unknown => {
                self.replies
                    .push(now, self.config.reply_delay, HELP_TEXT, FlowPayload::None);
            }
        }
    }

    /// "Request" on a bank from the search results.
    pub fn request_from_bank(&mut self, bank_id: &str) -> Result<(), FlowError> {
        let actual = self.state();
        if actual != ConversationState::BloodSearch {
            return Err(stale(ConversationState::BloodSearch, actual));
        }
        if self.directory.bank(bank_id).is_none() {
            return Err(FlowError::UnknownBank(bank_id.to_string()));
        }

        self.enter(Flow::RequestForm(IntakeForm::new(Some(bank_id.to_string()))));
        self.post_now(REQUEST_FORM_PROMPT, FlowPayload::RequestForm);
        Ok(())
    }

    // ── Request form ──

    /// Validates and submits the request form. Returns the reference id.
    /// On validation failure nothing changes except the form's errors.
    pub fn submit_request_form(&mut self, input: RequestFormInput) -> Result<String, FlowError> {
        let actual = self.state();
        let Flow::RequestForm(form) = &mut self.flow else {
            return Err(stale(ConversationState::RequestForm, actual));
        };

        form.input = input;
        let data = form.submit(|data| data).map_err(|errors| {
            tracing::debug!(errors = %errors, "request form rejected");
            FlowError::Validation(errors)
        })?;

        Ok(self.confirm_request(data))
    }

    /// Like [`submit_request_form`](Self::submit_request_form), but only
    /// for the form anchored at `anchor`. A form that was cancelled and
    /// replaced by a new one is rejected even though the state matches.
    pub fn submit_request_form_for(
        &mut self,
        anchor: Uuid,
        input: RequestFormInput,
    ) -> Result<String, FlowError> {
        self.check_anchor(anchor)?;
        self.submit_request_form(input)
    }

    fn confirm_request(&mut self, data: RequestFormData) -> String {
        let reference_id = reference_id(self.clock.now());

        tracing::info!(
            reference_id = %reference_id,
            blood_type = %data.blood_type,
            units = data.units,
            urgency = data.urgency.describe(),
            bank_id = ?data.bank_id,
            "blood request submitted"
        );

        self.enter(Flow::RequestConfirmation {
            reference_id: reference_id.clone(),
        });
        self.post_now(
            "",
            FlowPayload::RequestConfirmation {
                reference_id: reference_id.clone(),
            },
        );
        reference_id
    }

    /// "Done" on the confirmation card.
    pub fn close_confirmation(&mut self) -> Result<(), FlowError> {
        let actual = self.state();
        if actual != ConversationState::RequestConfirmation {
            return Err(stale(ConversationState::RequestConfirmation, actual));
        }
        self.enter(Flow::Home);
        self.post_now(ANYTHING_ELSE, FlowPayload::None);
        Ok(())
    }

    // ── Eligibility ──

    fn questionnaire_mut(&mut self) -> Result<&mut Questionnaire, FlowError> {
        let actual = self.state();
        match &mut self.flow {
            Flow::DonorEligibility(q) => Ok(q),
            _ => Err(stale(ConversationState::DonorEligibility, actual)),
        }
    }

    pub fn answer_eligibility(&mut self, answer: Answer) -> Result<QuestionnaireStatus, FlowError> {
        self.questionnaire_mut()?.answer(answer)
    }

    pub fn eligibility_back(&mut self) -> Result<QuestionnaireStatus, FlowError> {
        self.questionnaire_mut()?.back()
    }

    pub fn select_appointment_date(&mut self, date: NaiveDate) -> Result<(), FlowError> {
        let today = self.clock.today();
        self.questionnaire_mut()?.select_date(date, today)
    }

    /// Ends the questionnaire with whatever outcome it reached: the
    /// deferral for an ineligible donor, the booking for an eligible one
    /// (which needs a date first).
    pub fn finish_eligibility(&mut self) -> Result<EligibilityOutcome, FlowError> {
        let today = self.clock.today();
        let outcome = self.questionnaire_mut()?.finish(today)?;
        self.complete_eligibility(outcome.eligible, outcome.appointment_date)?;
        Ok(outcome)
    }

    pub fn complete_eligibility(
        &mut self,
        eligible: bool,
        appointment_date: Option<NaiveDate>,
    ) -> Result<(), FlowError> {
        let actual = self.state();
        if actual != ConversationState::DonorEligibility {
            return Err(stale(ConversationState::DonorEligibility, actual));
        }
        if let (true, Some(date)) = (eligible, appointment_date) {
            check_appointment_date(date, self.clock.today())?;
        }

        let text = match (eligible, appointment_date) {
            (true, Some(date)) => format!(
                "Appointment scheduled for {}. We'll send you a confirmation SMS shortly. Thank you for being a hero! 🎉",
                date.format("%-m/%-d/%Y")
            ),
            _ => DEFERRAL_TEXT.to_string(),
        };

        tracing::info!(eligible, appointment_date = ?appointment_date, "eligibility completed");
        self.enter(Flow::Home);
        self.post_now(text, FlowPayload::None);
        Ok(())
    }

    /// Like [`complete_eligibility`](Self::complete_eligibility), scoped to
    /// the questionnaire anchored at `anchor`.
    pub fn complete_eligibility_for(
        &mut self,
        anchor: Uuid,
        eligible: bool,
        appointment_date: Option<NaiveDate>,
    ) -> Result<(), FlowError> {
        self.check_anchor(anchor)?;
        self.complete_eligibility(eligible, appointment_date)
    }

    fn check_anchor(&self, anchor: Uuid) -> Result<(), FlowError> {
        if self.anchor == Some(anchor) {
            return Ok(());
        }
        tracing::warn!(
            %anchor,
            current = ?self.anchor,
            "ignoring callback from a superseded sub-flow"
        );
        Err(FlowError::StaleAnchor(anchor))
    }

    // ── Cancel ──

    /// Leaves the active sub-flow, dropping its working data.
    pub fn cancel_flow(&mut self) -> Result<(), FlowError> {
        let text = match self.state() {
            ConversationState::Home => return Err(FlowError::NothingToCancel),
            ConversationState::RequestForm => format!("Request cancelled. {HOW_ELSE}"),
            ConversationState::DonorEligibility => format!("Eligibility check cancelled. {HOW_ELSE}"),
            _ => HOW_ELSE.to_string(),
        };

        self.enter(Flow::Home);
        self.post_now(text, FlowPayload::None);
        Ok(())
    }

    // ── Reply delivery ──

    /// Appends every queued reply that is due, oldest first. Returns how
    /// many were appended.
    pub fn deliver_due(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(reply) = self.replies.pop_due(self.clock.instant()) {
            self.append_bot(reply.text, reply.flow);
            delivered += 1;
        }
        delivered
    }

    pub fn next_reply_due(&self) -> Option<Instant> {
        self.replies.next_due()
    }

    /// True while a reply is pending; the typing indicator mirrors this.
    pub fn is_typing(&self) -> bool {
        !self.replies.is_empty()
    }

    // ── Accessors ──

    pub fn state(&self) -> ConversationState {
        self.flow.state()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Message carrying the live sub-flow, once it has been delivered.
    pub fn anchor(&self) -> Option<Uuid> {
        self.anchor
    }

    pub fn anchor_message(&self) -> Option<&Message> {
        self.anchor.and_then(|id| self.transcript.get(id))
    }

    pub fn request_form(&self) -> Option<&IntakeForm> {
        match &self.flow {
            Flow::RequestForm(form) => Some(form),
            _ => None,
        }
    }

    pub fn questionnaire(&self) -> Option<&Questionnaire> {
        match &self.flow {
            Flow::DonorEligibility(q) => Some(q),
            _ => None,
        }
    }

    pub fn reference_id(&self) -> Option<&str> {
        match &self.flow {
            Flow::RequestConfirmation { reference_id } => Some(reference_id),
            _ => None,
        }
    }

    pub fn affordances(&self) -> Affordances {
        let state = self.state();
        let composer_visible = !matches!(
            state,
            ConversationState::RequestForm
                | ConversationState::DonorEligibility
                | ConversationState::Emergency
        );
        Affordances {
            quick_actions: state == ConversationState::Home && !self.transcript.is_empty(),
            back_to_menu: state == ConversationState::BloodSearch,
            composer_visible,
            composer_enabled: composer_visible && !self.is_typing(),
            emergency_mode: state == ConversationState::Emergency,
        }
    }

    // ── Internals ──

    fn enter(&mut self, flow: Flow) {
        let from = self.state();
        let to = flow.state();
        if from != to {
            tracing::info!(from = from.as_str(), to = to.as_str(), "state transition");
        }
        self.anchor = None;
        self.flow = flow;
    }

    fn append_user(&mut self, text: &str) {
        self.transcript
            .append(Author::User, text, FlowPayload::None, self.clock.now());
    }

    fn append_bot(&mut self, text: String, flow: FlowPayload) {
        let anchors_live_flow = payload_matches(&flow, self.state());
        let id = self
            .transcript
            .append(Author::Bot, text, flow, self.clock.now())
            .id;
        if anchors_live_flow {
            self.anchor = Some(id);
        }
    }

    /// Posts a reply without a typing delay, keeping it behind anything
    /// still pending.
    fn post_now(&mut self, text: impl Into<String>, flow: FlowPayload) {
        if self.replies.is_empty() {
            self.append_bot(text.into(), flow);
        } else {
            self.replies
                .push(self.clock.instant(), Duration::ZERO, text, flow);
        }
    }
}

fn payload_matches(flow: &FlowPayload, state: ConversationState) -> bool {
    matches!(
        (flow, state),
        (FlowPayload::BankResults { .. }, ConversationState::BloodSearch)
            | (FlowPayload::RequestForm, ConversationState::RequestForm)
            | (
                FlowPayload::RequestConfirmation { .. },
                ConversationState::RequestConfirmation
            )
            | (FlowPayload::EligibilityFlow, ConversationState::DonorEligibility)
            | (FlowPayload::EmergencyView { .. }, ConversationState::Emergency)
    )
}

fn stale(expected: ConversationState, actual: ConversationState) -> FlowError {
    tracing::warn!(
        expected = expected.as_str(),
        actual = actual.as_str(),
        "ignoring callback for inactive sub-flow"
    );
    FlowError::StaleCompletion { expected, actual }
}

/// `TBL` followed by the last eight digits of the epoch-millisecond time.
pub fn reference_id(now: DateTime<Utc>) -> String {
    format!("TBL{:08}", now.timestamp_millis().rem_euclid(100_000_000))
}
