use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Days, Local, Weekday};
use tokio_stream::StreamExt;

use talash::config::AssistantConfig;
use talash::errors::{FlowError, SessionError};
use talash::models::{
    Answer, Author, BloodType, ConversationState, FlowPayload, Intent, RequestFormInput,
};
use talash::services::actions::{dial_uri, directions_url, ExternalActions};
use talash::services::clock::SystemClock;
use talash::services::conversation::{
    BLOOD_TYPE_PROMPT, EMERGENCY_TEXT, HELP_TEXT, LOCATION_PROMPT, REQUEST_FORM_PROMPT,
    WELCOME_TEXT,
};
use talash::services::directory::StaticDirectory;
use talash::services::eligibility::QuestionnaireStatus;
use talash::services::session::{spawn_session, SessionEvent, SessionHandle};

// ── Mock Providers ──

struct MockActions {
    opened: Arc<Mutex<Vec<String>>>,
}

impl ExternalActions for MockActions {
    fn dial(&self, phone: &str) {
        self.opened.lock().unwrap().push(dial_uri(phone));
    }

    fn open_directions(&self, lat: f64, lng: f64) {
        self.opened.lock().unwrap().push(directions_url(lat, lng));
    }
}

// ── Helpers ──

fn test_session() -> SessionHandle {
    test_session_with_actions().0
}

fn test_session_with_actions() -> (SessionHandle, Arc<Mutex<Vec<String>>>) {
    let opened = Arc::new(Mutex::new(vec![]));
    let session = spawn_session(
        AssistantConfig::default(),
        Arc::new(SystemClock),
        Arc::new(StaticDirectory::karachi()),
        Arc::new(MockActions {
            opened: Arc::clone(&opened),
        }),
    );
    (session, opened)
}

/// Lets every pending reply timer fire.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(10)).await;
}

async fn texts(session: &SessionHandle) -> Vec<String> {
    session
        .messages()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect()
}

fn next_open_day() -> chrono::NaiveDate {
    let mut date = Local::now().date_naive() + Days::new(1);
    if date.weekday() == Weekday::Sun {
        date = date + Days::new(1);
    }
    date
}

// ── Lifecycle ──

#[tokio::test(start_paused = true)]
async fn test_welcome_on_first_open_only() {
    let session = test_session();
    session.open().await.unwrap();
    session.close().await.unwrap();
    session.open().await.unwrap();
    settle().await;

    session.close().await.unwrap();
    session.open().await.unwrap();
    settle().await;

    assert_eq!(texts(&session).await, vec![WELCOME_TEXT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_welcome_arrives_after_its_delay() {
    let session = test_session();
    session.open().await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(session.messages().await.unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(texts(&session).await, vec![WELCOME_TEXT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_close_does_not_cancel_pending_reply() {
    let session = test_session();
    session.dispatch_intent(Intent::CheckAvailability).await.unwrap();
    session.close().await.unwrap();
    settle().await;

    assert_eq!(
        texts(&session).await,
        vec![
            "Check blood availability".to_string(),
            BLOOD_TYPE_PROMPT.to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_replies_arrive_in_input_order() {
    let session = test_session();
    session.dispatch_intent(Intent::RequestBlood).await.unwrap();
    session.dispatch_intent(Intent::Emergency).await.unwrap();
    session.send_free_text("hello?").await.unwrap();
    settle().await;

    let messages = session.messages().await.unwrap();
    let bot: Vec<&str> = messages
        .iter()
        .filter(|m| m.author == Author::Bot)
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(bot, vec![REQUEST_FORM_PROMPT, EMERGENCY_TEXT, HELP_TEXT]);

    assert!(messages
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

// ── Blood search and request ──

#[tokio::test(start_paused = true)]
async fn test_search_request_and_confirm() {
    let session = test_session();
    session.send_free_text("find nearest O- blood").await.unwrap();
    assert_eq!(session.state().await.unwrap(), ConversationState::BloodSearch);
    settle().await;

    let messages = session.messages().await.unwrap();
    assert_eq!(messages[1].text, LOCATION_PROMPT);
    assert_eq!(messages[2].text, "Found 3 blood banks near you:");
    let FlowPayload::BankResults { banks } = &messages[2].flow else {
        panic!("expected bank results, got {:?}", messages[2].flow);
    };
    assert!(banks.windows(2).all(|w| w[0].distance <= w[1].distance));

    session.request_from_bank(banks[0].id.clone()).await.unwrap();
    assert_eq!(session.state().await.unwrap(), ConversationState::RequestForm);

    let err = session
        .submit_request_form(RequestFormInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Flow(FlowError::Validation(ref e)) if e.len() == 4));

    let reference = session
        .submit_request_form(RequestFormInput {
            blood_type: "O-".to_string(),
            units: "2".to_string(),
            recipient_name: "Bilal Ahmed".to_string(),
            contact_number: "+92 300 1234567".to_string(),
            ..RequestFormInput::default()
        })
        .await
        .unwrap();
    assert!(reference.starts_with("TBL") && reference.len() == 11);
    assert_eq!(
        session.state().await.unwrap(),
        ConversationState::RequestConfirmation
    );

    session.close_confirmation().await.unwrap();
    assert_eq!(session.state().await.unwrap(), ConversationState::Home);
    assert_eq!(
        texts(&session).await.last().map(String::as_str),
        Some("Is there anything else I can help you with?")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_completion_is_reported_and_ignored() {
    let session = test_session();
    session.dispatch_intent(Intent::RequestBlood).await.unwrap();
    settle().await;
    session.cancel_flow().await.unwrap();
    let before = session.messages().await.unwrap().len();

    let err = session.close_confirmation().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Flow(FlowError::StaleCompletion {
            expected: ConversationState::RequestConfirmation,
            actual: ConversationState::Home,
        })
    );
    assert_eq!(session.messages().await.unwrap().len(), before);
    assert_eq!(
        session.cancel_flow().await,
        Err(SessionError::Flow(FlowError::NothingToCancel))
    );
}

#[tokio::test(start_paused = true)]
async fn test_form_from_replaced_flow_is_refused() {
    let session = test_session();
    session.dispatch_intent(Intent::RequestBlood).await.unwrap();
    settle().await;
    let old_form = session.anchor().await.unwrap().unwrap();

    session.cancel_flow().await.unwrap();
    session.dispatch_intent(Intent::RequestBlood).await.unwrap();
    settle().await;
    let new_form = session.anchor().await.unwrap().unwrap();
    assert_ne!(old_form, new_form);

    let input = RequestFormInput {
        blood_type: "A+".to_string(),
        units: "1".to_string(),
        recipient_name: "Sana Khan".to_string(),
        contact_number: "+92 321 7654321".to_string(),
        ..RequestFormInput::default()
    };
    let err = session
        .submit_request_form_for(old_form, input.clone())
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Flow(FlowError::StaleAnchor(old_form)));
    assert_eq!(session.state().await.unwrap(), ConversationState::RequestForm);

    session.submit_request_form_for(new_form, input).await.unwrap();
    assert_eq!(
        session.state().await.unwrap(),
        ConversationState::RequestConfirmation
    );
}

// ── Donor eligibility ──

#[tokio::test(start_paused = true)]
async fn test_eligibility_books_appointment() {
    let session = test_session();
    session.dispatch_intent(Intent::BecomeDonor).await.unwrap();
    settle().await;

    for _ in 0..3 {
        session.answer_eligibility(Answer::Yes).await.unwrap();
    }
    // Revisit the third question.
    assert_eq!(
        session.eligibility_back().await.unwrap(),
        QuestionnaireStatus::Asking(2)
    );
    session.answer_eligibility(Answer::Yes).await.unwrap();
    for _ in 0..3 {
        session.answer_eligibility(Answer::No).await.unwrap();
    }
    assert_eq!(
        session.answer_eligibility(Answer::No).await.unwrap(),
        QuestionnaireStatus::Eligible
    );

    let date = next_open_day();
    session.select_appointment_date(date).await.unwrap();
    let outcome = session.finish_eligibility().await.unwrap();
    assert!(outcome.eligible);

    let last = texts(&session).await.pop().unwrap();
    assert!(last.starts_with(&format!(
        "Appointment scheduled for {}/{}/{}.",
        date.month(),
        date.day(),
        date.year()
    )));
    assert_eq!(session.state().await.unwrap(), ConversationState::Home);
}

#[tokio::test(start_paused = true)]
async fn test_ineligible_donor_is_deferred() {
    let session = test_session();
    session.send_free_text("I want to donate").await.unwrap();
    settle().await;

    session.answer_eligibility(Answer::Yes).await.unwrap();
    assert_eq!(
        session.answer_eligibility(Answer::No).await.unwrap(),
        QuestionnaireStatus::Ineligible
    );
    assert!(session.answer_eligibility(Answer::Yes).await.is_err());

    let outcome = session.finish_eligibility().await.unwrap();
    assert!(!outcome.eligible);
    assert!(texts(&session)
        .await
        .last()
        .unwrap()
        .starts_with("Thank you for your interest."));
}

// ── Emergency ──

#[tokio::test(start_paused = true)]
async fn test_emergency_view_and_platform_actions() {
    let (session, opened) = test_session_with_actions();
    session.dispatch_intent(Intent::Emergency).await.unwrap();

    let affordances = session.affordances().await.unwrap();
    assert!(affordances.emergency_mode);
    assert!(!affordances.composer_visible);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let messages = session.messages().await.unwrap();
    let FlowPayload::EmergencyView { view } = &messages[1].flow else {
        panic!("expected emergency view, got {:?}", messages[1].flow);
    };
    assert_eq!(view.urgent_blood_type, Some(BloodType::ONeg));

    session.dial(&view.hotlines[0].number);
    session.open_directions(view.listings[0].lat, view.listings[0].lng);

    {
        let calls = opened.lock().unwrap();
        assert_eq!(calls[0], "tel:1122");
        assert!(calls[1].starts_with("https://www.google.com/maps/search/?api=1&query="));
    }
    // Platform actions never touch the transcript.
    assert_eq!(session.messages().await.unwrap().len(), 2);
}

// ── Events ──

#[tokio::test(start_paused = true)]
async fn test_event_stream() {
    let session = test_session();
    let mut events = session.subscribe();

    session.dispatch_intent(Intent::RequestBlood).await.unwrap();
    settle().await;

    let mut received = vec![];
    while received.len() < 5 {
        match events.next().await {
            Some(Ok(event)) => received.push(event),
            other => panic!("stream ended early: {other:?}"),
        }
    }

    assert_eq!(
        received[0],
        SessionEvent::StateChanged {
            from: ConversationState::Home,
            to: ConversationState::RequestForm,
        }
    );
    assert!(matches!(
        &received[1],
        SessionEvent::MessageAppended { message } if message.author == Author::User
    ));
    assert_eq!(received[2], SessionEvent::TypingChanged { typing: true });
    assert!(matches!(
        &received[3],
        SessionEvent::MessageAppended { message } if message.flow == FlowPayload::RequestForm
    ));
    assert_eq!(received[4], SessionEvent::TypingChanged { typing: false });
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_session() {
    let session = test_session();
    session.shutdown();
    assert_eq!(session.open().await, Err(SessionError::Closed));
}
