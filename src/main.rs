use std::sync::Arc;

use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use talash::config::AssistantConfig;
use talash::errors::SessionError;
use talash::models::{Answer, FlowPayload, Message, RequestFormInput, QUICK_ACTIONS};
use talash::services::actions::LoggingActions;
use talash::services::clock::SystemClock;
use talash::services::directory::StaticDirectory;
use talash::services::intent::classify_action;
use talash::services::session::{spawn_session, SessionEvent, SessionHandle};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AssistantConfig::from_env();
    tracing::info!(
        reply_delay_ms = config.reply_delay.as_millis() as u64,
        urgent_blood_type = ?config.urgent_blood_type,
        "starting talash assistant"
    );

    let session = spawn_session(
        config,
        Arc::new(SystemClock),
        Arc::new(StaticDirectory::karachi()),
        Arc::new(LoggingActions),
    );

    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => print_event(&event),
                Err(e) => tracing::warn!(error = %e, "event stream lagged"),
            }
        }
    });

    print_help();
    session.open().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        match run_command(&session, line).await {
            Ok(()) => {}
            Err(SessionError::Closed) => break,
            Err(e) => println!("  ! {e}"),
        }
    }

    session.shutdown();
    Ok(())
}

async fn run_command(session: &SessionHandle, line: &str) -> Result<(), SessionError> {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "/open" => session.open().await?,
        "/close" => session.close().await?,
        "/action" => session.dispatch_intent(classify_action(arg)).await?,
        "/bank" => session.request_from_bank(arg).await?,
        "/submit" => match serde_json::from_str::<RequestFormInput>(arg) {
            Ok(input) => {
                let reference = session.submit_request_form(input).await?;
                println!("  request reference: {reference}");
            }
            Err(e) => println!("  ! form must be JSON: {e}"),
        },
        "/done" => session.close_confirmation().await?,
        "/yes" | "/no" | "/y" | "/n" => {
            let Some(answer) = Answer::parse(&command[1..]) else {
                return Ok(());
            };
            let status = session.answer_eligibility(answer).await?;
            tracing::debug!(status = ?status, "answered");
            print_question(session).await?;
        }
        "/back" => {
            session.eligibility_back().await?;
            print_question(session).await?;
        }
        "/date" => match NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
            Ok(date) => session.select_appointment_date(date).await?,
            Err(_) => println!("  ! date must look like 2026-10-20"),
        },
        "/confirm" => {
            session.finish_eligibility().await?;
        }
        "/cancel" => session.cancel_flow().await?,
        "/call" => session.dial(arg),
        _ if command.starts_with('/') => print_help(),
        _ => {
            session.send_free_text(line).await?;
        }
    }
    Ok(())
}

async fn print_question(session: &SessionHandle) -> Result<(), SessionError> {
    let question = session
        .call(|c| {
            c.questionnaire().map(|q| {
                let (step, total, _) = q.progress();
                (step, total, q.current_question().map(|q| q.prompt), q.status())
            })
        })
        .await?;

    if let Some((step, total, prompt, status)) = question {
        match prompt {
            Some(prompt) => println!("  [{step}/{total}] {prompt}  (/yes, /no, /back)"),
            None => println!("  questionnaire {status:?}: /date YYYY-MM-DD then /confirm"),
        }
    }
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::MessageAppended { message } => print_message(message),
        SessionEvent::TypingChanged { typing: true } => println!("  …"),
        SessionEvent::TypingChanged { typing: false } => {}
        SessionEvent::StateChanged { to, .. } => tracing::debug!(state = %to, "state changed"),
    }
}

fn print_message(message: &Message) {
    let who = if message.is_bot() { "Talash" } else { "You" };
    if !message.text.is_empty() {
        println!("[{}] {who}: {}", message.display_time(), message.text);
    }

    match &message.flow {
        FlowPayload::None => {}
        FlowPayload::BankResults { banks } => {
            for bank in banks {
                println!(
                    "    #{} {} ({}, {}) {}",
                    bank.id,
                    bank.name,
                    bank.distance_label(),
                    bank.availability_summary(),
                    bank.phone
                );
            }
            println!("    /bank <id> to request, /cancel for the menu");
        }
        FlowPayload::RequestForm => {
            println!("    /submit {{\"bloodType\":\"O-\",\"units\":\"2\",\"recipientName\":\"...\",\"contactNumber\":\"...\"}}");
        }
        FlowPayload::EligibilityFlow => println!("    answer with /yes or /no, /cancel to stop"),
        FlowPayload::EmergencyView { view } => {
            println!("    {}", view.headline());
            for listing in &view.listings {
                println!(
                    "    {} ({}) {} units, call {}",
                    listing.name, listing.distance, listing.total_units, listing.phone
                );
            }
            for hotline in &view.hotlines {
                println!("    {} {}", hotline.number, hotline.label);
            }
        }
        FlowPayload::RequestConfirmation { reference_id } => {
            println!("    ✓ Request submitted. Reference: {reference_id}  (/done)");
        }
    }
}

fn print_help() {
    let actions: Vec<&str> = QUICK_ACTIONS.iter().map(|a| a.id).collect();
    println!("Type a message, or /action <{}>.", actions.join("|"));
    println!("Other commands: /open /close /cancel /call <number> /quit");
}
