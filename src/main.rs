//! Terminal player for a small demo form
//!
//! Bot messages go to stdout, answers are read line by line from stdin and
//! logs are written to stderr as JSON.

use chat_form::{
    ChatContext, ChatForm, FormConfig, FormView, InputStep, OutputStep, Script, ScriptError,
    Sender, Status, Step, Text,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_form=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = FormConfig::from_env();
    tracing::info!(time_scale = config.time_scale, "Starting demo form");

    let form = ChatForm::spawn(demo_script()?, &config);
    let mut view_rx = form.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;

    loop {
        let view = FormView::clone(&view_rx.borrow_and_update());
        printed = print_new_messages(&view, printed);

        if view.halted {
            return Err("form stopped after a script callback failed".into());
        }

        match view.status {
            Status::Completed => {
                for (name, values) in view.answers.iter() {
                    tracing::info!(form_id = %view.form_id, name, values = ?values, "Answer");
                }
                let answers = serde_json::to_string(&view.answers)?;
                tracing::info!(form_id = %view.form_id, answers = %answers, "Form completed");
                break;
            }
            Status::Waiting => {
                let Some(line) = lines.next_line().await? else {
                    tracing::info!("Input closed before the form completed");
                    break;
                };
                if let Err(e) = form.submit_for_turn(line, view.prompt).await {
                    tracing::warn!(error = %e, "Submission rejected");
                }
            }
            Status::Active => {
                if view_rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn demo_script() -> Result<Script, ScriptError> {
    let not_blank = |value: &str, _ctx: &ChatContext| !value.trim().is_empty();
    let greeting =
        |ctx: &ChatContext| format!("Hello, {}!", ctx.first("name").unwrap_or_default());

    Script::new(vec![
        Step::output("Enter your name: "),
        InputStep::text("name")
            .validate(not_blank, "Please enter a name.")
            .into(),
        OutputStep::new("Thinking...").wait_ms(2000).into(),
        Step::output(Text::computed(greeting)),
    ])
}

/// Print bot messages newer than `printed`, returning the last sequence id
fn print_new_messages(view: &FormView, printed: u64) -> u64 {
    let mut last = printed;
    for message in view.transcript.iter().filter(|m| m.sequence_id > printed) {
        if message.sender == Sender::Bot {
            println!("{}", message.text);
        }
        last = message.sequence_id;
    }
    last
}
