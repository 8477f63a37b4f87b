use std::path::PathBuf;

use clap::Parser;

mod api;
mod error;
mod session;

use session::{Session, Status};

#[derive(Debug, Parser)]
#[command(name = "draftmail", about = "Draft an email with the draftmail server, review it, and send it.")]
struct Opt {
    /// Base URL of the draftmail server
    #[arg(long, env = "DRAFTMAIL_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// Comma-separated recipient addresses
    #[arg(short, long)]
    to: String,

    /// What the email should say
    #[arg(short, long)]
    prompt: String,

    /// Replace the generated subject
    #[arg(long)]
    subject: Option<String>,

    /// Replace the generated body with the contents of this file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// File to attach; may be repeated
    #[arg(short, long = "attach")]
    attach: Vec<PathBuf>,

    /// Drop the attachment at this position in the `--attach` list (0-based),
    /// after earlier removals; may be repeated
    #[arg(long)]
    detach: Vec<usize>,

    /// Print the draft without sending it
    #[arg(long)]
    dry_run: bool,
}

async fn run(opt: Opt) -> Result<Session, error::Error> {
    let client = api::Client::new(&opt.server)?;
    let mut session = Session::new();

    session.set_recipients(opt.to.as_str());
    session.set_prompt(opt.prompt.as_str());

    let prompt = session.begin_generate()?;
    let result = client.generate(&prompt).await;
    session.finish_generate(result)?;
    log::debug!("Session is {:?}", session.phase());

    if let Some(subject) = opt.subject {
        session.edit_subject(subject)?;
    }

    if let Some(path) = &opt.body_file {
        let body = tokio::fs::read_to_string(path).await?;
        session.edit_body(body)?;
    }

    for path in opt.attach {
        session.add_attachment(path)?;
    }

    for index in opt.detach {
        match session.remove_attachment(index)? {
            Some(path) => log::info!("Detached {}", path.display()),
            None => return Err(error::Error::Invalid(format!("No attachment at index {}", index))),
        }
    }

    let draft = session.draft();
    println!("To: {}", session.recipients());
    println!("Subject: {}", draft.subject);
    for path in session.attachments() {
        println!("Attachment: {}", path.display());
    }
    println!();
    println!("{}", draft.body);
    println!();

    if opt.dry_run {
        log::info!("Dry run, not sending");
        return Ok(session);
    }

    let payload = session.begin_send()?;
    let result = client.send(&payload).await;

    if let Ok(resp) = &result {
        log::info!("Sent with message ID {:?}", resp.message_id);
    }

    session.finish_send(result)?;

    Ok(session)
}

#[tokio::main]
async fn main() {
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::parse();

    match run(opt).await {
        Ok(session) => {
            if let Some(Status::Success(msg)) = session.status() {
                println!("{}", msg);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
