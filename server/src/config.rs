use clap::Parser;

/// Limit for the JSON body of `POST /generate`
pub const MAX_PROMPT_BODY: u64 = 64 * 1024;

/// Multipart overhead allowed on top of the attachment limits (form fields,
/// part headers)
pub const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "draftmail-server", about = "Drafts emails with an LLM and sends them over SMTP.")]
pub struct Opt {
    /// Path to a TOML config file [default: ./draftmail.toml, if present]
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on; overrides the config file
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Debug)]
pub struct HttpArg {
    pub port: u16,
}
