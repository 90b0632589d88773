use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use smartdoc_core::config::{Config, Settings};
use smartdoc_core::error::Error;
use smartdoc_llm::OllamaGenerator;
use smartdoc_session::{display_name, Pipeline, Session, SessionState, UploadOutcome};

/// Ask questions about a PDF, answered by a local model.
#[derive(Debug, Parser)]
#[command(name = "smartdoc", version)]
struct Args {
    /// PDF to process before the prompt opens.
    pdf: Option<PathBuf>,

    /// Ollama model used for answers.
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the Ollama runtime.
    #[arg(long)]
    ollama_url: Option<String>,

    /// Passages handed to the model per question.
    #[arg(long)]
    top_k: Option<usize>,

    /// Hashed bag-of-words embeddings instead of the local BGE-M3 model.
    #[arg(long)]
    fake_embeddings: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.llm.model.clone_from(model);
        }
        if let Some(url) = &self.ollama_url {
            settings.llm.base_url.clone_from(url);
        }
        if let Some(k) = self.top_k {
            settings.retrieval.top_k = k;
        }
        if self.fake_embeddings {
            settings.embedding.use_fake = true;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help,
    Load(&'a str),
    History,
    Status,
    Quit,
    Unknown(&'a str),
    Ask(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else { return Self::Ask(line) };
        let (name, arg) = rest.split_once(char::is_whitespace).map_or((rest, ""), |(n, a)| (n, a.trim()));
        match name {
            "help" | "h" => Self::Help,
            "load" | "l" if !arg.is_empty() => Self::Load(arg),
            "history" => Self::History,
            "status" | "s" => Self::Status,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line),
        }
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    args.apply(&mut settings);

    check_ollama(&settings);
    let pipeline = Pipeline::from_settings(&settings)?;
    let mut session = Session::new(pipeline);

    println!("📄 SmartDoc");
    println!("==========");
    if let Some(pdf) = &args.pdf {
        load(&mut session, pdf);
    } else {
        println!("Load a PDF with /load <path> to get started.");
    }
    show_help();
    repl(&mut session)
}

fn check_ollama(settings: &Settings) {
    match OllamaGenerator::from_settings(&settings.llm) {
        Ok(ollama) if !ollama.health_check() => {
            warn!(url = %ollama.base_url(), "Ollama is not reachable; questions will fail until it is running");
        }
        Ok(ollama) => {
            if let Ok(false) = ollama.has_model() {
                warn!(model = %settings.llm.model, "model not pulled yet; run `ollama pull {}`", settings.llm.model);
            }
        }
        Err(e) => warn!(error = %e, "could not build Ollama client"),
    }
}

fn repl(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("ask> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        match Command::parse(&line) {
            Command::Help => show_help(),
            Command::Load(path) => load(session, Path::new(path)),
            Command::History => show_history(session),
            Command::Status => show_status(session),
            Command::Quit => break,
            Command::Unknown(cmd) => println!("❓ Unknown command: {cmd} (try /help)"),
            Command::Ask("") => {}
            Command::Ask(question) => ask(session, question),
        }
    }
    println!("👋 Bye");
    Ok(())
}

fn load(session: &mut Session, path: &Path) {
    let name = display_name(path);
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    spinner.set_message(format!("Processing {name}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = session.upload_file(path);
    spinner.finish_and_clear();

    match result {
        Ok(UploadOutcome::Processed { pages, chunks }) => {
            println!("✅ Processed {name}: {pages} pages, {chunks} chunks");
        }
        Ok(UploadOutcome::Unchanged) => println!("ℹ️  {name} is already loaded"),
        Err(Error::Io(e)) => println!("❌ failed to read {}: {e}", path.display()),
        Err(e) => println!("❌ {e}"),
    }
}

fn ask(session: &mut Session, question: &str) {
    match session.ask(question) {
        Ok(Some(exchange)) => println!("\n{}\n", exchange.answer),
        Ok(None) => {}
        Err(e) => println!("❌ {e}"),
    }
}

fn show_history(session: &Session) {
    if session.history().is_empty() {
        println!("No questions asked yet.");
        return;
    }
    for (i, exchange) in session.history().iter().enumerate() {
        println!("\n{}. Q: {}", i + 1, exchange.question);
        println!("   A: {}", exchange.answer);
    }
    println!();
}

fn show_status(session: &Session) {
    match (session.state(), session.document()) {
        (SessionState::Ready, Some(doc)) => {
            println!("📊 Document: {} ({} pages, {} chunks)", doc.name, doc.page_count, session.chunk_count());
        }
        (state, _) => println!("📊 State: {state:?}"),
    }
    let pipeline = session.pipeline();
    println!("   Model: {}  top_k: {}  questions: {}", pipeline.model_id(), pipeline.top_k(), session.history().len());
    println!("   Index: {:?}  scratch: {}", pipeline.backend(), pipeline.scratch_dir().display());
}

fn show_help() {
    println!("🎯 Commands:");
    println!("  /load <path> - Process a PDF");
    println!("  /history     - Show all questions and answers");
    println!("  /status      - Show the loaded document");
    println!("  /help        - Show this help message");
    println!("  /quit        - Exit");
    println!("  <question>   - Ask about the loaded document");
    println!();
}
