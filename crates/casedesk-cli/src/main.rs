mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use casedesk_client::{CaseBackend, HttpBackend};
use casedesk_core::{ListQuery, PollConfig, Session, SortKey, SortOrder, StatusFilter};
use casedesk_intake::{CancelHandle, IntakeSession};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casedesk", version, about = "Case and document intake for the casedesk backend")]
struct Cli {
    #[command(flatten)]
    conn: Connection,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Connection {
    /// Backend API base URL.
    #[arg(long, env = "CASEDESK_BASE_URL", global = true, default_value = "http://localhost:5000/api")]
    base_url: String,

    /// Bearer token for the backend.
    #[arg(long, env = "CASEDESK_TOKEN", global = true, hide_env_values = true, default_value = "")]
    token: String,

    /// Id of the acting user.
    #[arg(long = "user", env = "CASEDESK_USER", global = true, default_value = "")]
    user_id: String,

    /// Maximum status queries per uploaded document.
    #[arg(long, env = "CASEDESK_POLL_ATTEMPTS", global = true, default_value_t = 20)]
    poll_attempts: u32,

    /// Base polling interval in milliseconds.
    #[arg(long, env = "CASEDESK_POLL_BASE_MS", global = true, default_value_t = 2000)]
    poll_base_ms: u64,

    /// Sent as `form_category` with uploads.
    #[arg(long, env = "CASEDESK_FORM_CATEGORY", global = true)]
    form_category: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List cases visible to the user.
    Cases {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Match category or document names.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "deadline")]
        sort: SortKey,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        per_page: usize,
    },
    /// Show one case with its document checklist.
    Case { case_id: String },
    /// Upload a file for a specific document requirement.
    Upload {
        case_id: String,
        requirement_id: String,
        file: PathBuf,
    },
    /// Upload several files and assign them to open requirements automatically.
    SmartUpload {
        case_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show processing status of an uploaded document.
    Status { document_id: String },
}

impl Connection {
    fn session(&self) -> anyhow::Result<Session> {
        anyhow::ensure!(!self.token.is_empty(), "no token: pass --token or set CASEDESK_TOKEN");
        anyhow::ensure!(!self.user_id.is_empty(), "no user: pass --user or set CASEDESK_USER");
        Ok(Session::new(&self.base_url, &self.token, &self.user_id))
    }

    fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.poll_attempts.max(1),
            base: Duration::from_millis(self.poll_base_ms),
            ..PollConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = cli.conn.session()?;
    tracing::debug!(?session, "casedesk v{}", env!("CARGO_PKG_VERSION"));

    let backend: Arc<dyn CaseBackend> = Arc::new(HttpBackend::new(session.clone()));

    match cli.command {
        Command::Cases {
            status,
            search,
            sort,
            order,
            page,
            per_page,
        } => {
            let book = casedesk_intake::reconcile(backend.as_ref(), session.user_id())
                .await
                .context("loading cases")?;
            let query = ListQuery {
                status,
                search,
                sort,
                order,
                page,
                per_page,
            };
            print!("{}", display::case_table(&query.apply(book.cases())));
            println!("{} pending", book.pending_count());
        }
        Command::Case { case_id } => {
            let case = backend
                .get_case(&case_id)
                .await
                .with_context(|| format!("loading case {case_id}"))?;
            print!("{}", display::case_card(&case));
        }
        Command::Upload {
            case_id,
            requirement_id,
            file,
        } => {
            let intake = intake_session(backend, session, &cli.conn);
            let cancel = cancel_on_ctrl_c();
            let done = intake
                .upload_single(&case_id, &requirement_id, &file, &cancel.token())
                .await
                .with_context(|| format!("uploading {}", file.display()))?;
            print!("{}", display::single_result(&done));
            refresh(&intake, &case_id).await;
        }
        Command::SmartUpload { case_id, files } => {
            let intake = intake_session(backend, session, &cli.conn);
            let cancel = cancel_on_ctrl_c();
            let report = intake
                .smart_upload(&case_id, &files, &cancel.token())
                .await
                .with_context(|| format!("smart upload to case {case_id}"))?;
            print!("{}", display::batch_result(&report));
            refresh(&intake, &case_id).await;
        }
        Command::Status { document_id } => {
            let report = backend
                .document_status(&document_id)
                .await
                .with_context(|| format!("loading document {document_id}"))?;
            print!("{}", display::document_status(&report));
        }
    }

    Ok(())
}

fn intake_session(backend: Arc<dyn CaseBackend>, session: Session, conn: &Connection) -> IntakeSession {
    let poll = conn.poll_config();
    tracing::debug!(
        attempts = poll.max_attempts,
        max_wait = ?poll.total_wait(),
        "polling budget per document"
    );
    let intake = IntakeSession::new(backend, session, poll);
    match &conn.form_category {
        Some(category) => intake.with_form_category(category),
        None => intake,
    }
}

/// Cancel in-flight polls on Ctrl-C.
fn cancel_on_ctrl_c() -> Arc<CancelHandle> {
    let handle = Arc::new(CancelHandle::new());
    let signal = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling uploads");
            signal.cancel();
        }
    });
    handle
}

/// Reconcile after an upload and show the refreshed case.
async fn refresh(intake: &IntakeSession, case_id: &str) {
    match intake.reconcile().await {
        Ok(book) => {
            if let Some(case) = book.get(case_id) {
                print!("\n{}", display::case_card(case));
            }
            println!("{} pending cases", book.pending_count());
        }
        Err(err) => tracing::warn!(
            user = %intake.session().user_id(),
            error = %err,
            "could not refresh cases"
        ),
    }
}
