//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod account;
mod analytics;
mod categories;
mod config_cmd;
mod documents;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use docdash::browse::{SortKey, SortOrder};
use docdash::cache::QueryCache;
use docdash::config::{load_settings_with_options, Config, LoadOptions, Settings};
use docdash::models::{DateFilter, SessionId};
use docdash::{ApiClient, Dashboard, SessionStore};

#[derive(Parser)]
#[command(name = "docdash")]
#[command(about = "Session-scoped dashboard for invoices and documents")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true, env = "DOCDASH_API_URL")]
    api_url: Option<String>,

    /// State file holding the active session and login
    #[arg(long, global = true, env = "DOCDASH_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Record who is using the dashboard
    Login {
        /// Email sent with every request
        email: String,
        /// Grant administrator rights (may delete any session)
        #[arg(long)]
        admin: bool,
    },

    /// Forget the login (the active session is kept)
    Logout,

    /// Show the login and the active session
    Whoami,

    /// Manage working sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Open a dashboard link, adopting the session it carries
    Open {
        /// Dashboard URL, e.g. http://localhost:5000/?session=12
        link: String,
    },

    /// Upload PDF or XML files into the active session
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Browse documents
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },

    /// Show spend charts for the active session
    Chart {
        #[command(subcommand)]
        command: ChartCommands,
        /// Ignore cached results
        #[arg(long, global = true)]
        refresh: bool,
    },

    /// Curate product categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Export the product summary spreadsheet
    Export {
        /// Output file (defaults to the server-provided filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show AI suggestions and projections for the active session
    Insights,

    /// Toggle the collapsed sidebar (hides the session banner)
    Sidebar,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions
    List,
    /// Show one session
    Show {
        /// Session ID
        id: SessionId,
    },
    /// Create a session and make it active
    Create {
        /// Session name
        name: String,
        /// Initial document ID (repeatable)
        #[arg(long = "doc")]
        documents: Vec<i64>,
        /// Member email (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Make a session active
    Use {
        /// Session ID
        id: SessionId,
    },
    /// Leave the active session
    Clear,
    /// Delete a session (creator or administrator only)
    Delete {
        /// Session ID
        id: SessionId,
        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List documents in a session (defaults to the active one)
    Documents {
        /// Session ID
        id: Option<SessionId>,
    },
    /// Attach existing documents to a session
    Add {
        /// Document IDs
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Target session (defaults to the active one)
        #[arg(long)]
        session: Option<SessionId>,
    },
    /// Print a shareable link to the active session
    Link,
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List documents
    List {
        /// Supplier ID or name
        #[arg(long)]
        supplier: Option<String>,
        /// First month (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        start: Option<DateFilter>,
        /// Last month (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        end: Option<DateFilter>,
        /// Partial invoice number
        #[arg(long)]
        invoice: Option<String>,
        /// Filename or supplier substring
        #[arg(short, long)]
        search: Option<String>,
        /// File type (pdf or xml)
        #[arg(long = "type")]
        filetype: Option<String>,
        /// Sort field: uploaded, date, filename, size, total, supplier
        #[arg(long, default_value = "uploaded")]
        sort: SortKey,
        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Items per page (defaults to the configured page size)
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Show one document
    Show {
        /// Document ID
        id: i64,
    },
    /// Download the PDF summary of a document
    Download {
        /// Document ID
        id: i64,
        /// Output file (defaults to the server-provided filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every document on the server
    DeleteAll {
        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ChartCommands {
    /// Spend by product
    Products,
    /// Spend by category
    Categories,
    /// Both charts
    All,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List product categorizations
    List {
        /// Group products by category
        #[arg(long)]
        grouped: bool,
    },
    /// Assign a category to a product manually
    Set {
        /// Product name
        product: String,
        /// Category name
        category: String,
    },
    /// Run the automatic classifier
    ApplyMl {
        /// Restrict to these products
        products: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective settings
    Show,
}

fn parse_month(raw: &str) -> Result<DateFilter, String> {
    DateFilter::parse(raw).ok_or_else(|| format!("'{}' is not a YYYY-MM month", raw))
}

/// Everything a command needs: resolved settings and a dashboard bound to
/// the persisted session store.
pub(crate) struct Context {
    pub settings: Settings,
    pub config: Config,
    pub dashboard: Dashboard,
    pub json: bool,
}

impl Context {
    fn new(settings: Settings, config: Config, json: bool) -> anyhow::Result<Self> {
        let store = SessionStore::open(&settings.state_file)?;
        let api = ApiClient::new(&settings.api_url, settings.timeout(), store)?;
        let cache = Arc::new(QueryCache::with_ttl(settings.cache_ttl()));
        Ok(Self {
            dashboard: Dashboard::new(api, cache),
            settings,
            config,
            json,
        })
    }

    pub fn store(&self) -> &SessionStore {
        self.dashboard.store()
    }

    pub fn api(&self) -> &ApiClient {
        self.dashboard.api()
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        api_url: cli.api_url,
        state_file: cli.state_file,
    };
    let (settings, config) =
        load_settings_with_options(options).await.map_err(|e| anyhow::anyhow!(e))?;
    let ctx = Context::new(settings, config, cli.json)?;

    match cli.command {
        Commands::Login { email, admin } => account::cmd_login(&ctx, &email, admin),
        Commands::Logout => account::cmd_logout(&ctx),
        Commands::Whoami => account::cmd_whoami(&ctx),
        Commands::Open { link } => account::cmd_open(&ctx, &link).await,
        Commands::Sidebar => account::cmd_sidebar(&ctx),
        Commands::Session { command } => match command {
            SessionCommands::List => session::cmd_session_list(&ctx).await,
            SessionCommands::Show { id } => session::cmd_session_show(&ctx, id).await,
            SessionCommands::Create {
                name,
                documents,
                users,
            } => session::cmd_session_create(&ctx, name, documents, users).await,
            SessionCommands::Use { id } => session::cmd_session_use(&ctx, id).await,
            SessionCommands::Clear => session::cmd_session_clear(&ctx),
            SessionCommands::Delete { id, yes } => {
                session::cmd_session_delete(&ctx, id, yes).await
            }
            SessionCommands::Documents { id } => session::cmd_session_documents(&ctx, id).await,
            SessionCommands::Add { ids, session } => {
                session::cmd_session_add(&ctx, session, &ids).await
            }
            SessionCommands::Link => session::cmd_session_link(&ctx),
        },
        Commands::Upload { files } => documents::cmd_upload(&ctx, &files).await,
        Commands::Docs { command } => match command {
            DocsCommands::List {
                supplier,
                start,
                end,
                invoice,
                search,
                filetype,
                sort,
                order,
                page,
                per_page,
            } => {
                let filter = docdash::models::DocumentFilter {
                    supplier,
                    start,
                    end,
                    invoice,
                };
                let query = docdash::browse::DocumentQuery {
                    search,
                    filetype,
                    sort,
                    order,
                    page,
                    per_page: per_page.unwrap_or(ctx.settings.page_size),
                };
                documents::cmd_docs_list(&ctx, &filter, &query).await
            }
            DocsCommands::Show { id } => documents::cmd_docs_show(&ctx, id).await,
            DocsCommands::Download { id, output } => {
                documents::cmd_docs_download(&ctx, id, output).await
            }
            DocsCommands::DeleteAll { yes } => documents::cmd_docs_delete_all(&ctx, yes).await,
        },
        Commands::Chart { command, refresh } => {
            let charts: &[docdash::dashboard::Chart] = match command {
                ChartCommands::Products => &[docdash::dashboard::Chart::Products],
                ChartCommands::Categories => &[docdash::dashboard::Chart::Categories],
                ChartCommands::All => &docdash::dashboard::Chart::ALL,
            };
            analytics::cmd_chart(&ctx, charts, refresh).await
        }
        Commands::Categories { command } => match command {
            CategoryCommands::List { grouped } => {
                categories::cmd_categories_list(&ctx, grouped).await
            }
            CategoryCommands::Set { product, category } => {
                categories::cmd_categories_set(&ctx, &product, &category).await
            }
            CategoryCommands::ApplyMl { products } => {
                categories::cmd_categories_apply_ml(&ctx, &products).await
            }
        },
        Commands::Export { output } => analytics::cmd_export(&ctx, output).await,
        Commands::Insights => analytics::cmd_insights(&ctx).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&ctx),
        },
    }
}
