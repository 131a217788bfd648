use clap::{Parser, Subcommand, ValueEnum};
use miette::{Result, miette};
use rust_decimal::Decimal;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};
use transit_booking::application::catalog::RouteBrowser;
use transit_booking::application::dashboard::TicketDesk;
use transit_booking::application::orchestrator::{BookingOrchestrator, cancellation};
use transit_booking::application::session::SessionManager;
use transit_booking::application::wallet::{DEFAULT_HISTORY_LIMIT, WalletManager};
use transit_booking::config::{PollSettings, ServiceEndpoints, StorageSettings};
use transit_booking::domain::booking::DEFAULT_TICKET_PRICE;
use transit_booking::domain::money::Amount;
use transit_booking::domain::payment::NextStep;
use transit_booking::domain::ports::SessionStoreRef;
use transit_booking::domain::session::{Affordability, Session};
use transit_booking::domain::ticket::{TicketQuery, TicketStatus};
use transit_booking::infrastructure::clock::TokioSleeper;
use transit_booking::infrastructure::file_store::FileSessionStore;
use transit_booking::infrastructure::http::{ApiClient, http_client};
use transit_booking::infrastructure::http::graphql::GraphQlRouteCatalog;
use transit_booking::infrastructure::http::payment::HttpPaymentService;
use transit_booking::infrastructure::http::ticketing::HttpTicketingService;
use transit_booking::infrastructure::http::user::HttpAuthService;
use transit_booking::infrastructure::http::wallet::HttpWalletService;
#[cfg(not(feature = "storage-rocksdb"))]
use transit_booking::infrastructure::in_memory::InMemorySessionStore;
#[cfg(feature = "storage-rocksdb")]
use transit_booking::infrastructure::rocksdb::RocksDbSessionStore;
use transit_booking::interfaces::csv::route_writer::RouteWriter;
use transit_booking::interfaces::csv::ticket_writer::TicketWriter;
use transit_booking::interfaces::csv::wallet_writer::WalletWriter;
use transit_booking::interfaces::diagnostic::report;
use transit_booking::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Book transit tickets and manage your wallet", long_about = None)]
struct Cli {
    #[command(flatten)]
    endpoints: ServiceEndpoints,

    #[command(flatten)]
    poll: PollSettings,

    #[command(flatten)]
    storage: StorageSettings,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRANSIT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRANSIT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user's profile, or edit it with --name/--phone
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List routes as CSV
    Routes {
        /// Only routes whose name or stops contain this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one route and its timetable
    Route { id: String },
    /// Book and pay for a ticket, waiting for the payment to settle
    Book(BookArgs),
    /// List your tickets as CSV
    Tickets {
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Balance, ticket totals and recent tickets
    Dashboard,
    /// Wallet balance, top-ups and history
    #[command(subcommand)]
    Wallet(WalletCommand),
}

#[derive(clap::Args)]
struct BookArgs {
    route_id: String,

    /// Schedule to travel on (defaults to the route's first schedule)
    #[arg(long)]
    schedule: Option<String>,

    #[arg(long)]
    seat: Option<String>,

    /// Passenger name (defaults to the profile name)
    #[arg(long)]
    name: Option<String>,

    /// Passenger email (defaults to the profile email)
    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TICKET_PRICE)]
    price: Decimal,

    /// Submit even when the cached balance looks too low
    #[arg(long)]
    ignore_balance: bool,
}

#[derive(Subcommand)]
enum WalletCommand {
    Balance,
    Topup {
        amount: Decimal,
    },
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    Reserved,
    Confirmed,
    Cancelled,
    Used,
}

impl From<StatusFilter> for TicketStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Reserved => TicketStatus::Reserved,
            StatusFilter::Confirmed => TicketStatus::Confirmed,
            StatusFilter::Cancelled => TicketStatus::Cancelled,
            StatusFilter::Used => TicketStatus::Used,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let store = open_session_store(&cli.storage)?;
    let clients = Clients::new(&cli.endpoints, store.clone())?;
    let sessions = SessionManager::new(Box::new(HttpAuthService::new(clients.user.clone())), store);

    match cli.command {
        Command::Login { email, password } => {
            let session = sessions.login(&email, &password).await.map_err(report)?;
            println!("Logged in as {}", display_name(&session));
        }
        Command::Register {
            email,
            password,
            name,
            phone,
        } => {
            let session = sessions
                .register(&email, &password, name, phone)
                .await
                .map_err(report)?;
            if session.is_authenticated() {
                println!("Registered and logged in as {}", display_name(&session));
            } else {
                println!("Registered {email}. Please log in.");
            }
        }
        Command::Logout => {
            sessions.logout().await.map_err(report)?;
            println!("Logged out");
        }
        Command::Profile { name, phone } => {
            let mut session = require_login(&sessions).await?;
            let profile = if name.is_some() || phone.is_some() {
                sessions
                    .update_profile(&mut session, name, phone)
                    .await
                    .map_err(report)?
            } else {
                sessions
                    .refresh_profile(&mut session)
                    .await
                    .map_err(report)?
            };
            println!("id: {}", profile.id);
            println!("email: {}", profile.email);
            println!("name: {}", profile.name.as_deref().unwrap_or("-"));
            println!("phone: {}", profile.phone.as_deref().unwrap_or("-"));
            println!("role: {}", profile.role.as_deref().unwrap_or("-"));
        }
        Command::Routes { search } => {
            let routes = clients
                .routes()
                .search(search.as_deref())
                .await
                .map_err(report)?;
            RouteWriter::new(io::stdout().lock())
                .write_routes(&routes)
                .map_err(report)?;
        }
        Command::Route { id } => {
            let route = clients.routes().route(&id).await.map_err(report)?;
            let stdout = io::stdout();
            RouteWriter::new(stdout.lock())
                .write_routes(std::slice::from_ref(&route))
                .map_err(report)?;
            println!();
            RouteWriter::new(stdout.lock())
                .write_schedules(&route)
                .map_err(report)?;
        }
        Command::Book(args) => {
            let session = require_login(&sessions).await?;
            book(&clients, cli.poll, session, args).await?;
        }
        Command::Tickets {
            status,
            page,
            limit,
        } => {
            let session = require_login(&sessions).await?;
            let query = TicketQuery {
                status: status.map(TicketStatus::from),
                page,
                limit,
            };
            let tickets = clients
                .tickets()
                .my_tickets(&session, &query)
                .await
                .map_err(report)?;
            TicketWriter::new(io::stdout().lock())
                .write_tickets(&tickets)
                .map_err(report)?;
        }
        Command::Dashboard => {
            let mut session = require_login(&sessions).await?;
            let view = clients
                .tickets()
                .dashboard(&mut session)
                .await
                .map_err(report)?;
            TicketWriter::new(io::stdout().lock())
                .write_dashboard(&view)
                .map_err(report)?;
        }
        Command::Wallet(command) => {
            let mut session = sessions.restore().await.map_err(report)?;
            let wallet = clients.wallet();
            match command {
                WalletCommand::Balance => {
                    let balance = wallet
                        .refresh_balance(&mut session)
                        .await
                        .map_err(report)?;
                    WalletWriter::new(io::stdout().lock())
                        .write_balance(session.user_id().unwrap_or_default(), balance)
                        .map_err(report)?;
                }
                WalletCommand::Topup { amount } => {
                    let balance = wallet
                        .top_up(&mut session, amount)
                        .await
                        .map_err(report)?;
                    println!("Wallet topped up. Balance: {balance}");
                }
                WalletCommand::History { limit } => {
                    let transactions = wallet
                        .recent_transactions(&session, limit)
                        .await
                        .map_err(report)?;
                    WalletWriter::new(io::stdout().lock())
                        .write_transactions(&transactions)
                        .map_err(report)?;
                }
            }
        }
    }

    Ok(())
}

async fn book(
    clients: &Clients,
    poll: PollSettings,
    mut session: Session,
    args: BookArgs,
) -> Result<()> {
    // Ctrl+C from here on abandons the booking instead of killing the process.
    let (handle, mut signal) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let price = Amount::new(args.price).map_err(report)?;
    let (route, mut draft) = clients
        .routes()
        .start_booking(&session, &args.route_id, args.schedule.as_deref())
        .await
        .map_err(report)?;

    if let Some(name) = args.name {
        draft.passenger_name = name;
    }
    if let Some(email) = args.email {
        draft.passenger_email = email;
    }
    if let Some(phone) = args.phone {
        draft = draft.with_phone(phone);
    }
    if let Some(seat) = args.seat {
        draft = draft.with_seat(seat);
    }

    if let Err(e) = clients.wallet().refresh_balance(&mut session).await {
        warn!(error = %e, "could not fetch wallet balance");
    }
    match session.affordability(price) {
        Affordability::Insufficient { shortfall } if !args.ignore_balance => {
            return Err(miette!(
                "Insufficient wallet balance: {} short of {}. Top up or pass --ignore-balance.",
                shortfall,
                price
            ));
        }
        Affordability::Insufficient { shortfall } => {
            warn!(%shortfall, "balance looks insufficient, submitting anyway");
        }
        Affordability::Unknown => warn!("wallet balance unknown, submitting anyway"),
        Affordability::Sufficient => {}
    }

    let mut orchestrator = BookingOrchestrator::new(
        Box::new(HttpPaymentService::new(clients.payment.clone())),
        Box::new(TokioSleeper),
    )
    .with_policy(poll.into());

    info!(route = %route.name, %price, "booking ticket");
    let outcome = orchestrator
        .book(&session, &draft, price, &mut signal)
        .await
        .map_err(report)?;

    match outcome {
        None => println!("Booking cancelled"),
        Some(outcome) => match outcome.next_step() {
            NextStep::ViewTickets => {
                println!("{}", outcome.message());
                println!("payment: {}", outcome.payment_id());
                println!("Run `transit-booking tickets` to see your ticket.");
            }
            NextStep::RetryBooking => {
                return Err(miette!(
                    "{} (payment {})",
                    outcome.message(),
                    outcome.payment_id()
                ));
            }
        },
    }
    Ok(())
}

/// One API client per backend service, all reading the same session slot.
struct Clients {
    user: ApiClient,
    route: ApiClient,
    ticketing: ApiClient,
    payment: ApiClient,
    wallet: ApiClient,
}

impl Clients {
    fn new(endpoints: &ServiceEndpoints, store: SessionStoreRef) -> Result<Self> {
        let http = http_client().map_err(report)?;
        let client = |url: &str| ApiClient::with_client(http.clone(), url, store.clone());
        Ok(Self {
            user: client(&endpoints.user_url),
            route: client(&endpoints.route_url),
            ticketing: client(&endpoints.ticketing_url),
            payment: client(&endpoints.payment_url),
            wallet: client(&endpoints.wallet_url),
        })
    }

    fn routes(&self) -> RouteBrowser {
        RouteBrowser::new(Box::new(GraphQlRouteCatalog::new(self.route.clone())))
    }

    fn wallet(&self) -> WalletManager {
        WalletManager::new(Box::new(HttpWalletService::new(self.wallet.clone())))
    }

    fn tickets(&self) -> TicketDesk {
        TicketDesk::new(
            Box::new(HttpTicketingService::new(self.ticketing.clone())),
            Box::new(HttpWalletService::new(self.wallet.clone())),
        )
    }
}

fn open_session_store(storage: &StorageSettings) -> Result<SessionStoreRef> {
    let Some(db_path) = &storage.session_db else {
        return Ok(Arc::new(FileSessionStore::new(&storage.session_file)));
    };

    #[cfg(feature = "storage-rocksdb")]
    let store: SessionStoreRef = Arc::new(RocksDbSessionStore::open(db_path).map_err(report)?);

    #[cfg(not(feature = "storage-rocksdb"))]
    let store: SessionStoreRef = {
        warn!(
            path = %db_path.display(),
            "built without the storage-rocksdb feature, falling back to an in-memory session store"
        );
        Arc::new(InMemorySessionStore::new())
    };

    Ok(store)
}

async fn require_login(sessions: &SessionManager) -> Result<Session> {
    let session = sessions.restore().await.map_err(report)?;
    if !session.is_authenticated() {
        return Err(miette!(
            "You need to log in first: run `transit-booking login --email <EMAIL>`"
        ));
    }
    Ok(session)
}

fn display_name(session: &Session) -> &str {
    session
        .user
        .as_ref()
        .map(|u| u.name.as_deref().unwrap_or(u.email.as_str()))
        .unwrap_or("-")
}
