use std::path::PathBuf;

use anyhow::Result;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hiel::config::Config;
use hiel::scheduler::{
    parse_date, parse_month, service_week_number, setlist_week_number, MonthView, Scheduler,
};
use hiel::server::HielServer;
use hiel::session::{Session, SessionStore};
use hiel::store::open_store;
use hiel::team::MemberDirectory;

#[derive(Parser)]
#[command(
    name = "hiel",
    version,
    about = "Worship-team scheduler: availability, service rosters and team board",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the service and set-list week numbers of a date
    Week {
        /// Date as YYYY-MM-DD
        date: String,
    },

    /// Print the availability summary of a month
    Month {
        /// Month as YYYY-MM
        year_month: String,
    },

    /// Sign in as a team member and cache the session
    Login {
        /// Member id
        member_id: String,
    },

    /// Clear the cached session
    Logout,

    /// Show the signed-in profile
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.override_log_format(format)?;
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind.parse()?;
            }
            tracing::info!(bind = %config.server.bind_address, "Starting serve command");
            serve(config).await?;
        }

        Commands::Week { date } => {
            week(&date)?;
        }

        Commands::Month { year_month } => {
            tracing::info!(year_month = %year_month, "Starting month command");
            month(config, &year_month).await?;
        }

        Commands::Login { member_id } => {
            login(config, &member_id).await?;
        }

        Commands::Logout => {
            SessionStore::new(&config.session.path).clear()?;
            println!("로그아웃되었습니다");
        }

        Commands::Whoami => {
            let session = SessionStore::new(&config.session.path).load()?;
            print_session(&session);
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("hiel=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("hiel={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let server = HielServer::new(&config)?;
    println!("{}", server.info().display());

    server
        .start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}

fn week(input: &str) -> Result<()> {
    let date = parse_date(input)?;
    println!("{date} ({})", date.weekday());
    println!("  Service week: {}주차", service_week_number(date));
    println!("  Set-list week: {}주차", setlist_week_number(date));
    Ok(())
}

async fn month(config: Config, input: &str) -> Result<()> {
    let year_month = parse_month(input)?;
    let store = open_store(&config.database)?;
    let scheduler = Scheduler::with_member_limit(store, config.team.list_limit);

    let view = scheduler.open_month(year_month).await?;
    print_month(&view);
    Ok(())
}

async fn login(config: Config, member_id: &str) -> Result<()> {
    let store = open_store(&config.database)?;
    let member = MemberDirectory::new(store)
        .get(member_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No member with id '{member_id}'"))?;

    let session = Session::sign_in(&member, chrono::Local::now().date_naive());
    SessionStore::new(&config.session.path).save(&session)?;
    print_session(&session);
    Ok(())
}

fn print_session(session: &Session) {
    let user = session.user();
    if session.is_anonymous() {
        println!("{} (로그인 안 됨)", user.display_name);
        return;
    }
    let role = if user.is_team_leader { "팀장" } else { "팀원" };
    println!("{} <{}> [{}]", user.display_name, user.email, role);
}

fn print_month(view: &MonthView) {
    println!("{} ({} members)", view.label, view.member_count);
    println!("{:-<40}", "");

    for day in &view.sundays {
        let status = day
            .roster_status
            .map(|s| s.korean_label())
            .unwrap_or("미작성");
        println!(
            "{} {}주차  참석 {} / 불참 {} / 미응답 {}  [{}]",
            day.date,
            day.week_number,
            day.responses.available,
            day.responses.unavailable,
            day.responses.pending,
            status
        );

        for slot in day.positions.iter().filter(|s| s.no_eligible_members) {
            println!("    ! {}: 가능 인원 없음", slot.position.korean_label());
        }
    }

    for day in &view.saturdays {
        println!(
            "{} 연습  참석 {} / 불참 {} / 미응답 {}",
            day.date, day.responses.available, day.responses.unavailable, day.responses.pending
        );
    }
}
