//! Thought Seal command line
//!
//! Seal, list and show thoughts, redeem a license key, or run the license
//! relay server.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thought_seal::{
    config::{Args, Command},
    identity::{self, FileStore, LocalStore},
    license::{GumroadRegistry, LicenseRegistry, RelayRegistry},
    server::{self, AppState},
    store::PostgrestStore,
    LicenseService, Session, Thought, ThoughtService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Command::Serve { listen } = args.command {
        let registry = GumroadRegistry::new(args.gumroad_config())?;
        info!("Verifying against {}", registry.config().verify_url);
        let state = Arc::new(AppState::new(Arc::new(registry)));
        server::run(listen, state).await?;
        return Ok(());
    }

    let state_path = args.state_path();
    let local: Arc<dyn LocalStore> = Arc::new(
        FileStore::open(&state_path)
            .with_context(|| format!("opening state file {}", state_path.display()))?,
    );

    if let Command::Status = args.command {
        let client_id = identity::load_or_generate(local.as_ref())?;
        println!("Client id: {}", client_id);
        println!(
            "Unlocked:  {}",
            if identity::is_unlocked(local.as_ref()) { "yes" } else { "no" }
        );
        println!("State:     {}", state_path.display());
        return Ok(());
    }

    let store = PostgrestStore::new(args.postgrest_config())?;
    let thoughts = ThoughtService::new(Arc::new(store));
    let registry: Arc<dyn LicenseRegistry> = match args.license.license_relay_url {
        Some(ref relay) => Arc::new(RelayRegistry::new(relay, args.timeout_secs())?),
        None => Arc::new(GumroadRegistry::new(args.gumroad_config())?),
    };
    let license = LicenseService::new(registry, local.clone());
    let mut session = Session::open(local, thoughts, license)?;

    match args.command {
        Command::Seal { ref content, public } => {
            let result = session.seal(content, public).await;
            let view = session.view();
            match result {
                Ok(Some(thought)) => {
                    println!("{}", view.status.message());
                    print_thought(&thought);
                }
                Ok(None) => {}
                Err(_) => {
                    println!("{}", view.status.message());
                    if let Some(url) = view.purchase_url() {
                        println!();
                        println!("You've reached the free limit.");
                        println!("Unlock unlimited thoughts and public sharing: {}", url);
                        println!("Already purchased? Run `thought-seal redeem <license key>`.");
                    }
                    std::process::exit(1);
                }
            }
        }
        Command::Public => {
            let view = session.refresh().await?;
            println!("Recently sealed public thoughts");
            print_list(&view.public_thoughts);
        }
        Command::Mine => {
            let view = session.refresh().await?;
            println!("My sealed thoughts");
            print_list(&view.my_thoughts);
        }
        Command::Show { ref id } => match session.thoughts().get(id).await? {
            Some(thought) => print_thought(&thought),
            None => {
                println!("Thought not found.");
                std::process::exit(1);
            }
        },
        Command::Redeem { ref license_key } => {
            let result = session.redeem(license_key).await;
            println!("{}", session.view().status.message());
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Command::Status | Command::Serve { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn print_thought(thought: &Thought) {
    println!();
    println!("  {}", thought.content.replace('\n', "\n  "));
    println!();
    println!("Id:        {}", thought.id);
    println!("Hash:      {}", thought.hash);
    println!("Sealed at: {}", thought.created_at.to_rfc3339());
    println!("Public:    {}", if thought.is_public { "yes" } else { "no" });
}

fn print_list(thoughts: &[Thought]) {
    if thoughts.is_empty() {
        println!("  (none)");
        return;
    }
    for thought in thoughts {
        let first_line = thought.content.lines().next().unwrap_or_default();
        println!(
            "  {}  {}  {}",
            thought.created_at.format("%Y-%m-%d %H:%M"),
            thought.id,
            first_line
        );
    }
}
