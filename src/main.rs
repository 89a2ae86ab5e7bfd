use anyhow::Context;
use clap::Parser;
use colored::*;
use github_users_browser::actors::{fetch_snapshot, UserListActor, UserListArgs};
use github_users_browser::api;
use github_users_browser::cli::Cli;
use github_users_browser::connectivity::{spawn_probe, Connectivity};
use github_users_browser::github::GitHubClient;
use github_users_browser::health::AppState;
use github_users_browser::storage::{FileStore, KeyValueStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("{}", "GitHub Users Browser".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    let client = GitHubClient::new(cli.client_config()?).context("Failed to build GitHub client")?;
    println!("✅ GitHub API at {} ({} users per page)", cli.api_url, client.per_page());

    let store: Arc<dyn KeyValueStore> = if cli.memory_store {
        println!("{}", "Bookmarks kept in memory only".yellow());
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::new(&cli.store_dir)
            .with_context(|| format!("Failed to open store at {}", cli.store_dir.display()))?;
        println!("✅ Bookmarks stored in {}", store.dir().display());
        Arc::new(store)
    };

    let connectivity = Connectivity::default();
    let probe = spawn_probe(connectivity.clone(), cli.probe_config()?);

    let user_list = UserListActor::spawn(
        Some("user-list".to_string()),
        UserListArgs {
            source: Arc::new(client),
            store,
            connectivity: connectivity.clone(),
            config: cli.user_list_config(),
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to start user list: {}", e))?;

    let app_state = AppState {
        user_list: user_list.clone(),
        connectivity,
        start_time: std::time::Instant::now(),
    };

    println!("📡 Serving on http://0.0.0.0:{}", cli.port);
    println!("\nPress Ctrl+C to stop the server\n");

    tokio::select! {
        result = api::serve(app_state, cli.port) => {
            result.context("HTTP server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n🛑 Shutting down...");

            match fetch_snapshot(&user_list, Duration::from_secs(5)).await {
                Ok(snapshot) => {
                    println!("\n📊 Final state:");
                    println!("Users loaded: {} (cursor {})", snapshot.total_users, snapshot.last_user_id);
                    println!("Bookmarks: {}", snapshot.bookmarks.len());
                }
                Err(e) => eprintln!("Failed to get final state: {}", e),
            }
        }
    }

    probe.abort();
    user_list.stop(Some("Shutdown requested".to_string()));
    // Give the actor time to run post_stop
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("✅ Stopped");
    Ok(())
}
