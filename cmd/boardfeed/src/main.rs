//! # boardfeed
//!
//! Runs one feed query and prints the result as JSON.
//!
//! ```bash
//! boardfeed list --board free --keyword rust --option tag
//! boardfeed view --board free --post 27 --viewer 2 --hit
//! RUST_LOG=debug boardfeed home --memory
//! ```

mod args;
mod demo;

use std::sync::Arc;

use anyhow::Context;
use configs::{LogSettings, Settings};
use domains::Uid;
use serde::Serialize;
use services::{CommentQuery, FeedService, HomeQuery, ListQuery, Ports, SearchOption, ViewQuery};
use tracing_subscriber::EnvFilter;

use args::{Args, USAGE};

fn install_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boardfeed={0},services={0}", log.level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn memory_ports() -> Ports {
    let store = Arc::new(demo::seed());
    Ports {
        boards: store.clone(),
        users: store.clone(),
        posts: store.clone(),
        comments: store.clone(),
        access: store.clone(),
        files: store,
    }
}

#[cfg(feature = "db-postgres")]
async fn postgres_store(settings: &Settings) -> anyhow::Result<storage_adapters::PgStore> {
    use secrecy::ExposeSecret;

    let url = settings
        .database
        .url
        .as_ref()
        .context("database.url is not set (BOARDFEED__DATABASE__URL)")?;
    storage_adapters::PgStore::connect(url.expose_secret(), settings.database.max_connections)
        .await
}

#[cfg(feature = "db-postgres")]
async fn ports(settings: &Settings, args: &Args) -> anyhow::Result<Ports> {
    if args.switch("memory") {
        return Ok(memory_ports());
    }
    let store = Arc::new(postgres_store(settings).await?);
    Ok(Ports {
        boards: store.clone(),
        users: store.clone(),
        posts: store.clone(),
        comments: store.clone(),
        access: store,
        files: Arc::new(storage_adapters::LocalFileResolver::new(&settings.feed.upload_root)),
    })
}

#[cfg(feature = "db-postgres")]
async fn install_schema(settings: &Settings) -> anyhow::Result<()> {
    postgres_store(settings).await?.install_schema().await?;
    tracing::info!("schema installed");
    Ok(())
}

#[cfg(not(feature = "db-postgres"))]
async fn install_schema(_settings: &Settings) -> anyhow::Result<()> {
    anyhow::bail!("built without the db-postgres feature")
}

#[cfg(not(feature = "db-postgres"))]
async fn ports(_settings: &Settings, _args: &Args) -> anyhow::Result<Ports> {
    Ok(memory_ports())
}

async fn board_uid(service: &FeedService, args: &Args) -> anyhow::Result<Uid> {
    match args.text("board") {
        Some(slug) => Ok(service.board_uid(slug).await?),
        None => Ok(0),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(service: &FeedService, args: &Args) -> anyhow::Result<()> {
    let board_uid = board_uid(service, args).await?;
    let viewer_uid: Uid = args.value("viewer")?;
    match args.command.as_str() {
        "list" => {
            let query = ListQuery {
                board_uid,
                keyword: args.text("keyword").unwrap_or_default().to_string(),
                option: args.value::<SearchOption>("option")?,
                page: args.value("page")?,
                bunch: args.value("bunch")?,
                since_uid: args.value("since-uid")?,
                direction: args.value("direction")?,
                viewer_uid,
            };
            print(&service.list_board(&query).await?)
        }
        "view" => {
            let query = ViewQuery {
                board_uid,
                post_uid: args.value("post")?,
                viewer_uid,
                update_hit: args.switch("hit"),
                latest_limit: match args.text("latest") {
                    Some(_) => args.value("latest")?,
                    None => service.config().writer_latest_limit,
                },
            };
            print(&service.view_post(&query).await?)
        }
        "comments" => {
            let query = CommentQuery {
                board_uid,
                post_uid: args.value("post")?,
                since_uid: args.value("since-uid")?,
                direction: args.value("direction")?,
                bunch: args.value("bunch")?,
                viewer_uid,
            };
            print(&service.list_comments(&query).await?)
        }
        "home" => {
            let query = HomeQuery {
                board_uid,
                bunch: args.value("bunch")?,
                since_uid: args.value("since-uid")?,
                direction: args.value("direction")?,
                viewer_uid,
            };
            print(&service.home_feed(&query).await?)
        }
        other => anyhow::bail!("unknown command '{other}'\n\n{USAGE}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    install_tracing(&settings.log);

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if args.command == "schema" {
        return install_schema(&settings).await;
    }

    let service = FeedService::new(ports(&settings, &args).await?, settings.feed.engine());
    tracing::debug!(command = %args.command, "running query");
    run(&service, &args).await
}
