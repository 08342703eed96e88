use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::Mutex;

mod components;
mod config;
mod controllers;
mod errors;
mod htmx;
mod middleware;
mod models;
mod note_list;
mod routes;
mod store;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let config = config::Config::from_env()?;
    let store = create_store(&config.store).await?;
    let mut notes = note_list::NoteList::new(store);
    if !notes.list().await {
        log::warn!("starting with an empty note list");
    }

    let state = models::AppState {
        notes: Arc::new(Mutex::new(notes)),
    };
    let app = routes::app(state);

    log::info!("listening on {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn create_store(
    store_config: &config::StoreConfig,
) -> Result<Arc<dyn store::NoteStore>> {
    let note_store: Arc<dyn store::NoteStore> = match store_config {
        config::StoreConfig::Memory => {
            log::warn!("using the in-memory store; notes will not survive a restart");
            Arc::new(store::MemoryStore::new())
        }
        config::StoreConfig::Postgres { url } => {
            let pg =
                store::PgStore::connect(url, config::PG_MAX_CONNECTIONS).await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
    };

    Ok(note_store)
}
