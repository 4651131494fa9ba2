use careboard::api::ApiContext;
use careboard::{api, config, db, init_tracing};

#[tokio::main]
async fn main() {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config::data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!("Cannot create data directory {}: {e}", data_dir.display());
        std::process::exit(1);
    }

    // Open once at boot so migrations run before the first request.
    let db_path = config::database_path();
    match db::sqlite::open_database(&db_path) {
        Ok(_) => tracing::info!(path = %db_path.display(), "Database ready"),
        Err(e) => {
            tracing::error!("Cannot open database {}: {e}", db_path.display());
            std::process::exit(1);
        }
    }

    let ctx = ApiContext::new(db_path);
    if let Err(e) = api::server::run(ctx, config::bind_addr()).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
