use std::sync::Arc;

use yamdb_auth::Hs256TokenCodec;
use yamdb_infra::{InMemoryStore, PostgresStore, Services, Store, StoreError, TracingNotifier};

use crate::config::ApiConfig;

const PG_MAX_CONNECTIONS: u32 = 10;

/// Wire services against Postgres when `DATABASE_URL` is set, in memory otherwise.
pub async fn build_services(config: &ApiConfig) -> Result<Arc<Services>, StoreError> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, PG_MAX_CONNECTIONS).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let codec = Arc::new(Hs256TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl,
    ));

    Ok(Arc::new(Services::new(
        store,
        Arc::new(TracingNotifier),
        codec,
    )))
}
