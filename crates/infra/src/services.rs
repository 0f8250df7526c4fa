use std::sync::Arc;

use yamdb_auth::Hs256TokenCodec;

use crate::catalog::Catalog;
use crate::comments::CommentBook;
use crate::identity::IdentityRegistry;
use crate::issuer::ConfirmationIssuer;
use crate::ledger::ReviewLedger;
use crate::notifier::Notifier;
use crate::store::Store;
use crate::tokens::TokenService;

/// Every service wired against one store. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityRegistry,
    pub tokens: TokenService,
    pub ledger: ReviewLedger,
    pub comments: CommentBook,
    pub catalog: Catalog,
    pub codec: Arc<Hs256TokenCodec>,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        codec: Arc<Hs256TokenCodec>,
    ) -> Self {
        Self {
            identity: IdentityRegistry::new(store.clone(), ConfirmationIssuer::new(notifier)),
            tokens: TokenService::new(store.clone(), codec.clone()),
            ledger: ReviewLedger::new(store.clone()),
            comments: CommentBook::new(store.clone()),
            catalog: Catalog::new(store),
            codec,
        }
    }
}
