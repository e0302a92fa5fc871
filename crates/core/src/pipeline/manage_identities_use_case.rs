use std::sync::Arc;

use crate::detection::domain::detection_engine::{DetectionEngine, EnrolledIdentity};
use crate::detection::domain::engine_error::EngineError;

/// Lists and removes enrolled identities. Removal only ever happens
/// through an explicit call here.
pub struct ManageIdentitiesUseCase {
    engine: Arc<dyn DetectionEngine>,
}

impl ManageIdentitiesUseCase {
    pub fn new(engine: Arc<dyn DetectionEngine>) -> Self {
        Self { engine }
    }

    /// Identities of `collection`, sorted by name.
    pub fn list(&self, collection: &str) -> Result<Vec<EnrolledIdentity>, EngineError> {
        let mut identities = self.engine.list_identities(collection)?;
        identities.sort_by(|a, b| a.identity.cmp(&b.identity).then_with(|| a.uuid.cmp(&b.uuid)));
        log::debug!("{} identities enrolled in {collection}", identities.len());
        Ok(identities)
    }

    pub fn remove(&self, identity: &str, collection: &str) -> Result<(), EngineError> {
        match self.engine.remove(identity, collection) {
            Ok(()) => {
                log::info!("Removed {identity} from {collection}");
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not remove {identity} from {collection}: {e}");
                Err(e)
            }
        }
    }
}
