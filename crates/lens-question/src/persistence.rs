use crate::card::{Card, CardId};
use crate::error::{QuestionError, Result};
use crate::question::Question;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One entry of a card's revision history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub description: Option<String>,
    pub is_creation: bool,
    pub is_reversion: bool,
    pub timestamp: DateTime<Utc>,
}

/// Storage for cards. Results are passed back to callers without being
/// interpreted here.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn create_card(&self, card: &Card) -> Result<Card>;

    async fn update_card(&self, card: &Card) -> Result<Card>;

    async fn revert_card(&self, card_id: CardId, revision_id: i64) -> Result<Card>;

    /// Toggle public sharing; returns the public UUID when enabled
    async fn set_public_sharing(&self, card_id: CardId, enabled: bool) -> Result<Option<Uuid>>;

    async fn history(&self, card_id: CardId) -> Result<Vec<Revision>>;
}

impl Question {
    fn saved_id(&self) -> Result<CardId> {
        self.id().ok_or(QuestionError::NotSaved)
    }

    /// Persist as a new card
    pub async fn save(&self, store: &dyn CardStore) -> Result<Question> {
        debug!("Creating card from question");
        let card = store.create_card(self.card()).await?;
        Ok(self.set_card(card))
    }

    /// Persist changes to the existing card
    pub async fn update(&self, store: &dyn CardStore) -> Result<Question> {
        let card_id = self.saved_id()?;
        debug!("Updating card {}", card_id);
        let card = store.update_card(self.card()).await?;
        Ok(self.set_card(card))
    }

    pub async fn revert(&self, store: &dyn CardStore, revision_id: i64) -> Result<Question> {
        let card_id = self.saved_id()?;
        debug!("Reverting card {} to revision {}", card_id, revision_id);
        let card = store.revert_card(card_id, revision_id).await?;
        Ok(self.set_card(card))
    }

    pub async fn enable_sharing(&self, store: &dyn CardStore) -> Result<Question> {
        let card_id = self.saved_id()?;
        let public_uuid = store.set_public_sharing(card_id, true).await?;
        Ok(self.set_card(self.card().with_public_uuid(public_uuid)))
    }

    pub async fn disable_sharing(&self, store: &dyn CardStore) -> Result<Question> {
        let card_id = self.saved_id()?;
        store.set_public_sharing(card_id, false).await?;
        Ok(self.set_card(self.card().with_public_uuid(None)))
    }

    pub async fn history(&self, store: &dyn CardStore) -> Result<Vec<Revision>> {
        let card_id = self.saved_id()?;
        store.history(card_id).await
    }
}
