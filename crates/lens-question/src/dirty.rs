use crate::question::Question;
use crate::url::UrlOptions;
use tracing::{debug, warn};

impl Question {
    /// Whether this question has meaningful edits relative to `original`.
    ///
    /// Unsaved questions are dirty once they hold user-entered content.
    /// Saved questions are dirty when their URL token (without lineage)
    /// differs from the original's token (with lineage). The comparison is
    /// on the token string, so it follows the cleaning rules exactly.
    pub fn is_dirty_compared_to(&self, original: Option<&Question>) -> bool {
        let Some(dataset_query) = self.dataset_query() else {
            return false;
        };

        if !self.is_saved() {
            let dirty = dataset_query.has_user_content();
            debug!("Unsaved question dirty: {}", dirty);
            return dirty;
        }

        let Some(original) = original else {
            debug!("Saved question {:?} has no original to compare", self.id());
            return true;
        };

        let current = self.serialize_for_url(UrlOptions::without_original_card_id());
        let reference = original.serialize_for_url(UrlOptions::default());

        match (current, reference) {
            (Ok(current), Ok(reference)) => {
                let dirty = current != reference;
                debug!("Saved question {:?} dirty: {}", self.id(), dirty);
                dirty
            }
            (current, reference) => {
                warn!(
                    "Could not serialize questions for dirty check: {:?} / {:?}",
                    current.err(),
                    reference.err()
                );
                true
            }
        }
    }
}
