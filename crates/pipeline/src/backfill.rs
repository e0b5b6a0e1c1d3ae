//! Post-answer entity backfill.
//!
//! When routing could not name the entity a conversation is about, the
//! finished answer often can. Backfill runs after the stream completes,
//! off the request path, and writes `last_entity` so the *next* follow-up
//! resolves locally. It never delays a response and its failures are
//! contained — worst case, the next pronoun costs a resolver call.

use crate::router::QueryRouter;
use ragline_core::memory::{ConversationStore, UserId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Extract an entity from `answer` and remember it for `user`.
///
/// Detached: the returned handle exists for tests; production callers
/// drop it. The task holds only clones, so a finished request keeps
/// nothing else alive.
pub fn spawn_backfill(
    router: Arc<QueryRouter>,
    store: Arc<dyn ConversationStore>,
    user: UserId,
    answer: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match router.extract_entity_name(&answer).await {
            Some(name) => {
                debug!(user = %user, entity = %name, "backfilled entity from answer");
                store.set_entity(&user, &name);
            }
            None => {
                debug!(user = %user, "no entity found in answer, memory unchanged");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationMemory;
    use crate::test_helpers::{FailingResolver, ScriptedResolver};

    #[tokio::test]
    async fn backfill_writes_extracted_entity() {
        let router = Arc::new(QueryRouter::new(Arc::new(FailingResolver)));
        let memory = Arc::new(ConversationMemory::default());
        let user = UserId::from("u1");

        spawn_backfill(
            router,
            memory.clone(),
            user.clone(),
            "Maria Lopez leads the finance organization.".into(),
        )
        .await
        .unwrap();

        let record = memory.get(&user);
        assert_eq!(record.last_entity.as_deref(), Some("Maria Lopez"));
    }

    #[tokio::test]
    async fn backfill_leaves_memory_alone_when_nothing_found() {
        let router = Arc::new(QueryRouter::new(Arc::new(ScriptedResolver::replying("NONE"))));
        let memory = Arc::new(ConversationMemory::default());
        let user = UserId::from("u1");
        memory.set_query(&user, "what is the refund policy?");

        spawn_backfill(
            router,
            memory.clone(),
            user.clone(),
            "refunds are allowed within thirty days of purchase".into(),
        )
        .await
        .unwrap();

        let record = memory.get(&user);
        assert!(record.last_entity.is_none());
        assert_eq!(
            record.last_query.as_deref(),
            Some("what is the refund policy?")
        );
    }

    #[tokio::test]
    async fn backfill_survives_resolver_failure() {
        let router = Arc::new(QueryRouter::new(Arc::new(FailingResolver)));
        let memory = Arc::new(ConversationMemory::default());
        let user = UserId::from("u1");

        // No capitalized name and a failing resolver: the task must still
        // finish cleanly.
        spawn_backfill(
            router,
            memory.clone(),
            user.clone(),
            "the team handles quarterly planning".into(),
        )
        .await
        .unwrap();

        assert!(memory.get(&user).last_entity.is_none());
    }
}
