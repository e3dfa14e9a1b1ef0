//! Buyer/seller conversations and their messages.

use sqlx::SqlitePool;

use crate::domain::EntityId;
use crate::error::MarketError;
use crate::persistence::models::{ConversationRow, MessageRow};

const CONVERSATION_COLUMNS: &str =
    "SELECT id, item_id, buyer_id, seller_id, created_at, updated_at FROM conversations";

/// Outcome of [`ChatService::open_conversation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// A conversation for the same item, buyer and seller already existed.
    Existing(ConversationRow),
    /// A new conversation was created.
    Created(ConversationRow),
}

/// Chat storage.
#[derive(Debug, Clone)]
pub struct ChatService {
    pool: SqlitePool,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the conversation about `item_id` between the two users,
    /// creating it on first contact.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure, including
    /// references to unknown items or users.
    pub async fn open_conversation(
        &self,
        item_id: &str,
        buyer_id: &str,
        seller_id: &str,
    ) -> Result<Opened, MarketError> {
        let existing = sqlx::query_as::<_, ConversationRow>(&format!(
            "{CONVERSATION_COLUMNS} WHERE item_id = ? AND buyer_id = ? AND seller_id = ?"
        ))
        .bind(item_id)
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(conversation) = existing {
            return Ok(Opened::Existing(conversation));
        }

        let id = EntityId::generate();
        sqlx::query("INSERT INTO conversations (id, item_id, buyer_id, seller_id) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(item_id)
            .bind(buyer_id)
            .bind(seller_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(conversation_id = %id, item_id, "conversation opened");
        Ok(Opened::Created(self.conversation(id.as_str()).await?))
    }

    /// One conversation.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if it does not exist.
    pub async fn conversation(&self, id: &str) -> Result<ConversationRow, MarketError> {
        sqlx::query_as::<_, ConversationRow>(&format!("{CONVERSATION_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MarketError::not_found("conversation", id))
    }

    /// Conversations the user takes part in, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn user_conversations(&self, user_id: &str) -> Result<Vec<ConversationRow>, MarketError> {
        Ok(sqlx::query_as::<_, ConversationRow>(&format!(
            "{CONVERSATION_COLUMNS} WHERE buyer_id = ?1 OR seller_id = ?1 ORDER BY updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Appends a message and bumps the conversation's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for empty content and
    /// [`MarketError::NotFound`] for an unknown conversation.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<MessageRow, MarketError> {
        if content.trim().is_empty() {
            return Err(MarketError::InvalidRequest("content is required".to_string()));
        }
        let mut tx = self.pool.begin().await?;
        let bumped = sqlx::query("UPDATE conversations SET updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(MarketError::not_found("conversation", conversation_id));
        }

        let id = EntityId::generate();
        sqlx::query("INSERT INTO messages (id, conversation_id, sender_id, content) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(conversation_id)
            .bind(sender_id)
            .bind(content)
            .execute(&mut *tx)
            .await?;
        let message = sqlx::query_as::<_, MessageRow>(
            "SELECT id, conversation_id, sender_id, content, created_at FROM messages WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(message)
    }

    /// Messages of a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<MessageRow>, MarketError> {
        Ok(sqlx::query_as::<_, MessageRow>(
            "SELECT id, conversation_id, sender_id, content, created_at FROM messages
             WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect_in_memory;

    async fn service() -> ChatService {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = [
            "INSERT INTO users (id, name) VALUES ('b', 'Buyer'), ('s', 'Seller')",
            "INSERT INTO items (id, title, price, image_url, seller_id) VALUES ('i', 'Bike', 20000, 'x', 's')",
        ];
        for sql in seed {
            if let Err(e) = sqlx::query(sql).execute(&pool).await {
                panic!("seed failed: {e}");
            }
        }
        ChatService::new(pool)
    }

    #[tokio::test]
    async fn opening_twice_returns_existing_conversation() {
        let svc = service().await;
        let Ok(Opened::Created(first)) = svc.open_conversation("i", "b", "s").await else {
            panic!("expected a new conversation");
        };
        let Ok(Opened::Existing(second)) = svc.open_conversation("i", "b", "s").await else {
            panic!("expected the existing conversation");
        };
        assert_eq!(first.id, second.id);
        assert!(matches!(svc.user_conversations("s").await, Ok(list) if list.len() == 1));
    }

    #[tokio::test]
    async fn messages_are_listed_in_order() {
        let svc = service().await;
        let Ok(Opened::Created(conv)) = svc.open_conversation("i", "b", "s").await else {
            panic!("expected a new conversation");
        };
        assert!(svc.send_message(&conv.id, "b", "Is it still available?").await.is_ok());
        assert!(svc.send_message(&conv.id, "s", "Yes").await.is_ok());

        let Ok(messages) = svc.messages(&conv.id).await else {
            panic!("messages failed");
        };
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["Is it still available?", "Yes"]);
    }

    #[tokio::test]
    async fn sending_to_unknown_conversation_fails() {
        let svc = service().await;
        assert!(matches!(
            svc.send_message("nope", "b", "hello").await,
            Err(MarketError::NotFound { .. })
        ));
        assert!(matches!(svc.conversation("nope").await, Err(MarketError::NotFound { .. })));
    }
}
