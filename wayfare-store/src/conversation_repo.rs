use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use wayfare_core::conversation::{Conversation, MessageRole, NewMessage, StoredMessage};
use wayfare_core::repository::{ConversationRepository, RepoError};

pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: Option<String>,
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: String,
    content: String,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

fn message_from_row(row: MessageRow) -> Result<StoredMessage, RepoError> {
    let role = MessageRole::parse(&row.role)
        .ok_or_else(|| format!("unknown message role in store: {}", row.role))?;
    Ok(StoredMessage {
        id: row.id,
        conversation_id: row.conversation_id,
        role,
        content: row.content,
        metadata: row.metadata,
        created_at: row.created_at,
    })
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<Conversation, RepoError> {
        let row: ConversationRow = sqlx::query_as(
            r#"
            INSERT INTO conversations (id, user_id, title)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, RepoError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Conversation::from))
    }

    async fn append_message(&self, message: &NewMessage) -> Result<StoredMessage, RepoError> {
        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, role, content, metadata, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.metadata)
        .fetch_one(&self.pool)
        .await?;

        message_from_row(row)
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<StoredMessage>, RepoError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, role, content, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }
}
