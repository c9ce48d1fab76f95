use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Message, MessageContent, MessageId, MessageKind, MessageRepository, NewMessage,
    NewParticipant, Participant, ParticipantId, ParticipantName, ParticipantRepository,
    RepositoryError, RepositoryResult, Timestamp,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    id: Uuid,
    name: String,
    last_activity: Timestamp,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name = ParticipantName::parse(&value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant {
            id: ParticipantId::from(value.id),
            name,
            last_activity: value.last_activity,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    body: String,
    kind: String,
    sent_time: String,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let kind = value
            .kind
            .parse::<MessageKind>()
            .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            from: value.sender,
            to: value.recipient,
            text: value.body,
            kind,
            time: value.sent_time,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn insert(&self, participant: NewParticipant) -> RepositoryResult<ParticipantId> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO participants (name, last_activity) VALUES ($1, $2) RETURNING id"#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_activity)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ParticipantId::from(id))
    }

    async fn find_by_name(
        &self,
        name: &ParticipantName,
    ) -> RepositoryResult<Option<Participant>> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT id, name, last_activity FROM participants WHERE name = $1"#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT id, name, last_activity FROM participants ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn list_inactive_since(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT id, name, last_activity FROM participants WHERE last_activity < $1"#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> RepositoryResult<bool> {
        let result = sqlx::query(r#"UPDATE participants SET last_activity = $2 WHERE name = $1"#)
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ParticipantId) -> RepositoryResult<bool> {
        let result = sqlx::query(r#"DELETE FROM participants WHERE id = $1"#)
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO messages (sender, recipient, body, kind, sent_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(MessageId::from(id))
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"SELECT id, sender, recipient, body, kind, sent_time FROM messages WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn list_visible_to(
        &self,
        caller: &ParticipantName,
        limit: Option<u32>,
    ) -> RepositoryResult<Vec<Message>> {
        // 内层按插入顺序倒序取最近的 limit 条，外层恢复正序；LIMIT NULL 即不限
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, body, kind, sent_time
            FROM (
                SELECT id, seq, sender, recipient, body, kind, sent_time
                FROM messages
                WHERE recipient = $1 OR sender = $2 OR recipient = $2
                ORDER BY seq DESC
                LIMIT $3
            ) AS recent
            ORDER BY seq ASC
            "#,
        )
        .bind(domain::BROADCAST_SENTINEL)
        .bind(caller.as_str())
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn update(&self, id: MessageId, content: MessageContent) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"UPDATE messages SET recipient = $2, body = $3, kind = $4 WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .bind(&content.to)
        .bind(&content.text)
        .bind(content.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: MessageId) -> RepositoryResult<bool> {
        let result = sqlx::query(r#"DELETE FROM messages WHERE id = $1"#)
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub participant_repository: Arc<PgParticipantRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            participant_repository: Arc::new(PgParticipantRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
