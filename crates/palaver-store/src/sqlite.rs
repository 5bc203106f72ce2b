use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use palaver_types::models::{
    ChatMessage, Conversation, ConversationKind, Participant, ParticipantStatus,
};

use crate::{RecordStore, StoreError, StoreResult, migrations};

/// SQLite-backed system of record. One connection behind a mutex, WAL mode
/// for concurrent reads; every query hops to the blocking pool so async
/// callers never stall the runtime on disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Record store opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("record store lock poisoned: {}", e))?;
        f(&conn)
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        let joined = tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| StoreError::Storage(anyhow!("blocking task join: {}", e)))?;
        joined.map_err(StoreError::Storage)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        self.run_blocking(move |conn| query_conversation(conn, id))
            .await
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> StoreResult<()> {
        let c = conversation.clone();
        // OR REPLACE: concurrent private creators race to the same
        // deterministic id; last write wins by design.
        self.run_blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO conversations
                 (id, kind, owner_id, name, participant_ids, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    c.id.to_string(),
                    kind_to_str(c.kind),
                    c.owner_id.map(|o| o.to_string()),
                    c.name,
                    serde_json::to_string(&c.participant_ids)?,
                    c.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>> {
        self.run_blocking(move |conn| query_message(conn, id)).await
    }

    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let m = message.clone();
        self.run_blocking(move |conn| {
            conn.execute(
                "INSERT INTO chat_messages
                 (id, conversation_id, from_user_id, content, sent_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    m.id.to_string(),
                    m.conversation_id.to_string(),
                    m.from_user_id.to_string(),
                    m.content,
                    m.sent_time.to_rfc3339(),
                    m.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()> {
        let p = participant.clone();
        self.run_blocking(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO participants
                 (conversation_id, user_id, status, joined_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    p.conversation_id.to_string(),
                    p.user_id.to_string(),
                    status_to_str(p.status),
                    p.joined_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_participants(&self, conversation_id: Uuid) -> StoreResult<Vec<Participant>> {
        self.run_blocking(move |conn| query_participants(conn, conversation_id))
            .await
    }
}

fn query_conversation(conn: &Connection, id: Uuid) -> Result<Option<Conversation>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, owner_id, name, participant_ids, created_at
         FROM conversations WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .optional()?;

    let Some((id, kind, owner_id, name, participant_ids, created_at)) = row else {
        return Ok(None);
    };

    Ok(Some(Conversation {
        id: parse_uuid(&id)?,
        kind: kind_from_str(&kind)?,
        owner_id: owner_id.as_deref().map(parse_uuid).transpose()?,
        name,
        participant_ids: serde_json::from_str(&participant_ids)?,
        created_at: parse_timestamp(&created_at)?,
    }))
}

fn query_message(conn: &Connection, id: Uuid) -> Result<Option<ChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, from_user_id, content, sent_time, created_at
         FROM chat_messages WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .optional()?;

    let Some((id, conversation_id, from_user_id, content, sent_time, created_at)) = row else {
        return Ok(None);
    };

    Ok(Some(ChatMessage {
        id: parse_uuid(&id)?,
        conversation_id: parse_uuid(&conversation_id)?,
        from_user_id: parse_uuid(&from_user_id)?,
        content,
        sent_time: parse_timestamp(&sent_time)?,
        created_at: parse_timestamp(&created_at)?,
    }))
}

fn query_participants(conn: &Connection, conversation_id: Uuid) -> Result<Vec<Participant>> {
    let mut stmt = conn.prepare(
        "SELECT conversation_id, user_id, status, joined_at
         FROM participants WHERE conversation_id = ?1
         ORDER BY joined_at",
    )?;

    let rows = stmt
        .query_map([conversation_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(conversation_id, user_id, status, joined_at)| {
            Ok(Participant {
                conversation_id: parse_uuid(&conversation_id)?,
                user_id: parse_uuid(&user_id)?,
                status: status_from_str(&status)?,
                joined_at: parse_timestamp(&joined_at)?,
            })
        })
        .collect()
}

fn kind_to_str(kind: ConversationKind) -> &'static str {
    match kind {
        ConversationKind::Private => "private",
        ConversationKind::Group => "group",
    }
}

fn kind_from_str(s: &str) -> Result<ConversationKind> {
    match s {
        "private" => Ok(ConversationKind::Private),
        "group" => Ok(ConversationKind::Group),
        other => Err(anyhow!("unknown conversation kind: {}", other)),
    }
}

fn status_to_str(status: ParticipantStatus) -> &'static str {
    match status {
        ParticipantStatus::Requested => "requested",
        ParticipantStatus::Joined => "joined",
    }
}

fn status_from_str(s: &str) -> Result<ParticipantStatus> {
    match s {
        "requested" => Ok(ParticipantStatus::Requested),
        "joined" => Ok(ParticipantStatus::Joined),
        other => Err(anyhow!("unknown participant status: {}", other)),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse().map_err(|e| anyhow!("corrupt id '{}': {}", s, e))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("corrupt timestamp '{}': {}", s, e))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversation() -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            kind: ConversationKind::Group,
            owner_id: Some(Uuid::new_v4()),
            name: "trip planning".into(),
            participant_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn conversation_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conversation = sample_conversation();

        store.insert_conversation(&conversation).await.unwrap();
        let fetched = store
            .get_conversation(conversation.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.id, conversation.id);
        assert_eq!(fetched.kind, conversation.kind);
        assert_eq!(fetched.participant_ids, conversation.participant_ids);
    }

    #[tokio::test]
    async fn missing_conversation_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(
            store
                .get_conversation(Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn message_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            from_user_id: Uuid::new_v4(),
            content: "hi".into(),
            sent_time: Utc::now(),
            created_at: Utc::now(),
        };

        store.insert_message(&message).await.unwrap();
        let fetched = store.get_message(message.id).await.unwrap().unwrap();

        assert_eq!(fetched.content, "hi");
        assert_eq!(fetched.conversation_id, message.conversation_id);
    }

    #[tokio::test]
    async fn duplicate_membership_rows_collapse() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conversation = sample_conversation();
        store.insert_conversation(&conversation).await.unwrap();

        let participant = Participant {
            conversation_id: conversation.id,
            user_id: Uuid::new_v4(),
            status: ParticipantStatus::Joined,
            joined_at: Utc::now(),
        };
        store.insert_participant(&participant).await.unwrap();
        store.insert_participant(&participant).await.unwrap();

        let rows = store.list_participants(conversation.id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
