use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY,
            kind            TEXT NOT NULL,
            owner_id        TEXT,
            name            TEXT NOT NULL,
            participant_ids TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS participants (
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            user_id         TEXT NOT NULL,
            status          TEXT NOT NULL,
            joined_at       TEXT NOT NULL,
            PRIMARY KEY (conversation_id, user_id, status)
        );

        CREATE TABLE IF NOT EXISTS chat_messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            from_user_id    TEXT NOT NULL,
            content         TEXT NOT NULL,
            sent_time       TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation
            ON chat_messages(conversation_id, created_at);
        ",
    )?;

    info!("Record store migrations complete");
    Ok(())
}
