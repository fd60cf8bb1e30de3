use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::ConversationStore;
use tutor_core::{ConversationTurn, Result, SessionSummary, StoredMessage, TutorError};

#[derive(Debug, Clone)]
struct Record {
    id: i64,
    turn: ConversationTurn,
}

/// 进程内存版对话存储
///
/// 本地开发和集成测试使用。可以通过 `set_available(false)` 模拟数据库宕机。
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    next_id: Mutex<i64>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 当前保存的全部消息 (按写入顺序)
    pub async fn turns(&self) -> Vec<ConversationTurn> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.turn.clone())
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TutorError::PersistenceError(
                "memory store is unavailable".to_string(),
            ))
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check()
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<i64> {
        self.check()?;
        let mut next_id = self.next_id.lock().await;
        let id = *next_id;
        *next_id += 1;
        self.records.lock().await.push(Record {
            id,
            turn: turn.clone(),
        });
        Ok(id)
    }

    async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<StoredMessage>> {
        self.check()?;
        let records = self.records.lock().await;
        let mut messages: Vec<StoredMessage> = records
            .iter()
            .filter(|r| r.turn.user_id == user_id && r.turn.session_id == session_id)
            .map(|r| StoredMessage {
                id: r.id,
                text: r.turn.text.clone(),
                sender: r.turn.sender,
                timestamp: r.turn.timestamp,
            })
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn clear(&self, user_id: &str, session_id: &str) -> Result<u64> {
        self.check()?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !(r.turn.user_id == user_id && r.turn.session_id == session_id));
        Ok((before - records.len()) as u64)
    }

    async fn sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        self.check()?;
        let records = self.records.lock().await;

        // session_id -> (summary, 最后一条消息时间)
        let mut grouped: HashMap<&str, (SessionSummary, chrono::DateTime<chrono::Utc>)> =
            HashMap::new();
        for r in records.iter().filter(|r| r.turn.user_id == user_id) {
            let entry = grouped.entry(r.turn.session_id.as_str()).or_insert_with(|| {
                (
                    SessionSummary {
                        session_id: r.turn.session_id.clone(),
                        created_at: r.turn.timestamp,
                        message_count: 0,
                    },
                    r.turn.timestamp,
                )
            });
            entry.0.message_count += 1;
            entry.0.created_at = entry.0.created_at.min(r.turn.timestamp);
            entry.1 = entry.1.max(r.turn.timestamp);
        }

        let mut sessions: Vec<_> = grouped.into_values().collect();
        sessions.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(sessions.into_iter().map(|(summary, _)| summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tutor_core::SenderRole;

    fn turn_at(user: &str, session: &str, text: &str, offset_secs: i64) -> ConversationTurn {
        let mut turn = ConversationTurn::user(user, session, text);
        turn.timestamp = Utc::now() + Duration::seconds(offset_secs);
        turn
    }

    #[tokio::test]
    async fn test_append_and_history_flow() {
        let store = MemoryStore::new();
        store.append(&ConversationTurn::user("u1", "s1", "hi")).await.unwrap();
        store
            .append(&ConversationTurn::assistant("u1", "s1", "hello"))
            .await
            .unwrap();
        store.append(&ConversationTurn::user("u2", "s1", "other")).await.unwrap();

        let history = store.history("u1", "s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, SenderRole::User);
        assert_eq!(history[1].text, "hello");
        assert!(history[0].id < history[1].id);
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_session() {
        let store = MemoryStore::new();
        for text in ["a", "b", "c"] {
            store.append(&ConversationTurn::user("u1", "s1", text)).await.unwrap();
        }
        store.append(&ConversationTurn::user("u1", "s2", "keep")).await.unwrap();

        assert_eq!(store.clear("u1", "s1").await.unwrap(), 3);
        assert_eq!(store.clear("u1", "s1").await.unwrap(), 0);
        assert_eq!(store.history("u1", "s2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_most_recent_first_with_counts() {
        let store = MemoryStore::new();
        store.append(&turn_at("u1", "old", "1", -100)).await.unwrap();
        store.append(&turn_at("u1", "old", "2", -90)).await.unwrap();
        store.append(&turn_at("u1", "new", "3", -10)).await.unwrap();
        store.append(&turn_at("u2", "foreign", "4", 0)).await.unwrap();

        let sessions = store.sessions("u1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "new");
        assert_eq!(sessions[1].session_id, "old");
        assert_eq!(sessions[1].message_count, 2);
        assert!(sessions[1].created_at < sessions[0].created_at);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(store.ping().await.unwrap_err().is_persistence());
        assert!(store
            .append(&ConversationTurn::user("u", "s", "x"))
            .await
            .is_err());
        assert!(store.history("u", "s").await.is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
