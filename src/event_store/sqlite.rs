// Copyright (c) 2025 - Cowboy AI, Inc.
//! SQLite-backed event store

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, warn};
use uuid::Uuid;

use super::EventStore;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::{DomainEvent, Event, EventRegistry};
use crate::store::codec::{self, encode_timestamp, encode_unsigned};

/// Event store over one `<aggregate>_events` table
#[derive(Debug, Clone)]
pub struct SqliteEventStore<E> {
    table: &'static str,
    registry: EventRegistry<E>,
}

impl<E: DomainEvent> SqliteEventStore<E> {
    /// Store over `table`, decoding with `registry`
    ///
    /// `table` is interpolated into SQL and must be one of the migration's
    /// event tables.
    pub fn new(table: &'static str, registry: EventRegistry<E>) -> Self {
        Self { table, registry }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn registry(&self) -> &EventRegistry<E> {
        &self.registry
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for SqliteEventStore<E> {
    async fn load(
        &self,
        conn: &mut SqliteConnection,
        aggregate_id: Uuid,
        from_version: u64,
    ) -> LedgerResult<Vec<Event<E>>> {
        let sql = format!(
            "SELECT aggregate_id, version, parent_id, event_type, payload, created_at \
             FROM {} WHERE aggregate_id = ? AND version >= ? ORDER BY version ASC",
            self.table
        );

        let mut rows = sqlx::query(&sql)
            .bind(aggregate_id)
            .bind(encode_unsigned("version", from_version)?)
            .fetch(&mut *conn);

        let mut events = Vec::new();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| LedgerError::transaction(format!("load {}", self.table), e))?
        {
            let tag: String = codec::column(&row, "event_type")?;
            let raw: String = codec::column(&row, "payload")?;
            let payload = serde_json::from_str(&raw).map_err(|source| LedgerError::EventUnmarshal {
                event_type: tag.clone(),
                source,
            })?;

            events.push(Event {
                aggregate_id: codec::column(&row, "aggregate_id")?,
                parent_id: codec::column(&row, "parent_id")?,
                version: codec::unsigned_column(&row, "version")?,
                created_at: codec::timestamp_column(&row, "created_at")?,
                payload: self.registry.decode(&tag, payload)?,
            });
        }

        debug!(table = self.table, %aggregate_id, from_version, count = events.len(), "loaded events");
        Ok(events)
    }

    async fn append(&self, conn: &mut SqliteConnection, events: &[Event<E>]) -> LedgerResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {} (aggregate_id, version, parent_id, event_type, payload, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            self.table
        );

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| LedgerError::transaction(format!("begin append to {}", self.table), e))?;

        for event in events {
            let event_type = event.event_type();
            let payload = self.registry.encode(&event.payload)?;

            let result = sqlx::query(&sql)
                .bind(event.aggregate_id)
                .bind(encode_unsigned("version", event.version)?)
                .bind(event.parent_id)
                .bind(event_type.as_str())
                .bind(payload.to_string())
                .bind(encode_timestamp(event.created_at))
                .execute(&mut *tx)
                .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    warn!(
                        table = self.table,
                        aggregate_id = %event.aggregate_id,
                        version = event.version,
                        "event version conflict"
                    );
                    return Err(LedgerError::EventVersionConflict {
                        aggregate_id: event.aggregate_id,
                        version: event.version,
                    });
                }
                Err(e) => {
                    return Err(LedgerError::transaction(
                        format!("append {} to {}", event_type, self.table),
                        e,
                    ))
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::transaction(format!("commit append to {}", self.table), e))?;

        debug!(table = self.table, count = events.len(), "appended events");
        Ok(())
    }

    async fn current_version(
        &self,
        conn: &mut SqliteConnection,
        aggregate_id: Uuid,
    ) -> LedgerResult<u64> {
        let sql = format!(
            "SELECT COALESCE(MAX(version), 0) AS version FROM {} WHERE aggregate_id = ?",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(aggregate_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction(format!("read version from {}", self.table), e))?;
        codec::unsigned_column(&row, "version")
    }

    async fn lock(&self, conn: &mut SqliteConnection, aggregate_id: Uuid) -> LedgerResult<()> {
        let sql = format!(
            "UPDATE {} SET version = version WHERE aggregate_id = ?",
            self.table
        );
        sqlx::query(&sql)
            .bind(aggregate_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction(format!("lock {}", self.table), e))?;
        Ok(())
    }
}
