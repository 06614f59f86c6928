use crate::schema::class_sync_requests;
use diesel::prelude::*;
use serde::Serialize;

pub const SYNC_PENDING: &str = "pending";

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct ClassRecordRow {
    pub id: i64,
    pub class_id: String,
    pub title: String,
    pub discipline: String,
    pub duration_minutes: i32,
    pub instructor: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = class_sync_requests)]
pub struct NewSyncRequest {
    pub class_id: String,
    pub status: String,
    // requested_at has a DB default (CURRENT_TIMESTAMP)
}

/// Outcome of a bulk enqueue of class references for background sync.
#[derive(Serialize, Debug, Default)]
pub struct EnqueueReport {
    pub found_count: usize,
    pub missing_count: usize,
    pub queued_count: usize,
    pub already_queued_count: usize,
    pub missing_ids: Vec<String>,
}
