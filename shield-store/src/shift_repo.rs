use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use shield_core::models::{
    Booking, ClaimResponse, NewNotification, Notification, NotificationType, Personnel, Shift, Venue,
};
use shield_core::repository::{
    BookingRepository, ChatRepository, CheckInRecord, HealthCheck, NotificationRepository,
    PersonnelRepository, RepoResult, ShiftRepository,
};

/// Postgres-backed store talking to the Supabase schema directly.
#[derive(Clone)]
pub struct PgShieldStore {
    pool: PgPool,
}

impl PgShieldStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SHIFT_COLUMNS: &str = "id, booking_id, role, hourly_rate::float8 AS hourly_rate, \
    scheduled_start, scheduled_end, personnel_id, check_in_time, \
    check_in_latitude::float8 AS check_in_latitude, check_in_longitude::float8 AS check_in_longitude, \
    check_in_address, check_out_time, total_hours::float8 AS total_hours";

#[derive(sqlx::FromRow)]
struct ShiftRow {
    id: Uuid,
    booking_id: Uuid,
    role: String,
    hourly_rate: f64,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    personnel_id: Option<Uuid>,
    check_in_time: Option<DateTime<Utc>>,
    check_in_latitude: Option<f64>,
    check_in_longitude: Option<f64>,
    check_in_address: Option<String>,
    check_out_time: Option<DateTime<Utc>>,
    total_hours: Option<f64>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            id: row.id,
            booking_id: row.booking_id,
            role: row.role,
            hourly_rate: row.hourly_rate,
            scheduled_start: row.scheduled_start,
            scheduled_end: row.scheduled_end,
            personnel_id: row.personnel_id,
            check_in_time: row.check_in_time,
            check_in_latitude: row.check_in_latitude,
            check_in_longitude: row.check_in_longitude,
            check_in_address: row.check_in_address,
            check_out_time: row.check_out_time,
            total_hours: row.total_hours,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    notification_type: String,
    title: String,
    body: String,
    data: Option<serde_json::Value>,
    read: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            notification_type: NotificationType::parse(&row.notification_type)
                .unwrap_or(NotificationType::Message),
            title: row.title,
            body: row.body,
            data: row.data.unwrap_or(serde_json::Value::Null),
            read: row.read.unwrap_or(false),
            created_at: row.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl ShiftRepository for PgShieldStore {
    async fn list_open_shifts(&self, now: DateTime<Utc>) -> RepoResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts WHERE personnel_id IS NULL AND scheduled_start >= $1 ORDER BY scheduled_start",
            SHIFT_COLUMNS
        );
        let rows: Vec<ShiftRow> = sqlx::query_as(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Shift::from).collect())
    }

    async fn get_shift(&self, id: Uuid) -> RepoResult<Option<Shift>> {
        let sql = format!("SELECT {} FROM shifts WHERE id = $1", SHIFT_COLUMNS);
        let row: Option<ShiftRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Shift::from))
    }

    async fn list_personnel_shifts(&self, personnel_id: Uuid) -> RepoResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts WHERE personnel_id = $1 ORDER BY scheduled_start",
            SHIFT_COLUMNS
        );
        let rows: Vec<ShiftRow> = sqlx::query_as(&sql)
            .bind(personnel_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Shift::from).collect())
    }

    async fn claim_shift(&self, shift_id: Uuid, personnel_id: Uuid) -> RepoResult<ClaimResponse> {
        let result: serde_json::Value = sqlx::query_scalar("SELECT claim_shift($1, $2)")
            .bind(shift_id)
            .bind(personnel_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(serde_json::from_value(result)?)
    }

    async fn record_check_in(&self, shift_id: Uuid, check_in: &CheckInRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE shifts
            SET check_in_time = $2, check_in_latitude = $3, check_in_longitude = $4, check_in_address = $5
            WHERE id = $1
            "#,
        )
        .bind(shift_id)
        .bind(check_in.at)
        .bind(check_in.latitude)
        .bind(check_in.longitude)
        .bind(&check_in.address)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_check_out(&self, shift_id: Uuid, at: DateTime<Utc>, total_hours: f64) -> RepoResult<()> {
        sqlx::query("UPDATE shifts SET check_out_time = $2, total_hours = $3 WHERE id = $1")
            .bind(shift_id)
            .bind(at)
            .bind(total_hours)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BookingRepository for PgShieldStore {
    async fn get_bookings(&self, ids: &[Uuid]) -> RepoResult<Vec<Booking>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Uuid, String)> =
            sqlx::query_as("SELECT id, venue_id, event_name FROM bookings WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, venue_id, event_name)| Booking { id, venue_id, event_name })
            .collect())
    }

    async fn get_venues(&self, ids: &[Uuid]) -> RepoResult<Vec<Venue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, String, Uuid)> =
            sqlx::query_as("SELECT id, name, owner_user_id FROM venues WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, owner_user_id)| Venue { id, name, owner_user_id })
            .collect())
    }
}

#[async_trait]
impl PersonnelRepository for PgShieldStore {
    async fn get_personnel(&self, id: Uuid) -> RepoResult<Option<Personnel>> {
        let row: Option<(Uuid, Uuid, String)> =
            sqlx::query_as("SELECT id, user_id, display_name FROM personnel WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, user_id, display_name)| Personnel { id, user_id, display_name }))
    }

    async fn get_personnel_by_user(&self, user_id: Uuid) -> RepoResult<Option<Personnel>> {
        let row: Option<(Uuid, Uuid, String)> =
            sqlx::query_as("SELECT id, user_id, display_name FROM personnel WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, user_id, display_name)| Personnel { id, user_id, display_name }))
    }
}

#[async_trait]
impl NotificationRepository for PgShieldStore {
    async fn insert_notification(&self, notification: &NewNotification) -> RepoResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (user_id, type, title, body, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, type, title, body, data, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 50
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }
}

#[async_trait]
impl ChatRepository for PgShieldStore {
    async fn create_mission_control_chat(&self, booking_id: Uuid) -> RepoResult<Uuid> {
        let chat_id: Uuid = sqlx::query_scalar("SELECT create_mission_control_chat($1)")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(chat_id)
    }
}

#[async_trait]
impl HealthCheck for PgShieldStore {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
