use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingFilter, BookingInfo, BookingStats, BookingStatus, BookingUpdate, Conversation,
    ConversationMessage, ConversationStatus, MessageRole, StatusCounts,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ── Conversations ──

pub fn get_conversation(conn: &Connection, session_id: &str) -> anyhow::Result<Option<Conversation>> {
    let row = conn
        .query_row(
            "SELECT id, session_id, messages, booking_info, status, created_at, updated_at, completed_at
             FROM conversations WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id, session_id, messages_json, info_json, status, created_at, updated_at, completed_at)) =
        row
    else {
        return Ok(None);
    };

    let messages: Vec<ConversationMessage> = serde_json::from_str(&messages_json)?;
    let booking_info: BookingInfo = serde_json::from_str(&info_json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, session_id = %session_id, "unreadable booking info, starting empty");
        BookingInfo::default()
    });

    Ok(Some(Conversation {
        id,
        session_id,
        messages,
        booking_info,
        status: ConversationStatus::parse(&status),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        completed_at: completed_at.as_deref().map(parse_timestamp),
    }))
}

pub fn save_conversation(conn: &Connection, conv: &Conversation) -> anyhow::Result<()> {
    let messages_json = serde_json::to_string(&conv.messages)?;
    let info_json = serde_json::to_string(&conv.booking_info)?;

    conn.execute(
        "INSERT INTO conversations (id, session_id, messages, booking_info, status, created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(session_id) DO UPDATE SET
           messages = excluded.messages,
           booking_info = excluded.booking_info,
           status = excluded.status,
           updated_at = excluded.updated_at,
           completed_at = excluded.completed_at",
        params![
            conv.id,
            conv.session_id,
            messages_json,
            info_json,
            conv.status.as_str(),
            conv.created_at.to_rfc3339(),
            conv.updated_at.to_rfc3339(),
            conv.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Appends one message to the log. `None` if the session doesn't exist.
pub fn append_message(
    conn: &Connection,
    session_id: &str,
    role: MessageRole,
    content: &str,
) -> anyhow::Result<Option<Conversation>> {
    let tx = conn.unchecked_transaction()?;
    let Some(mut conv) = get_conversation(&tx, session_id)? else {
        return Ok(None);
    };
    conv.push_message(role, content);
    save_conversation(&tx, &conv)?;
    tx.commit()?;
    Ok(Some(conv))
}

pub fn update_booking_info(
    conn: &Connection,
    session_id: &str,
    info: &BookingInfo,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE conversations SET booking_info = ?1, updated_at = ?2 WHERE session_id = ?3",
        params![serde_json::to_string(info)?, Utc::now().to_rfc3339(), session_id],
    )?;
    Ok(count > 0)
}

/// Rewrites the content of the newest assistant message, leaving its
/// position and timestamp alone.
pub fn replace_last_assistant_message(
    conn: &Connection,
    session_id: &str,
    content: &str,
) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let Some(mut conv) = get_conversation(&tx, session_id)? else {
        return Ok(false);
    };
    let Some(last) = conv
        .messages
        .iter_mut()
        .rev()
        .find(|m| m.role == MessageRole::Assistant)
    else {
        return Ok(false);
    };
    last.content = content.to_string();
    conv.updated_at = Utc::now();
    save_conversation(&tx, &conv)?;
    tx.commit()?;
    Ok(true)
}

/// Moves an active conversation to completed. Returns false, changing
/// nothing, when the conversation is missing or no longer active.
pub fn mark_conversation_completed(
    conn: &Connection,
    session_id: &str,
    final_info: &BookingInfo,
) -> anyhow::Result<bool> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute(
        "UPDATE conversations
         SET status = 'completed', booking_info = ?1, completed_at = ?2, updated_at = ?2
         WHERE session_id = ?3 AND status = 'active'",
        params![serde_json::to_string(final_info)?, now, session_id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, session_id, hotel_id, hotel_name, guest_name, guest_email, guest_phone, \
     check_in, check_out, guests, rooms, total_amount, status, special_requests, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            booking.id,
            booking.session_id,
            booking.hotel_id,
            booking.hotel_name,
            booking.guest_name,
            booking.guest_email,
            booking.guest_phone,
            format_date(&booking.check_in),
            format_date(&booking.check_out),
            booking.guests,
            booking.rooms,
            booking.total_amount,
            booking.status.as_str(),
            booking.special_requests,
            booking.created_at.to_rfc3339(),
            booking.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Bookings at a hotel that still hold rooms (pending or confirmed).
pub fn get_active_bookings_for_hotel(conn: &Connection, hotel_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE hotel_id = ?1 AND status IN ('pending', 'confirmed')
         ORDER BY check_in ASC"
    ))?;

    let rows = stmt.query_map(params![hotel_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    let mut push = |clause: &str, value: Box<dyn rusqlite::types::ToSql>| {
        values.push(value);
        clauses.push(format!("{clause} ?{}", values.len()));
    };

    if let Some(session_id) = &filter.session_id {
        push("session_id =", Box::new(session_id.clone()));
    }
    if let Some(hotel_id) = &filter.hotel_id {
        push("hotel_id =", Box::new(hotel_id.clone()));
    }
    if let Some(status) = &filter.status {
        push("status =", Box::new(status.clone()));
    }
    if let Some(email) = &filter.guest_email {
        push("guest_email =", Box::new(email.clone()));
    }
    if let (Some(start), Some(end)) = (&filter.check_in_start, &filter.check_in_end) {
        push("check_in >=", Box::new(format_date(start)));
        push("check_in <=", Box::new(format_date(end)));
    }

    let limit = filter.limit.unwrap_or(100).clamp(1, 500);
    // page and limit are both u32, so the product fits in u64
    let offset = u64::from(filter.page.unwrap_or(1).saturating_sub(1)) * u64::from(limit);

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {where_sql} ORDER BY created_at DESC LIMIT {limit} OFFSET {offset}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking(
    conn: &Connection,
    id: &str,
    update: &BookingUpdate,
) -> anyhow::Result<Option<Booking>> {
    let tx = conn.unchecked_transaction()?;
    let Some(mut booking) = get_booking_by_id(&tx, id)? else {
        return Ok(None);
    };

    if let Some(status) = update.status {
        booking.status = status;
    }
    if let Some(name) = &update.guest_name {
        booking.guest_name = name.clone();
    }
    if let Some(email) = &update.guest_email {
        booking.guest_email = email.clone();
    }
    if let Some(phone) = &update.guest_phone {
        booking.guest_phone = phone.clone();
    }
    if let Some(guests) = update.guests {
        booking.guests = guests.max(1);
    }
    if let Some(requests) = &update.special_requests {
        booking.special_requests = requests.clone();
    }
    booking.updated_at = Utc::now();

    tx.execute(
        "UPDATE bookings SET status = ?1, guest_name = ?2, guest_email = ?3, guest_phone = ?4,
           guests = ?5, special_requests = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            booking.status.as_str(),
            booking.guest_name,
            booking.guest_email,
            booking.guest_phone,
            booking.guests,
            booking.special_requests,
            booking.updated_at.to_rfc3339(),
            id,
        ],
    )?;
    tx.commit()?;
    Ok(Some(booking))
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_booking_stats(
    conn: &Connection,
    created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> anyhow::Result<BookingStats> {
    let (where_sql, bounds) = match created_between {
        Some((start, end)) => (
            "WHERE created_at >= ?1 AND created_at <= ?2",
            vec![start.to_rfc3339(), end.to_rfc3339()],
        ),
        None => ("", vec![]),
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT status, COUNT(*), COALESCE(SUM(total_amount), 0) FROM bookings {where_sql} GROUP BY status"
    ))?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bounds.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut stats = BookingStats::default();
    let mut counts = StatusCounts::default();
    for row in rows {
        let (status, count, revenue) = row?;
        stats.total_bookings += count;
        stats.total_revenue += revenue;
        match BookingStatus::parse(&status) {
            Some(BookingStatus::Pending) => counts.pending += count,
            Some(BookingStatus::Confirmed) => counts.confirmed += count,
            Some(BookingStatus::Cancelled) => counts.cancelled += count,
            Some(BookingStatus::Completed) => counts.completed += count,
            None => {}
        }
    }
    stats.status_counts = counts;
    if stats.total_bookings > 0 {
        stats.average_booking_value = stats.total_revenue / stats.total_bookings as f64;
    }
    Ok(stats)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let check_in: String = row.get(7)?;
    let check_out: String = row.get(8)?;
    let status: String = row.get(12)?;
    let created_at: String = row.get(14)?;
    let updated_at: String = row.get(15)?;

    Ok(Booking {
        id: row.get(0)?,
        session_id: row.get(1)?,
        hotel_id: row.get(2)?,
        hotel_name: row.get(3)?,
        guest_name: row.get(4)?,
        guest_email: row.get(5)?,
        guest_phone: row.get(6)?,
        check_in: NaiveDate::parse_from_str(&check_in, DATE_FORMAT)?,
        check_out: NaiveDate::parse_from_str(&check_out, DATE_FORMAT)?,
        guests: row.get(9)?,
        rooms: row.get(10)?,
        total_amount: row.get(11)?,
        status: BookingStatus::parse(&status).unwrap_or(BookingStatus::Pending),
        special_requests: row.get(13)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn conversation(session_id: &str) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: format!("conv-{session_id}"),
            session_id: session_id.to_string(),
            messages: vec![],
            booking_info: BookingInfo::default(),
            status: ConversationStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn booking(id: &str, hotel_id: &str, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            session_id: "s1".to_string(),
            hotel_id: hotel_id.to_string(),
            hotel_name: "Test Hotel".to_string(),
            guest_name: "Ada".to_string(),
            guest_email: "ada@example.com".to_string(),
            guest_phone: String::new(),
            check_in: date("2024-10-25"),
            check_out: date("2024-10-28"),
            guests: 1,
            rooms: 1,
            total_amount: 300.0,
            status,
            special_requests: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_conversation_round_trip() {
        let conn = setup_db();
        let mut conv = conversation("s1");
        conv.push_message(MessageRole::Assistant, "hello");
        conv.booking_info.location = Some("lagos".to_string());
        save_conversation(&conn, &conv).unwrap();

        let loaded = get_conversation(&conn, "s1").unwrap().unwrap();
        assert_eq!(loaded.id, "conv-s1");
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.booking_info.location.as_deref(), Some("lagos"));
        assert_eq!(loaded.status, ConversationStatus::Active);
        assert!(get_conversation(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_append_message_keeps_order() {
        let conn = setup_db();
        save_conversation(&conn, &conversation("s1")).unwrap();

        append_message(&conn, "s1", MessageRole::User, "one").unwrap();
        append_message(&conn, "s1", MessageRole::Assistant, "two").unwrap();
        let conv = append_message(&conn, "s1", MessageRole::User, "three")
            .unwrap()
            .unwrap();

        let contents: Vec<&str> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(conv
            .messages
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(append_message(&conn, "nope", MessageRole::User, "x")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_replace_last_assistant_message() {
        let conn = setup_db();
        save_conversation(&conn, &conversation("s1")).unwrap();
        append_message(&conn, "s1", MessageRole::Assistant, "raw BOOKING_COMPLETE").unwrap();
        append_message(&conn, "s1", MessageRole::User, "thanks").unwrap();

        assert!(replace_last_assistant_message(&conn, "s1", "clean").unwrap());

        let conv = get_conversation(&conn, "s1").unwrap().unwrap();
        assert_eq!(conv.messages[0].content, "clean");
        assert_eq!(conv.messages[1].content, "thanks");
    }

    #[test]
    fn test_mark_completed_only_once() {
        let conn = setup_db();
        save_conversation(&conn, &conversation("s1")).unwrap();
        let info = BookingInfo {
            hotel_id: Some("LAG001".to_string()),
            ..Default::default()
        };

        assert!(mark_conversation_completed(&conn, "s1", &info).unwrap());
        assert!(!mark_conversation_completed(&conn, "s1", &info).unwrap());

        let conv = get_conversation(&conn, "s1").unwrap().unwrap();
        assert_eq!(conv.status, ConversationStatus::Completed);
        assert!(conv.completed_at.is_some());
        assert_eq!(conv.booking_info.hotel_id.as_deref(), Some("LAG001"));
    }

    #[test]
    fn test_active_bookings_excludes_cancelled() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking("b2", "H1", BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking("b3", "H1", BookingStatus::Cancelled)).unwrap();
        insert_booking(&conn, &booking("b4", "H2", BookingStatus::Pending)).unwrap();

        let active = get_active_bookings_for_hotel(&conn, "H1").unwrap();
        let mut ids: Vec<&str> = active.iter().map(|b| b.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[test]
    fn test_list_bookings_filters() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking("b2", "H2", BookingStatus::Confirmed)).unwrap();

        let all = list_bookings(&conn, &BookingFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = list_bookings(
            &conn,
            &BookingFilter {
                hotel_id: Some("H2".to_string()),
                status: Some("confirmed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b2");
    }

    #[test]
    fn test_list_bookings_paging() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking("b2", "H1", BookingStatus::Pending)).unwrap();

        let page = |page: u32, limit: u32| {
            list_bookings(
                &conn,
                &BookingFilter {
                    page: Some(page),
                    limit: Some(limit),
                    ..Default::default()
                },
            )
            .unwrap()
        };

        assert_eq!(page(1, 1).len(), 1);
        assert_eq!(page(2, 1).len(), 1);
        assert!(page(3, 1).is_empty());
        assert!(page(u32::MAX, 500).is_empty());
        assert!(page(u32::MAX, u32::MAX).is_empty());
    }

    #[test]
    fn test_update_booking_keeps_total() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();

        let updated = update_booking(
            &conn,
            "b1",
            &BookingUpdate {
                status: Some(BookingStatus::Confirmed),
                guest_phone: Some("555-123-4567".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.total_amount, 300.0);

        let stored = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(stored.guest_phone, "555-123-4567");
        assert!(update_booking(&conn, "missing", &BookingUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_booking() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();
        assert!(delete_booking(&conn, "b1").unwrap());
        assert!(!delete_booking(&conn, "b1").unwrap());
    }

    #[test]
    fn test_booking_stats() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "H1", BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking("b2", "H1", BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking("b3", "H1", BookingStatus::Confirmed)).unwrap();

        let stats = get_booking_stats(&conn, None).unwrap();
        assert_eq!(stats.total_bookings, 3);
        assert_eq!(stats.total_revenue, 900.0);
        assert_eq!(stats.status_counts.confirmed, 2);
        assert_eq!(stats.status_counts.pending, 1);
        assert_eq!(stats.average_booking_value, 300.0);
    }
}
