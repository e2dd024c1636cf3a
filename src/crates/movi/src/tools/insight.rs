//! Dashboard intelligence tools
//!
//! Read-only aggregates over the day's operations. These run their own
//! SQL where no repository method fits.

use serde_json::json;
use sqlx::FromRow;

use crate::db::repositories::{
    today, AuditRepository, BookingRepository, TripRepository, VehicleRepository,
};
use crate::error::Result;
use crate::state::ExecutionResult;
use crate::tools::{payload, ToolInvocation};

/// Today's trips missing a vehicle or a driver
pub async fn get_trips_needing_attention(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trips = TripRepository::needing_attention(&inv.db, &today()).await?;
    Ok(ExecutionResult {
        message: format!("{} trip(s) need attention today", trips.len()),
        data: payload::table(&trips),
    })
}

#[derive(Debug, FromRow)]
struct SummaryCounts {
    trips: i64,
    cancelled: i64,
    in_progress: i64,
    bookings: i64,
}

/// Operational summary for today
pub async fn get_today_summary(inv: ToolInvocation) -> Result<ExecutionResult> {
    let date = today();
    let counts = sqlx::query_as::<_, SummaryCounts>(
        "SELECT
            COUNT(*) AS trips,
            COALESCE(SUM(CASE WHEN live_status = 'CANCELLED' THEN 1 ELSE 0 END), 0) AS cancelled,
            COALESCE(SUM(CASE WHEN live_status = 'IN_PROGRESS' THEN 1 ELSE 0 END), 0) AS in_progress,
            (SELECT COUNT(*) FROM bookings b
             JOIN trips t2 ON t2.id = b.trip_id
             WHERE t2.trip_date = ?1 AND b.status = 'ACTIVE') AS bookings
         FROM trips WHERE trip_date = ?1",
    )
    .bind(&date)
    .fetch_one(&inv.db)
    .await?;
    let unassigned = TripRepository::needing_attention(&inv.db, &date).await?.len();

    Ok(ExecutionResult {
        message: format!(
            "{} trips today, {} active booking(s), {} needing attention",
            counts.trips, counts.bookings, unassigned
        ),
        data: payload::object(&json!({
            "date": date,
            "trips": counts.trips,
            "cancelled": counts.cancelled,
            "in_progress": counts.in_progress,
            "active_bookings": counts.bookings,
            "needing_attention": unassigned,
        })),
    })
}

/// Recent audit-log entries
pub async fn get_recent_changes(inv: ToolInvocation) -> Result<ExecutionResult> {
    let limit = inv.opt_i64("limit").unwrap_or(20).clamp(1, 100);
    let entries = AuditRepository::recent(&inv.db, limit).await?;
    Ok(ExecutionResult {
        message: format!("{} recent change(s)", entries.len()),
        data: payload::table(&entries),
    })
}

/// Offices generating the most bookings
pub async fn get_high_demand_offices(inv: ToolInvocation) -> Result<ExecutionResult> {
    let limit = inv.opt_i64("limit").unwrap_or(5).clamp(1, 50);
    let offices = BookingRepository::office_demand(&inv.db, limit).await?;
    Ok(ExecutionResult {
        message: format!("Top {} office(s) by demand", offices.len()),
        data: payload::table(&offices),
    })
}

/// Vehicles with the most deployments
pub async fn get_most_used_vehicles(inv: ToolInvocation) -> Result<ExecutionResult> {
    let limit = inv.opt_i64("limit").unwrap_or(5).clamp(1, 50);
    let ranking = VehicleRepository::usage_ranking(&inv.db, limit).await?;
    Ok(ExecutionResult {
        message: format!("Top {} vehicle(s) by usage", ranking.len()),
        data: payload::table(&ranking),
    })
}

/// Trips with more active bookings than seats
pub async fn detect_overbooking(inv: ToolInvocation) -> Result<ExecutionResult> {
    let overbooked = BookingRepository::overbooked(&inv.db).await?;
    Ok(ExecutionResult {
        message: if overbooked.is_empty() {
            "No overbooked trips".to_string()
        } else {
            format!("{} overbooked trip(s)", overbooked.len())
        },
        data: payload::table(&overbooked),
    })
}

#[derive(Debug, serde::Serialize)]
struct ProblemTrip {
    id: i64,
    display_name: String,
    reasons: Vec<String>,
}

/// Trips likely to have trouble today: unstaffed, overbooked, or already
/// flagged DELAYED
pub async fn predict_problem_trips(inv: ToolInvocation) -> Result<ExecutionResult> {
    let date = today();
    let mut problems: Vec<ProblemTrip> = Vec::new();

    for trip in TripRepository::needing_attention(&inv.db, &date).await? {
        problems.push(ProblemTrip {
            id: trip.id,
            display_name: trip.display_name,
            reasons: vec!["missing vehicle or driver".to_string()],
        });
    }
    for over in BookingRepository::overbooked(&inv.db).await? {
        match problems.iter_mut().find(|p| p.id == over.id) {
            Some(existing) => existing.reasons.push(format!(
                "overbooked {}/{}",
                over.bookings, over.capacity
            )),
            None => problems.push(ProblemTrip {
                id: over.id,
                display_name: over.display_name,
                reasons: vec![format!("overbooked {}/{}", over.bookings, over.capacity)],
            }),
        }
    }
    for trip in TripRepository::list_for_date(&inv.db, &date).await? {
        if trip.live_status == "DELAYED" && !problems.iter().any(|p| p.id == trip.id) {
            problems.push(ProblemTrip {
                id: trip.id,
                display_name: trip.display_name,
                reasons: vec!["already delayed".to_string()],
            });
        }
    }

    Ok(ExecutionResult {
        message: format!("{} trip(s) flagged", problems.len()),
        data: payload::table(&problems),
    })
}
