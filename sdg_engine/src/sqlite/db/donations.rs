use chrono::Utc;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Donation, DonationId, DonationStatus, NewDonation, Transition},
    traits::LedgerError,
};

/// Inserts a new donation with status `PENDING`. This is not atomic with anything else; pass `&mut *tx` if you need
/// it to be.
pub async fn insert_donation(donation: NewDonation, conn: &mut SqliteConnection) -> Result<Donation, LedgerError> {
    let rows: Vec<Donation> = sqlx::query_as(
        r#"
            INSERT INTO donations (
                id,
                amount,
                donor_name,
                message,
                payment_method,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $6)
            RETURNING *;
        "#,
    )
    .bind(donation.id)
    .bind(donation.amount)
    .bind(donation.donor_name)
    .bind(donation.message)
    .bind(donation.payment_method)
    .bind(donation.created_at)
    .fetch_all(conn)
    .await?;
    let donation = first_row(rows).ok_or_else(|| LedgerError::DatabaseError("Insert returned no row".into()))?;
    debug!("🗃️ Donation {} of {} from {} recorded", donation.id, donation.amount, donation.donor_name);
    Ok(donation)
}

pub async fn fetch_donation_by_id(
    id: &DonationId,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, sqlx::Error> {
    let donation =
        sqlx::query_as("SELECT * FROM donations WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(donation)
}

/// Returns the donation carrying the given gateway reference. If, against all odds, more than one donation matches,
/// the oldest wins.
pub async fn fetch_donation_by_gateway_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, sqlx::Error> {
    let donation =
        sqlx::query_as("SELECT * FROM donations WHERE gateway_reference = $1 ORDER BY created_at ASC LIMIT 1")
            .bind(reference)
            .fetch_optional(conn)
            .await?;
    Ok(donation)
}

/// Newest first.
pub async fn fetch_recent_donations(limit: u32, conn: &mut SqliteConnection) -> Result<Vec<Donation>, sqlx::Error> {
    let donations = sqlx::query_as("SELECT * FROM donations ORDER BY created_at DESC, rowid DESC LIMIT $1")
        .bind(i64::from(limit))
        .fetch_all(conn)
        .await?;
    Ok(donations)
}

pub async fn assign_gateway_reference(
    id: &DonationId,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Donation, LedgerError> {
    let updated: Vec<Donation> = sqlx::query_as(
        r#"
            UPDATE donations SET gateway_reference = $1, updated_at = $2
            WHERE id = $3 AND status = 'PENDING'
            RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    match first_row(updated) {
        Some(donation) => {
            trace!("🗃️ Donation {id} now has gateway reference {reference}");
            Ok(donation)
        },
        None => match fetch_donation_by_id(id, conn).await? {
            Some(_) => Err(LedgerError::ReferenceLocked(id.clone())),
            None => Err(LedgerError::DonationNotFound(id.clone())),
        },
    }
}

/// Moves a `PENDING` donation to `new_status` in a single compare-and-set statement. If `reference` is supplied, it
/// replaces the gateway reference in the same statement.
///
/// If the statement touches no rows, the donation is read back to tell a repeat (`Unchanged`) from a conflict
/// (`TransitionForbidden`) or a missing record.
pub async fn transition_pending(
    id: &DonationId,
    new_status: DonationStatus,
    reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Transition, LedgerError> {
    let updated: Vec<Donation> = sqlx::query_as(
        r#"
            UPDATE donations SET
                status = $1,
                gateway_reference = COALESCE($2, gateway_reference),
                updated_at = $3
            WHERE id = $4 AND status = 'PENDING'
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(reference)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    if let Some(donation) = first_row(updated) {
        debug!("🗃️ Donation {id} is now {new_status}");
        return Ok(Transition::Applied(donation));
    }
    let existing = fetch_donation_by_id(id, conn).await?.ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;
    match existing.status {
        status if status == new_status => {
            trace!("🗃️ Donation {id} is already {status}. Nothing to do.");
            Ok(Transition::Unchanged(existing))
        },
        DonationStatus::Pending => {
            // The CAS missed, yet the row reads back as pending. Only possible if something else rewrote the row
            // between the two statements.
            error!("🗃️ Donation {id} is pending, but could not be moved to {new_status}");
            Err(LedgerError::DatabaseError(format!("Concurrent modification of donation {id}")))
        },
        status @ (DonationStatus::Success | DonationStatus::Failed) => {
            warn!("🗃️ Donation {id} is {status}. It cannot become {new_status}.");
            Err(LedgerError::TransitionForbidden { id: id.clone(), status, requested: new_status })
        },
    }
}

/// `RETURNING` statements are always read to the end. A statement that is left half-stepped keeps its write
/// uncommitted, and other connections in the pool will not see it.
fn first_row(rows: Vec<Donation>) -> Option<Donation> {
    rows.into_iter().next()
}
