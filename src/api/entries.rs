//! Inner entry endpoints
//!
//! The private ledger: capture, day views, the month summary and the
//! delete/restore pair. There is no edit endpoint on purpose; the routes
//! that would carry one reject the method outright.

use axum::Extension;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::clock;
use crate::clock::Stamp;
use crate::database::CreateEntryValues;
use crate::database::Database;
use crate::entries::Entry;
use crate::entries::validate_body_text;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;
use super::users::fetch_current_user;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub body_text: String,
    pub created_at: NaiveDateTime,
    pub day_key: NaiveDate,
}

impl EntryResponse {
    fn from_entry(entry: Entry) -> Self {
        Self {
            id: entry.id,
            body_text: entry.body_text,
            created_at: entry.created_at,
            day_key: entry.day_key,
        }
    }

    fn from_entry_multiple(mut entries: Vec<Entry>) -> Vec<Self> {
        entries
            .drain(..)
            .map(Self::from_entry)
            .collect::<Vec<Self>>()
    }
}

/// Create entry form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryForm {
    /// The entry text
    ///
    /// No timestamp fields exist on any write form; the server clock is
    /// the only source of instants.
    text: String,
}

/// A created entry plus the server's idea of "now"
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryResponse {
    /// The created entry
    entry: EntryResponse,

    /// The server's current day key at response time
    server_today: NaiveDate,

    /// Did midnight pass between the entry's day key and response time?
    date_changed: bool,
}

/// Create an entry
///
/// The creation instant and the day key come from one clock sample, so an
/// entry written in the last moments of a day is filed consistently. The
/// response reports the server's current day separately, letting a client
/// that sat on the compose box over midnight resynchronize.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "text": "a quiet thought" }' \
///     http://localhost:6000/api/entries
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateEntryForm>,
) -> Result<Success<CreateEntryResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let body_text = validate_body_text(&form.text).map_err(Error::bad_request)?;

    let stamp = Stamp::now();

    let values = CreateEntryValues {
        user: &user,
        body_text: &body_text,
        created_at: stamp.instant(),
        day_key: stamp.day_key(),
    };

    let entry = database
        .create_entry(&values)
        .await
        .map_err(Error::internal_server_error)?;

    // one sample for both: the flag always agrees with the reported day
    let server_today = clock::today();
    let date_changed = entry.day_key != server_today;

    Ok(Success::created(CreateEntryResponse {
        entry: EntryResponse::from_entry(entry),
        server_today,
        date_changed,
    }))
}

/// Entries of one day
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntriesResponse {
    /// The day the entries are filed under
    day: NaiveDate,

    /// The entries, newest first
    entries: Vec<EntryResponse>,
}

/// List today's entries
///
/// "Today" is resolved server-side against the journal timezone.
pub async fn today(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<DayEntriesResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let day = clock::today();

    let entries = database
        .find_entries_by_day(&user, day)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DayEntriesResponse {
        day,
        entries: EntryResponse::from_entry_multiple(entries),
    }))
}

/// Day query
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// The day to list, `YYYY-MM-DD`
    day: String,
}

/// List the entries of an explicit day (archive browsing)
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/entries/by-day?day=2024-06-01'
/// ```
pub async fn by_day(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(query): QueryParameters<DayQuery>,
) -> Result<Success<DayEntriesResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let day = clock::parse_day(&query.day)
        .ok_or_else(|| Error::bad_request("Invalid day format, use YYYY-MM-DD"))?;

    let entries = database
        .find_entries_by_day(&user, day)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DayEntriesResponse {
        day,
        entries: EntryResponse::from_entry_multiple(entries),
    }))
}

/// Month query
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// The month to summarize, `YYYY-MM`
    month: String,
}

/// One day bucket of the month summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCountResponse {
    /// The day
    day: NaiveDate,

    /// Number of entries on that day
    count: i64,
}

/// Per-day entry counts for a month
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummaryResponse {
    /// The month that was summarized
    month: String,

    /// Days that have entries; silent days are absent
    summary: Vec<DayCountResponse>,
}

/// Summarize a month as per-day entry counts
///
/// Feeds calendar density indicators without shipping entry bodies.
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/entries/month-summary?month=2024-06'
/// ```
pub async fn month_summary(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(query): QueryParameters<MonthQuery>,
) -> Result<Success<MonthSummaryResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let (start, end) = clock::parse_month(&query.month)
        .and_then(|(year, month)| clock::month_range(year, month))
        .ok_or_else(|| Error::bad_request("Invalid month format, use YYYY-MM"))?;

    let summary = database
        .month_summary(&user, start, end)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(MonthSummaryResponse {
        month: query.month,
        summary: summary
            .into_iter()
            .map(|bucket| DayCountResponse {
                day: bucket.day_key,
                count: bucket.count,
            })
            .collect(),
    }))
}

/// Soft-delete an entry
///
/// Deliberately not idempotent: deleting an already-deleted entry is a
/// conflict, which is what gives the undo toast its contract.
///
/// Request:
/// ```sh
/// curl -v -XDELETE -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/entries/<uuid>
/// ```
pub async fn delete(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(entry_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    let entry = fetch_owned_entry(&database, &current_user, &entry_id).await?;

    if entry.is_deleted() {
        return Err(Error::conflict("Entry already deleted"));
    }

    let deleted = database
        .soft_delete_entry(&entry)
        .await
        .map_err(Error::internal_server_error)?;

    // a raced second delete loses against the guard
    if !deleted {
        return Err(Error::conflict("Entry already deleted"));
    }

    Ok(Success::<&'static str>::no_content())
}

/// Restore a soft-deleted entry
///
/// The API accepts a restore at any time; the 5 second undo window is a
/// client affordance, not a server rule.
///
/// Request:
/// ```sh
/// curl -v -XPOST -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/entries/<uuid>/restore
/// ```
pub async fn restore(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(entry_id): PathParameters<Uuid>,
) -> Result<Success<EntryResponse>, Error> {
    let entry = fetch_owned_entry(&database, &current_user, &entry_id).await?;

    if !entry.is_deleted() {
        return Err(Error::conflict("Entry is not deleted"));
    }

    let restored = database
        .restore_entry(&entry)
        .await
        .map_err(Error::internal_server_error)?;

    if !restored {
        return Err(Error::conflict("Entry is not deleted"));
    }

    Ok(Success::ok(EntryResponse::from_entry(entry)))
}

/// Reject edits to entries
///
/// Entries are immutable; this is a structural rejection, not a validation
/// failure.
pub async fn reject_update() -> Result<Success<&'static str>, Error> {
    Err(Error::method_not_allowed(
        "Method not allowed, entries can not be modified",
    ))
}

/// Fetch an entry and check it belongs to the caller
///
/// Does not look at the deletion state; delete and restore each have their
/// own rules about it.
async fn fetch_owned_entry(
    database: &Database,
    current_user: &CurrentUser,
    entry_id: &Uuid,
) -> Result<Entry, Error> {
    let entry = database
        .find_single_entry_by_id_unchecked(entry_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Entry not found")), Ok)?;

    if entry.user_id != current_user.user_id {
        return Err(Error::forbidden("Not the owner of this entry"));
    }

    Ok(entry)
}
