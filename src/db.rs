use log::{debug, info};
use rusqlite::{named_params, types::ValueRef, Connection, OptionalExtension, Result, Row};

use crate::{
    error::ArchiveError,
    models::{year_from_timestamp, Photo, User},
};

pub const USER_TABLE: &str = "user";
pub const PHOTOS_TABLE: &str = "photos";

/// Creates the archive tables. Archives are produced elsewhere; this is used
/// to build new archives and test fixtures.
pub fn create_tables(con: &Connection) -> Result<()> {
    con.execute_batch(
        "
    CREATE TABLE IF NOT EXISTS user (email TEXT, first_name TEXT, last_name TEXT, timezone TEXT);
    CREATE TABLE IF NOT EXISTS photos (pid BLOB PRIMARY KEY, timestamp INTEGER, year INTEGER, source_type TEXT, source_name TEXT, device_type TEXT, device_name TEXT, backing BLOB);
",
    )?;
    info!("Created archive tables.");
    Ok(())
}

pub(crate) fn check_schema(con: &Connection) -> Result<(), ArchiveError> {
    for table in [USER_TABLE, PHOTOS_TABLE] {
        let found: Option<String> = con
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = :name",
                named_params! { ":name": table },
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(ArchiveError::Schema(table));
        }
    }
    Ok(())
}

pub fn fetch_user(con: &Connection) -> Result<User, ArchiveError> {
    let user = con
        .query_row(
            "SELECT email, first_name, last_name, timezone FROM user LIMIT 1",
            [],
            |row| {
                Ok(User {
                    email: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    timezone: row.get(3)?,
                })
            },
        )
        .optional()?;
    user.ok_or(ArchiveError::MissingUser)
}

pub fn fetch_photos(con: &Connection) -> Result<Vec<Photo>, ArchiveError> {
    let mut stmt = con.prepare(
        "SELECT pid, timestamp, year, source_type, source_name, device_type, device_name, backing
         FROM photos ORDER BY timestamp, pid",
    )?;
    let photos = stmt.query_map([], photo_from_row)?.collect::<Result<Vec<_>>>()?;
    debug!("Fetched {} photo rows", photos.len());
    Ok(photos)
}

fn photo_from_row(row: &Row) -> Result<Photo> {
    let timestamp = number_from_value(row.get_ref(1)?, 1, "timestamp")?;
    let year = match number_from_value(row.get_ref(2)?, 2, "year")? {
        Some(year) => Some(
            i32::try_from(year).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, year))?,
        ),
        None => None,
    };
    Ok(Photo {
        pid: row.get(0)?,
        timestamp,
        year: year.or_else(|| year_from_timestamp(timestamp)).unwrap_or(0),
        source_type: row.get(3)?,
        source_name: row.get(4)?,
        device_type: row.get(5)?,
        device_name: row.get(6)?,
        backing: row.get::<_, Option<Vec<u8>>>(7)?.unwrap_or_default(),
    })
}

/// Numeric columns may have been stored as floating point; fractions are
/// floored.
fn number_from_value(value: ValueRef, column: usize, name: &str) -> Result<Option<i64>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(n) => Ok(Some(n)),
        ValueRef::Real(n) => Ok(Some(n.floor() as i64)),
        other => Err(rusqlite::Error::InvalidColumnType(column, name.to_string(), other.data_type())),
    }
}

pub fn insert_user(con: &Connection, user: &User) -> Result<()> {
    con.execute(
        "INSERT INTO user (email, first_name, last_name, timezone) VALUES (:email, :first, :last, :tz)",
        named_params! {
            ":email": user.email,
            ":first": user.first_name,
            ":last": user.last_name,
            ":tz": user.timezone,
        },
    )?;
    Ok(())
}

pub fn insert_photo(con: &Connection, photo: &Photo) -> Result<()> {
    let mut stmt = con.prepare_cached(
        "INSERT INTO photos (pid, timestamp, year, source_type, source_name, device_type, device_name, backing)
         VALUES (:pid, :ts, :year, :stype, :sname, :dtype, :dname, :backing)",
    )?;
    stmt.execute(named_params! {
        ":pid": photo.pid,
        ":ts": photo.timestamp,
        ":year": photo.year,
        ":stype": photo.source_type,
        ":sname": photo.source_name,
        ":dtype": photo.device_type,
        ":dname": photo.device_name,
        ":backing": photo.backing,
    })?;
    Ok(())
}
