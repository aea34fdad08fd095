//! Packed 5-byte file date/time

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{MgtError, Result};

/// Date/time packing used when writing directory entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Day, month, 2-digit year, hour, minute
    MasterDos,
    /// Day, month, year - 1900, hour, minute
    Bdos,
    /// BDOS 1.7a and later: as `Bdos` with seconds packed into spare bits
    Bdos17,
}

/// Unpack a 5-byte date/time
///
/// Entries without a valid date decode as `None`, as do dates that are
/// out of range for the calendar.
pub fn unpack_time(data: &[u8]) -> Option<NaiveDateTime> {
    if data.len() < 5 || data[0] == 0xff {
        return None;
    }

    let (day, month, year) = (data[0] as u32, data[1] as u32, data[2] as i32);
    let (month, hours, mins, secs) = if data[1] & 0x80 != 0 {
        (
            (month & 0x78) >> 3,
            (data[3] as u32 & 0xf8) >> 3,
            ((data[4] as u32 & 0xe0) >> 2) | (data[3] as u32 & 0x07),
            (data[4] as u32 & 0x1f) << 1,
        )
    } else {
        (month, data[3] as u32, data[4] as u32, 0)
    };

    let year = year + 1900 + if year < 80 { 100 } else { 0 };
    let time = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hours, mins, secs));

    if time.is_none() {
        log::warn!("ignoring invalid file date/time {:02x?}", &data[..5]);
    }
    time
}

/// Pack a date/time into 5 bytes, all zero when absent
pub fn pack_time(time: Option<NaiveDateTime>, format: TimeFormat) -> Result<[u8; 5]> {
    let time = match time {
        Some(time) => time,
        None => return Ok([0; 5]),
    };

    let (day, month) = (time.day() as u8, time.month() as u8);
    let (hour, minute) = (time.hour() as u8, time.minute() as u8);

    let packed = match format {
        TimeFormat::MasterDos => {
            [day, month, time.year().rem_euclid(100) as u8, hour, minute]
        }
        TimeFormat::Bdos => [day, month, bdos_year(&time)?, hour, minute],
        TimeFormat::Bdos17 => [
            day,
            0x80 | (month << 3),
            bdos_year(&time)?,
            (hour << 3) | (minute & 0x07),
            ((minute & 0x38) << 2) | (time.second() as u8 >> 1),
        ],
    };
    Ok(packed)
}

fn bdos_year(time: &NaiveDateTime) -> Result<u8> {
    u8::try_from(time.year() - 1900)
        .map_err(|_| MgtError::invalid_value(format!("year {} cannot be stored", time.year())))
}
