//! Trading-hours checks in exchange-local time
//!
//! All checks take a UTC instant and convert it to New York time, so daylight
//! saving transitions are handled by `chrono-tz`.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Time zone of the exchange whose session gates refreshes
pub const EXCHANGE_TZ: Tz = chrono_tz::America::New_York;

/// Regular session open, as (hour, minute) exchange time
pub const MARKET_OPEN: (u32, u32) = (9, 30);

/// Regular session close, as (hour, minute) exchange time
pub const MARKET_CLOSE: (u32, u32) = (16, 0);

/// Convert a UTC instant to exchange-local time
pub fn exchange_time(now: DateTime<Utc>) -> DateTime<Tz> {
    now.with_timezone(&EXCHANGE_TZ)
}

/// Returns true on Monday through Friday, exchange time
pub fn is_trading_day(now: DateTime<Utc>) -> bool {
    !matches!(exchange_time(now).weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns true during the regular session
///
/// The window includes the 09:30 open and the whole 16:00 close minute, and
/// ends at 16:01. Holidays are not modelled.
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    if !is_trading_day(now) {
        return false;
    }

    let minute = minute_of_day(now);
    minute >= to_minutes(MARKET_OPEN) && minute <= to_minutes(MARKET_CLOSE)
}

/// Returns true during the minute the regular session closes on a trading day
pub fn is_market_close_minute(now: DateTime<Utc>) -> bool {
    is_trading_day(now) && minute_of_day(now) == to_minutes(MARKET_CLOSE)
}

fn minute_of_day(now: DateTime<Utc>) -> u32 {
    let local = exchange_time(now);
    local.hour() * 60 + local.minute()
}

fn to_minutes((hour, minute): (u32, u32)) -> u32 {
    hour * 60 + minute
}
