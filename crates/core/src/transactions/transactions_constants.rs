// Transaction sides
//
// The wire names are lower-case, matching what clients and CSV exports send.

/// Purchase of shares. Opens a lot.
pub const TRANSACTION_SIDE_BUY: &str = "buy";

/// Disposal of shares. Relieves the earliest open lots first.
pub const TRANSACTION_SIDE_SELL: &str = "sell";

/// Accepted date formats for date-only input, tried in order.
pub const DATE_ONLY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Accepted formats for naive (zone-less) datetimes, interpreted as UTC.
pub const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
