mod maths_utils;
mod perf;
mod time_utils;

pub use maths_utils::{nan_mean, nan_mean_and_stddev};
pub use time_utils::{epoch_ms_to_utc, format_duration, how_many_seconds_ago, now_timestamp_ms};

pub(crate) use maths_utils::{nan_to_num, normalize_max};
