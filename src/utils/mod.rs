mod text_utils;
mod time_utils;

pub use text_utils::truncate_with_ellipsis;
pub use time_utils::{
    TimeUtils, format_display_time, format_monitor_duration, local_day, parse_alert_timestamp,
    today,
};
