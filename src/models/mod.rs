mod alert_history;
mod category_counters;

pub use alert_history::AlertHistory;
pub use category_counters::CategoryCounters;
