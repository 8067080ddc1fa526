/// CSV export of solved schedules.
pub mod export;
