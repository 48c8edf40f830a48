use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;

type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Business-timezone clock used for snapshot dates and the daily schedule
#[derive(Clone)]
pub struct BusinessClock {
    tz: Tz,
    refresh_hour: u32,
    refresh_minute: u32,
    now: NowFn,
}

impl fmt::Debug for BusinessClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusinessClock")
            .field("tz", &self.tz)
            .field("refresh_hour", &self.refresh_hour)
            .field("refresh_minute", &self.refresh_minute)
            .finish()
    }
}

impl BusinessClock {
    pub fn new(tz: Tz, refresh_hour: u32, refresh_minute: u32) -> Self {
        Self {
            tz,
            refresh_hour,
            refresh_minute,
            now: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. with a fixed instant
    pub fn with_now(mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now)()
    }

    /// Calendar date in the business timezone
    pub fn today(&self) -> NaiveDate {
        self.date_at(self.now())
    }

    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// First scheduled refresh strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = self.date_at(now);

        // Three days covers a DST gap swallowing the slot on the first candidate day
        for _ in 0..3 {
            if let Some(candidate) = self.scheduled_on(date) {
                if candidate > now {
                    return candidate;
                }
            }
            date = date.succ_opt().unwrap_or(date);
        }

        now + Duration::days(1)
    }

    /// Time left until the next scheduled refresh
    pub fn until_next_run(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_run_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60))
    }

    fn scheduled_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(self.refresh_hour, self.refresh_minute, 0)?;
        let local = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            // Slot falls inside a spring-forward gap; run an hour later
            LocalResult::None => match self.tz.from_local_datetime(&(naive + Duration::hours(1))) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
                LocalResult::None => return None,
            },
        };
        Some(local.with_timezone(&Utc))
    }
}
