//! Best-effort fan-out of extracted tasks to calendar/task-list services.
//!
//! The concrete integrations live outside this crate. They implement
//! [`TaskPublisher`]; [`publish_all`] calls every publisher for every task and
//! collects failures instead of stopping, so one unreachable calendar never
//! loses the tasks already sent elsewhere.

use crate::error::PublishError;
use crate::output::ExtractedTask;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A downstream service that accepts `(title, YYYY-MM-DD)` pairs.
pub trait TaskPublisher: Send + Sync {
    fn name(&self) -> &str;

    fn publish(&self, title: &str, iso_date: &str) -> Result<(), PublishError>;
}

/// Outcome of [`publish_all`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishReport {
    /// Successful `(task, publisher)` calls.
    pub published: usize,
    /// Failure-marker records that were not sent anywhere.
    pub skipped: usize,
    pub failures: Vec<PublishError>,
}

/// Send every task to every publisher. Never fails.
pub fn publish_all(publishers: &[&dyn TaskPublisher], tasks: &[ExtractedTask]) -> PublishReport {
    let mut report = PublishReport::default();

    for task in tasks {
        if task.is_failure_marker() {
            report.skipped += 1;
            continue;
        }
        for publisher in publishers {
            match publisher.publish(&task.title, &task.date) {
                Ok(()) => {
                    debug!("{}: published {:?}", publisher.name(), task.title);
                    report.published += 1;
                }
                Err(e) => {
                    warn!("Failed to publish {:?}: {}", task.title, e);
                    report.failures.push(e);
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl TaskPublisher for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        fn publish(&self, title: &str, iso_date: &str) -> Result<(), PublishError> {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), iso_date.to_string()));
            Ok(())
        }
    }

    struct Down;

    impl TaskPublisher for Down {
        fn name(&self) -> &str {
            "down"
        }
        fn publish(&self, _: &str, _: &str) -> Result<(), PublishError> {
            Err(PublishError::Unavailable {
                publisher: "down".into(),
                detail: "connection refused".into(),
            })
        }
    }

    fn task(title: &str, date: &str) -> ExtractedTask {
        ExtractedTask {
            title: title.into(),
            date: date.into(),
            original_text: format!("{title} {date}"),
            extracted_at: Local::now(),
        }
    }

    #[test]
    fn failing_publisher_does_not_stop_others() {
        let rec = Recording::default();
        let tasks = [task("Pay rent", "2024-03-01"), task("Call Bob", "2024-03-02")];
        let publishers: [&dyn TaskPublisher; 2] = [&Down, &rec];
        let report = publish_all(&publishers, &tasks);

        assert_eq!(report.published, 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(
            rec.calls.lock().unwrap().as_slice(),
            &[
                ("Pay rent".to_string(), "2024-03-01".to_string()),
                ("Call Bob".to_string(), "2024-03-02".to_string()),
            ]
        );
    }

    #[test]
    fn failure_marker_is_not_published() {
        let rec = Recording::default();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let tasks = [ExtractedTask::failure_marker("ocr died", today, Local::now())];
        let publishers: [&dyn TaskPublisher; 1] = [&rec];
        let report = publish_all(&publishers, &tasks);

        assert_eq!(report.skipped, 1);
        assert_eq!(report.published, 0);
        assert!(rec.calls.lock().unwrap().is_empty());
    }
}
