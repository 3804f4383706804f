//! Applies edited records to the remote calendar.

use tracing::{debug, error, info, instrument, warn};

use crate::action::{self, Action};
use crate::error::{CalEditError, CalEditResult};
use crate::event::{EditHandle, Event, EventUpdate};
use crate::record::Record;
use crate::reminder::{self, Reminder};
use crate::remote::Remote;
use crate::store::EventStore;
use crate::sync::report::{Applied, SyncReport};
use crate::sync::retry::{Pause, RetryPolicy, TokioPause};
use crate::timestamp::TimestampCodec;

pub struct SyncEngine<R, P = TokioPause> {
    remote: R,
    codec: TimestampCodec,
    retry: RetryPolicy,
    pause: P,
}

impl<R: Remote> SyncEngine<R> {
    pub fn new(remote: R, codec: TimestampCodec, retry: RetryPolicy) -> Self {
        SyncEngine {
            remote,
            codec,
            retry,
            pause: TokioPause,
        }
    }
}

impl<R: Remote, P: Pause> SyncEngine<R, P> {
    pub fn with_pause<Q: Pause>(self, pause: Q) -> SyncEngine<R, Q> {
        SyncEngine {
            remote: self.remote,
            codec: self.codec,
            retry: self.retry,
            pause,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn codec(&self) -> &TimestampCodec {
        &self.codec
    }

    /// Build the full replacement for an event from a record.
    ///
    /// Times and reminders are only taken when the record has a start
    /// time. Malformed reminders are dropped with a warning; a malformed
    /// `when` or `until` fails the record.
    pub fn build_update(&self, record: &Record) -> CalEditResult<EventUpdate> {
        self.build_update_noting(record, &mut Vec::new())
    }

    fn build_update_noting(
        &self,
        record: &Record,
        warnings: &mut Vec<String>,
    ) -> CalEditResult<EventUpdate> {
        let (start, end, reminders) = match &record.when {
            Some(when) => {
                let start = self.codec.to_remote(when)?;
                let end = record
                    .until
                    .as_deref()
                    .map(|until| self.codec.to_remote(until))
                    .transpose()?;
                (Some(start), end, parse_reminders(&record.remind, warnings))
            }
            None => {
                if record.until.is_some() || !record.remind.is_empty() {
                    debug!("No start time, ignoring end time and reminders");
                }
                (None, None, Vec::new())
            }
        };

        Ok(EventUpdate {
            title: record.what.clone(),
            start,
            end,
            reminders,
            location: record.location.clone(),
            description: record.description.clone(),
        })
    }

    /// Apply one record, updating `store` after each successful remote call.
    pub async fn apply(&self, record: &Record, store: &mut EventStore) -> CalEditResult<Applied> {
        self.apply_noting(record, store, &mut Vec::new()).await
    }

    #[instrument(skip_all, fields(record = record.label().unwrap_or_default()), level = "debug")]
    async fn apply_noting(
        &self,
        record: &Record,
        store: &mut EventStore,
        warnings: &mut Vec<String>,
    ) -> CalEditResult<Applied> {
        let action = action::resolve(record, store)?;
        let label = record.label().unwrap_or_default();

        if action != Action::Skip {
            info!("{}: {label}", action.verb());
        }

        match action {
            Action::Skip => Ok(Applied::Skipped),
            Action::Delete { id } => {
                let handle = handle_of(store, &id)?;
                self.remote.delete_event(&handle).await?;
                store.mark_removed(&id);
                Ok(Applied::Deleted(id))
            }
            Action::Add => {
                let update = self.build_update_noting(record, warnings)?;
                let placeholder = self.remote.insert_placeholder().await?;
                let id = placeholder.id.clone();
                let handle = placeholder.handle.clone();
                store.push(placeholder);

                let event = self.submit(&handle, &update).await?;
                store.replace(event);
                Ok(Applied::Added(id))
            }
            Action::Update { id } => {
                let handle = handle_of(store, &id)?;
                let update = self.build_update_noting(record, warnings)?;
                let event = self.submit(&handle, &update).await?;
                store.replace(event);
                Ok(Applied::Updated(id))
            }
        }
    }

    /// Apply every record in order. Failures are recorded and the batch
    /// continues.
    pub async fn apply_all<I>(&self, records: I, store: &mut EventStore) -> SyncReport
    where
        I: IntoIterator<Item = Record>,
    {
        let mut report = SyncReport::default();
        for record in records {
            let label = record.label().unwrap_or_default().to_string();
            let mut warnings = Vec::new();
            let result = self.apply_noting(&record, store, &mut warnings).await;
            if let Err(e) = &result {
                error!("{label}: {e}");
            }
            report.push_with_warnings(label, result, warnings);
        }
        report
    }

    #[instrument(skip_all, fields(handle = %handle), level = "debug")]
    async fn submit(&self, handle: &EditHandle, update: &EventUpdate) -> CalEditResult<Event> {
        self.retry
            .run(&self.pause, |_| self.remote.update_event(handle, update))
            .await
    }
}

fn handle_of(store: &EventStore, id: &str) -> CalEditResult<EditHandle> {
    store
        .get(id)
        .map(|e| e.handle.clone())
        .ok_or_else(|| CalEditError::UnknownEvent(id.to_string()))
}

fn parse_reminders(texts: &[String], warnings: &mut Vec<String>) -> Vec<Reminder> {
    texts
        .iter()
        .filter_map(|text| match reminder::parse(text) {
            Ok(reminder) => Some(reminder),
            Err(e) => {
                warn!("{e}");
                warnings.push(e.to_string());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::PLACEHOLDER_TITLE;
    use crate::remote::memory::{CallCounts, MemoryRemote};
    use crate::sync::retry::tests::RecordedPause;

    fn existing(id: &str, title: &str) -> Event {
        let mut event = Event::new(id, EditHandle::new(format!("edit/{id}")));
        event.title = Some(title.to_string());
        event
    }

    fn engine(events: Vec<Event>) -> (SyncEngine<MemoryRemote, RecordedPause>, EventStore) {
        let store = EventStore::new(events.clone());
        let engine = SyncEngine::new(
            MemoryRemote::new(events),
            TimestampCodec::utc(),
            RetryPolicy::default(),
        )
        .with_pause(RecordedPause::default());
        (engine, store)
    }

    fn record(fields: &[(&str, &str)]) -> Record {
        let mut record = Record::default();
        for (key, value) in fields {
            record.set(key, value.to_string());
        }
        record
    }

    #[test]
    fn update_is_built_from_record() {
        let (engine, _) = engine(vec![]);
        let update = engine
            .build_update(&record(&[
                ("what", "Dentist"),
                ("when", "2011-06-13 09:20:00"),
                ("until", "2011-06-13 10:20:00"),
                ("where", "Clinic"),
                ("remind", "60 minutes by sms"),
                ("remind", "60 minutes"),
                ("remind", "5 minutes by popup"),
            ]))
            .unwrap();

        assert_eq!(update.title.as_deref(), Some("Dentist"));
        assert_eq!(update.start.as_deref(), Some("2011-06-13T09:20:00Z"));
        assert_eq!(update.end.as_deref(), Some("2011-06-13T10:20:00Z"));
        assert_eq!(update.location.as_deref(), Some("Clinic"));
        assert_eq!(update.description, None);
        assert_eq!(
            update.reminders,
            vec![Reminder::new(60, "sms"), Reminder::new(5, "popup")]
        );
    }

    #[test]
    fn times_and_reminders_need_a_start() {
        let (engine, _) = engine(vec![]);
        let update = engine
            .build_update(&record(&[
                ("what", "Someday"),
                ("until", "2011-06-13 10:20:00"),
                ("remind", "60 minutes by sms"),
            ]))
            .unwrap();

        assert_eq!(update.start, None);
        assert_eq!(update.end, None);
        assert!(update.reminders.is_empty());
    }

    #[test]
    fn missing_until_leaves_end_unset() {
        let (engine, _) = engine(vec![]);
        let update = engine
            .build_update(&record(&[("what", "Call"), ("when", "2011-06-13 09:20:00")]))
            .unwrap();

        assert_eq!(update.start.as_deref(), Some("2011-06-13T09:20:00Z"));
        assert_eq!(update.end, None);
    }

    #[test]
    fn malformed_start_fails_the_record() {
        let (engine, _) = engine(vec![]);
        let err = engine
            .build_update(&record(&[("what", "Bad"), ("when", "tomorrow")]))
            .unwrap_err();
        assert!(matches!(err, CalEditError::MalformedTimestamp { .. }));
    }

    #[tokio::test]
    async fn delete_marks_event_removed() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        let applied = engine
            .apply(&record(&[("id", "abc"), ("what", "DELETE")]), &mut store)
            .await
            .unwrap();

        assert_eq!(applied, Applied::Deleted("abc".into()));
        assert!(store.get("abc").is_none());
        assert!(engine.remote().get("abc").is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_event_and_is_not_retried() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        engine.remote().reject_deletes();

        let result = engine
            .apply(&record(&[("id", "abc"), ("what", "DELETE")]), &mut store)
            .await;

        assert!(result.is_err());
        assert!(store.get("abc").is_some());
        assert_eq!(engine.remote().calls().delete, 1);
    }

    #[tokio::test]
    async fn add_fills_in_a_placeholder() {
        let (engine, mut store) = engine(vec![]);
        let applied = engine
            .apply(
                &record(&[("what", "Trip"), ("when", "2020-02-02 10:00:00")]),
                &mut store,
            )
            .await
            .unwrap();

        let Applied::Added(id) = applied else {
            panic!("expected an add, got {applied:?}");
        };
        let event = store.get(&id).unwrap();
        assert_eq!(event.title.as_deref(), Some("Trip"));
        assert_ne!(event.title.as_deref(), Some(PLACEHOLDER_TITLE));
        assert_eq!(engine.remote().calls().insert, 1);
        assert_eq!(engine.remote().calls().update, 1);
    }

    #[tokio::test]
    async fn malformed_add_inserts_nothing() {
        let (engine, mut store) = engine(vec![]);
        let result = engine
            .apply(&record(&[("what", "Trip"), ("when", "soon")]), &mut store)
            .await;

        assert!(result.is_err());
        assert_eq!(engine.remote().calls().insert, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_retries_transient_failures() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        engine.remote().fail_updates(
            (0..14).map(|_| CalEditError::RemoteTransient("Rate limit exceeded".into())),
        );

        let applied = engine
            .apply(&record(&[("id", "abc"), ("what", "Hockey (late)")]), &mut store)
            .await
            .unwrap();

        assert_eq!(applied, Applied::Updated("abc".into()));
        assert_eq!(engine.remote().calls().update, 15);
        assert_eq!(engine.pause.count(), 14);
        assert_eq!(
            engine.pause.pauses.lock().unwrap()[0],
            Duration::from_secs(1)
        );
        assert_eq!(
            store.get("abc").and_then(|e| e.title.as_deref()),
            Some("Hockey (late)")
        );
    }

    #[tokio::test]
    async fn update_gives_up_after_fifteen_attempts() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        engine
            .remote()
            .fail_updates((0..15).map(|_| CalEditError::RemoteTransient("503".into())));

        let err = engine
            .apply(&record(&[("id", "abc"), ("what", "Hockey (late)")]), &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, CalEditError::RetriesExhausted { attempts: 15, .. }));
        assert_eq!(engine.remote().calls().update, 15);
        assert_eq!(
            store.get("abc").and_then(|e| e.title.as_deref()),
            Some("Hockey")
        );
    }

    #[tokio::test]
    async fn unknown_id_is_reported_without_remote_calls() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        let err = engine
            .apply(&record(&[("id", "nope"), ("what", "Ghost")]), &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, CalEditError::UnknownEvent(_)));
        assert_eq!(engine.remote().calls(), CallCounts::default());
    }

    #[tokio::test]
    async fn dropped_reminders_are_reported() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey")]);
        let records = vec![record(&[
            ("id", "abc"),
            ("what", "Hockey"),
            ("when", "2011-02-01 19:00:00"),
            ("remind", "10 minutes by popup"),
            ("remind", "soon"),
        ])];
        let report = engine.apply_all(records, &mut store).await;

        assert!(report.is_success());
        let warnings: Vec<(&str, &str)> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, "Hockey");
        assert!(warnings[0].1.contains("soon"));
        assert_eq!(store.get("abc").unwrap().reminders.len(), 1);
    }

    #[tokio::test]
    async fn batch_continues_after_failures() {
        let (engine, mut store) = engine(vec![existing("abc", "Hockey"), existing("def", "Lunch")]);
        engine.remote().fail_updates([CalEditError::conflict("")]);

        let records = vec![
            record(&[("id", "abc"), ("what", "Hockey"), ("when", "2011-02-01 19:00:00")]),
            Record::default(),
            record(&[("id", "def"), ("what", "DELETE")]),
            record(&[("what", "Dinner")]),
        ];
        let report = engine.apply_all(records, &mut store).await;

        assert_eq!(report.records().len(), 4);
        assert_eq!(report.counts(), (1, 0, 1));
        let failures: Vec<&str> = report.failures().map(|(label, _)| label).collect();
        assert_eq!(failures, vec!["Hockey"]);
        assert!(!report.is_success());
    }
}
