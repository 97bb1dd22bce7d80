use crate::record::{is_header, parse_record};
use crate::service::BinderService;
use jiff::Timestamp;
use std::fmt::Display;
use tether_core::{BindingStore, Clock, Enforcement, Error, EventSink};
use tether_generator::IdGenerator;
use thiserror::Error;
use tracing::{info, warn};

/// An import that stopped early.
///
/// Records before the failing one stay committed; `imported` says how many.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("import stopped after {imported} records")]
pub struct ImportError {
    pub imported: usize,
    #[source]
    pub source: Error,
}

impl<S: BindingStore, G: IdGenerator, E: EventSink, C: Clock> BinderService<S, G, E, C> {
    /// Binds every record in `records`, in order, and returns how many were
    /// bound.
    ///
    /// A first record whose first field is `url` is taken for a header and
    /// skipped. Records are bound with no id enforcement and `imported_at`
    /// as their bind time. The first record that fails to read, parse or
    /// bind stops the import.
    pub async fn import_records<I, R, F, X>(
        &self,
        records: I,
        imported_at: Timestamp,
    ) -> Result<usize, ImportError>
    where
        I: IntoIterator<Item = Result<R, X>>,
        R: IntoIterator<Item = F>,
        F: AsRef<str>,
        X: Display,
    {
        let mut imported = 0;

        for (index, record) in records.into_iter().enumerate() {
            let fields: Vec<F> = match record {
                Ok(record) => record.into_iter().collect(),
                Err(e) => {
                    return Err(stop(
                        imported,
                        Error::InvalidRecord(format!("record {}: {e}", index + 1)),
                    ))
                }
            };

            if index == 0 && is_header(&fields) {
                continue;
            }

            let request = parse_record(&fields).map_err(|source| stop(imported, source))?;
            self.bind(request, Enforcement::RELAXED, imported_at)
                .await
                .map_err(|source| stop(imported, source))?;
            imported += 1;
        }

        info!(imported, "import complete");
        Ok(imported)
    }
}

fn stop(imported: usize, source: Error) -> ImportError {
    warn!(imported, error = %source, "import stopped");
    ImportError { imported, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;
    use tether_core::{BindingReader, BindingSettings, Opcode, ShortId};
    use tether_events::OpCounters;
    use tether_generator::SeqGenerator;
    use tether_storage::InMemoryStore;

    fn setup() -> (
        BinderService<Arc<InMemoryStore>, SeqGenerator, OpCounters>,
        Arc<InMemoryStore>,
        OpCounters,
    ) {
        let store = Arc::new(InMemoryStore::new());
        let events = OpCounters::new();
        let binder = BinderService::new(
            Arc::clone(&store),
            SeqGenerator::new(),
            events.clone(),
            BindingSettings::default(),
        );
        (binder, store, events)
    }

    fn imported_at() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn rows(rows: &[&[&'static str]]) -> Vec<Result<Vec<&'static str>, Infallible>> {
        rows.iter().map(|row| Ok(row.to_vec())).collect()
    }

    #[tokio::test]
    async fn stops_at_first_bad_row_and_reports_count() {
        let (binder, store, events) = setup();
        let records = rows(&[
            &["url", "id"],
            &["https://example.com/1", "first"],
            &["https://example.com/2", "second"],
            &["https://example.com/3"],
            &["not a url", "fourth"],
            &["https://example.com/5", "fifth"],
        ]);

        let err = binder
            .import_records(records, imported_at())
            .await
            .unwrap_err();

        assert_eq!(err.imported, 3);
        assert!(matches!(err.source, Error::InvalidUrl { .. }));
        assert_eq!(store.len(), 3);
        assert_eq!(events.count(Opcode::Insert), 3);
        assert!(store.peek(&ShortId::new_unchecked("fifth")).await.is_err());
    }

    #[tokio::test]
    async fn ids_are_not_enforced_and_bind_time_is_fixed() {
        let (binder, store, _) = setup();
        let records = rows(&[&["https://example.com", "Spring_Sale-2024!", "5"]]);

        let imported = binder.import_records(records, imported_at()).await.unwrap();

        assert_eq!(imported, 1);
        let stored = store
            .peek(&ShortId::new_unchecked("Spring_Sale-2024!"))
            .await
            .unwrap();
        assert_eq!(stored.bound_at, imported_at());
        assert_eq!(stored.max_access, Some(5));
    }

    #[tokio::test]
    async fn header_only_skipped_in_first_position() {
        let (binder, _, _) = setup();
        let records = rows(&[&["https://example.com"], &["URL", "id"]]);

        let err = binder
            .import_records(records, imported_at())
            .await
            .unwrap_err();

        assert_eq!(err.imported, 1);
        assert!(matches!(err.source, Error::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn read_failures_stop_the_import() {
        let (binder, store, _) = setup();
        let records: Vec<Result<Vec<&str>, String>> = vec![
            Ok(vec!["https://example.com"]),
            Err("unexpected end of record".to_string()),
            Ok(vec!["https://example.com/later"]),
        ];

        let err = binder
            .import_records(records, imported_at())
            .await
            .unwrap_err();

        assert_eq!(err.imported, 1);
        assert_eq!(
            err.source,
            Error::InvalidRecord("record 2: unexpected end of record".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn cause_is_the_source_not_part_of_the_message() {
        let err = ImportError {
            imported: 2,
            source: Error::InvalidRecord("record 3: bad max_requests".to_string()),
        };

        assert_eq!(err.to_string(), "import stopped after 2 records");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), err.source.to_string());
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err))
                .matches("bad max_requests")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn empty_input_imports_nothing() {
        let (binder, _, events) = setup();

        let imported = binder
            .import_records(rows(&[]), imported_at())
            .await
            .unwrap();

        assert_eq!(imported, 0);
        assert_eq!(events.total(), 0);
    }
}
