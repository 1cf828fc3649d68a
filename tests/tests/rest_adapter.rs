mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use drove::prelude::*;
    use mock_service::{glossary, MockOptions, StatusCode};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn connect_to(options: MockOptions) -> RestAdapter {
        init();
        let base = mock(options).await;
        RestAdapterFactory::new(&base, TIMEOUT)
            .unwrap()
            .connect()
            .await
            .unwrap()
    }

    fn lookup(term_id: &str) -> Operation {
        Operation::GetTerm {
            term_id: term_id.to_string(),
        }
    }

    #[tokio::test]
    async fn listing_carries_term_ids() {
        let adapter = connect_to(MockOptions::default()).await;

        let outcome = adapter.call(Operation::ListTerms).await;
        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(outcome.result_size(), glossary().len() as u64);
        assert!(outcome.entity_ids().contains(&"FastAPI".to_string()));
        assert!(outcome.entity_ids().contains(&"REST API".to_string()));
    }

    #[tokio::test]
    async fn lookups_treat_missing_terms_as_empty_successes() {
        let adapter = connect_to(MockOptions::default()).await;

        let outcome = adapter.call(lookup("REST API")).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.result_size(), 1);

        let outcome = adapter.call(lookup("Not A Term")).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.result_size(), 0);
    }

    #[tokio::test]
    async fn not_found_on_listings_is_a_failure() {
        let adapter = connect_to(MockOptions::default().status(StatusCode::NOT_FOUND)).await;

        let outcome = adapter.call(Operation::ListTerms).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::NotFound));
        let outcome = adapter.call(lookup("ORM")).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn server_errors_are_protocol_errors() {
        let adapter =
            connect_to(MockOptions::default().status(StatusCode::INTERNAL_SERVER_ERROR)).await;

        for operation in [Operation::ListTerms, Operation::GetGraph, lookup("ORM")] {
            let outcome = adapter.call(operation.clone()).await;
            assert_eq!(
                outcome.error_class(),
                Some(ErrorClass::ProtocolError),
                "{operation}"
            );
            assert!(outcome.detail().unwrap().contains("500"));
        }
    }

    #[tokio::test]
    async fn graph_counts_nodes() {
        let adapter = connect_to(MockOptions::default()).await;
        let outcome = adapter.call(Operation::GetGraph).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.result_size(), glossary().len() as u64);

        let adapter = connect_to(MockOptions::default().malformed_graph()).await;
        let outcome = adapter.call(Operation::GetGraph).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::ProtocolError));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn slow_responses_time_out() {
        init();
        let base = mock(MockOptions::default().latency(Duration::from_secs(3))).await;
        let adapter = RestAdapterFactory::new(&base, Duration::from_millis(200))
            .unwrap()
            .connect()
            .await
            .unwrap();

        let outcome = adapter.call(Operation::ListTerms).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::Timeout));
    }

    #[tokio::test]
    async fn refused_connections_are_unavailable() {
        init();
        let base = format!("http://{}", closed_addr());
        let adapter = RestAdapterFactory::new(&base, TIMEOUT)
            .unwrap()
            .connect()
            .await
            .unwrap();

        let outcome = adapter.call(Operation::ListTerms).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::Unavailable));
    }

    #[tokio::test]
    async fn rpc_only_operations_are_not_offered() {
        let adapter = connect_to(MockOptions::default()).await;
        let outcome = adapter
            .call(Operation::SearchTerms {
                query: "API".to_string(),
                limit: 10,
            })
            .await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::ProtocolError));
    }
}
