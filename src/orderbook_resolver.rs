use crate::arbitrage_detector::OutcomePrice;
use crate::clients::MarketDataSource;
use crate::event::Event;
use tracing::debug;

/// Fetches the live best ask of every active market's "Yes" token in `event`.
///
/// One request per market, issued sequentially. `on_outcome` fires after each request
/// whether it succeeded or not. Failed fetches and empty ask sides resolve to an unpriced
/// outcome; markets without a readable token id are skipped.
pub async fn resolve_outcomes<S, F>(source: &S, event: &Event, mut on_outcome: F) -> Vec<OutcomePrice>
where
    S: MarketDataSource + ?Sized,
    F: FnMut() + Send,
{
    let mut outcomes = Vec::new();

    for market in event.active_markets() {
        let Some(token_id) = market.yes_token_id() else {
            debug!(event = %event.slug, question = %market.question, "Skipping market without token ids");
            continue;
        };

        let result = source.fetch_orderbook(&token_id).await;
        on_outcome();

        let outcome = match result {
            Ok(book) => match book.best_ask() {
                Some((price, size)) => OutcomePrice::priced(&market.question, &token_id, price, size),
                None => OutcomePrice::unpriced(&market.question, &token_id),
            },
            Err(e) => {
                debug!(token_id = %token_id, error = %e, "Orderbook fetch failed");
                OutcomePrice::unpriced(&market.question, &token_id)
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::event::{BookLevel, Market, Orderbook};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory books keyed by token id; unknown tokens answer 404.
    struct StaticBooks {
        books: HashMap<String, Orderbook>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticBooks {
        fn new(books: Vec<(&str, Vec<(&str, &str)>)>) -> Self {
            let books = books
                .into_iter()
                .map(|(token, asks)| {
                    let book = Orderbook {
                        asks: asks.into_iter().map(|(p, s)| BookLevel::new(p, s)).collect(),
                        ..Default::default()
                    };
                    (token.to_string(), book)
                })
                .collect();
            Self {
                books,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticBooks {
        async fn fetch_events(
            &self,
            _on_page: &mut (dyn FnMut(usize, usize) + Send),
        ) -> Result<Vec<Event>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_orderbook(&self, token_id: &str) -> Result<Orderbook, ApiError> {
            self.requested.lock().unwrap().push(token_id.to_string());
            self.books.get(token_id).cloned().ok_or_else(|| ApiError::Status {
                status: 404,
                url: format!("/book?token_id={token_id}"),
            })
        }
    }

    fn market(question: &str, token_ids: &str) -> Market {
        Market::new(question, token_ids)
    }

    #[tokio::test]
    async fn test_resolves_priced_and_unpriced_outcomes() {
        let source = StaticBooks::new(vec![
            ("yes-a", vec![("0.30", "2000")]),
            ("yes-b", vec![]),
        ]);
        let event = Event::new("1", "E", "e").with_markets(vec![
            market("A?", "[\"yes-a\", \"no-a\"]"),
            market("B?", "[\"yes-b\", \"no-b\"]"),
            market("C?", "[\"yes-c\", \"no-c\"]"),
        ]);

        let mut calls = 0;
        let outcomes = resolve_outcomes(&source, &event, || calls += 1).await;

        assert_eq!(calls, 3);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].best_ask, Some(0.30));
        assert!((outcomes[0].best_ask_size - 600.0).abs() < 1e-9);
        assert_eq!(outcomes[1], OutcomePrice::unpriced("B?", "yes-b"));
        assert_eq!(outcomes[2], OutcomePrice::unpriced("C?", "yes-c"));
    }

    #[tokio::test]
    async fn test_only_yes_token_is_requested() {
        let source = StaticBooks::new(vec![("yes-a", vec![("0.5", "10")])]);
        let event = Event::new("1", "E", "e").with_markets(vec![market("A?", "[\"yes-a\", \"no-a\"]")]);

        resolve_outcomes(&source, &event, || {}).await;
        assert_eq!(*source.requested.lock().unwrap(), vec!["yes-a".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_token_ids_are_skipped_without_a_request() {
        let source = StaticBooks::new(vec![("yes-a", vec![("0.5", "10")])]);
        let event = Event::new("1", "E", "e").with_markets(vec![
            market("Broken?", "not-json"),
            market("Empty?", "[]"),
            market("A?", "[\"yes-a\", \"no-a\"]"),
        ]);

        let mut calls = 0;
        let outcomes = resolve_outcomes(&source, &event, || calls += 1).await;

        assert_eq!(calls, 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].question, "A?");
    }

    #[tokio::test]
    async fn test_closed_markets_are_not_fetched() {
        let source = StaticBooks::new(vec![("yes-a", vec![("0.5", "10")]), ("yes-b", vec![("0.4", "10")])]);
        let event = Event::new("1", "E", "e").with_markets(vec![
            market("A?", "[\"yes-a\", \"no-a\"]"),
            market("B?", "[\"yes-b\", \"no-b\"]").closed(),
        ]);

        let outcomes = resolve_outcomes(&source, &event, || {}).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(*source.requested.lock().unwrap(), vec!["yes-a".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_best_ask_is_unpriced() {
        let source = StaticBooks::new(vec![("yes-a", vec![("", "10")])]);
        let event = Event::new("1", "E", "e").with_markets(vec![market("A?", "[\"yes-a\", \"no-a\"]")]);

        let outcomes = resolve_outcomes(&source, &event, || {}).await;
        assert_eq!(outcomes[0].best_ask, None);
        assert_eq!(outcomes[0].best_ask_size, 0.0);
    }
}
