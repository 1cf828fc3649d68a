use super::*;
use crate::payload::REST_FALLBACK_IDS;

const BROWSE_COUNT: usize = 3;

/// The default REST user: mostly listings and graph views, with some lookups.
pub(crate) fn browser<A: ProtocolAdapter>(
    think: ThinkTime,
    limit: Option<Duration>,
) -> Result<Archetype<A>, ArchetypeError> {
    let name = "browser";
    Archetype::builder(name)
        .think(think)
        .on_start(|adapter| Box::pin(seed_from_list(adapter)))
        .action(tagged("GET /terms", name), 35, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GET /graph", name), 28, |ctx| Box::pin(get_graph(ctx)))
        .action(tagged("GET /terms/{term}", name), 17, |ctx| {
            Box::pin(get_term(ctx, REST_FALLBACK_IDS, None))
        })
        .action(tagged("GET /terms/{term} x3", name), 10, move |ctx| {
            Box::pin(within(limit, "GetTerm x3", browse_terms(ctx)))
        })
        .action(tagged("GET /terms + /graph", name), 10, move |ctx| {
            Box::pin(list_then(ctx, FollowUp::Graph, limit))
        })
        .build()
}

pub(crate) fn light<A: ProtocolAdapter>() -> Result<Archetype<A>, ArchetypeError> {
    let name = "light";
    let (min, max) = LIGHT_THINK;
    Archetype::builder(name)
        .think_time(min, max)
        .on_start(|adapter| Box::pin(seed_from_list(adapter)))
        .action(tagged("GET /terms", name), 60, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GET /terms/{term}", name), 40, |ctx| {
            Box::pin(get_term(ctx, REST_FALLBACK_IDS, None))
        })
        .build()
}

pub(crate) fn heavy<A: ProtocolAdapter>(
    limit: Option<Duration>,
) -> Result<Archetype<A>, ArchetypeError> {
    let name = "heavy";
    let (min, max) = HEAVY_THINK;
    Archetype::builder(name)
        .think_time(min, max)
        .action(tagged("GET /graph", name), 50, |ctx| Box::pin(get_graph(ctx)))
        .action(tagged("GET /terms", name), 30, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GET /terms + /graph", name), 20, move |ctx| {
            Box::pin(list_then(ctx, FollowUp::Graph, limit))
        })
        .build()
}

pub(crate) fn stress<A: ProtocolAdapter>() -> Result<Archetype<A>, ArchetypeError> {
    let name = "stress";
    let (min, max) = STRESS_THINK;
    Archetype::builder(name)
        .think_time(min, max)
        .action(tagged("GET /terms", name), 50, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GET /graph", name), 30, |ctx| Box::pin(get_graph(ctx)))
        .action(tagged("GET /terms/{term}", name), 20, |ctx| {
            Box::pin(get_fixed_term(ctx, REST_FALLBACK_IDS, None))
        })
        .build()
}

/// Look up several distinct terms in a row. Stops at the first failure.
async fn browse_terms<A: ProtocolAdapter>(ctx: ActionContext<'_, A>) -> Outcome {
    let mut ids = ctx.session.sample(&mut *ctx.rng, BROWSE_COUNT);
    if ids.len() < BROWSE_COUNT {
        let fallback = REST_FALLBACK_IDS.iter().map(|id| id.to_string()).collect();
        ids = SessionState::with_ids(fallback).sample(&mut *ctx.rng, BROWSE_COUNT);
    }

    let mut combined: Option<Outcome> = None;
    for term_id in ids {
        let outcome = ctx.adapter.call(Operation::GetTerm { term_id }).await;
        let next = match combined {
            Some(previous) => previous.then(outcome),
            None => outcome,
        };
        if !next.is_success() {
            return next;
        }
        combined = Some(next);
    }
    combined.unwrap_or_else(no_term)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[tokio::test]
    async fn lookups_prefer_known_ids() {
        let archetype = browser::<GlossaryStub>(ThinkTime::default(), None).unwrap();
        let adapter = GlossaryStub::default();

        let mut session = SessionState::new();
        let outcome = run_action(&archetype, "GET /terms/{term} [browser]", &adapter, &mut session).await;
        assert!(outcome.is_success());
        assert_eq!(
            adapter.calls(),
            [Operation::GetTerm {
                term_id: REST_FALLBACK_IDS[0].to_string()
            }]
        );

        let mut session = SessionState::with_ids(vec!["ORM".to_string()]);
        run_action(&archetype, "GET /terms/{term} [browser]", &adapter, &mut session).await;
        assert_eq!(
            adapter.calls().last(),
            Some(&Operation::GetTerm {
                term_id: "ORM".to_string()
            })
        );
    }

    #[tokio::test]
    async fn listing_refreshes_the_session() {
        let archetype = light::<GlossaryStub>().unwrap();
        let adapter = GlossaryStub::default();
        let mut session = SessionState::new();

        let outcome = run_action(&archetype, "GET /terms [light]", &adapter, &mut session).await;
        assert_eq!(outcome.result_size(), 3);
        assert_eq!(session.known_ids(), KNOWN);
    }

    #[tokio::test]
    async fn browse_issues_three_distinct_lookups() {
        let archetype = browser::<GlossaryStub>(ThinkTime::default(), None).unwrap();
        let adapter = GlossaryStub::default();
        let mut session = SessionState::with_ids(KNOWN.iter().map(|s| s.to_string()).collect());

        let outcome =
            run_action(&archetype, "GET /terms/{term} x3 [browser]", &adapter, &mut session).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.result_size(), 3);

        let mut looked_up: Vec<_> = adapter
            .calls()
            .into_iter()
            .map(|op| match op {
                Operation::GetTerm { term_id } => term_id,
                other => panic!("unexpected {other}"),
            })
            .collect();
        looked_up.sort();
        assert_eq!(looked_up, KNOWN);
    }

    #[tokio::test(start_paused = true)]
    async fn browse_is_bounded_as_a_whole() {
        let archetype =
            browser::<GlossaryStub>(ThinkTime::default(), Some(Duration::from_secs(3))).unwrap();
        let adapter = GlossaryStub {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        let mut session = SessionState::with_ids(KNOWN.iter().map(|s| s.to_string()).collect());

        let outcome =
            run_action(&archetype, "GET /terms/{term} x3 [browser]", &adapter, &mut session).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::Timeout));
        assert_eq!(adapter.calls().len(), 2);
    }

    #[tokio::test]
    async fn terms_then_graph_combines_both_calls() {
        let archetype = heavy::<GlossaryStub>(None).unwrap();
        let adapter = GlossaryStub::default();
        let mut session = SessionState::new();

        let outcome =
            run_action(&archetype, "GET /terms + /graph [heavy]", &adapter, &mut session).await;
        assert_eq!(outcome.result_size(), 3 + 7);
        assert_eq!(adapter.calls(), [Operation::ListTerms, Operation::GetGraph]);

        let adapter = GlossaryStub {
            fail_lists: true,
            ..Default::default()
        };
        let outcome =
            run_action(&archetype, "GET /terms + /graph [heavy]", &adapter, &mut session).await;
        assert_eq!(outcome.error_class(), Some(ErrorClass::Unavailable));
        assert_eq!(adapter.calls(), [Operation::ListTerms]);
    }

    #[tokio::test]
    async fn stress_ignores_the_session() {
        let archetype = stress::<GlossaryStub>().unwrap();
        let adapter = GlossaryStub::default();
        let mut session = SessionState::with_ids(vec!["zzz".to_string()]);

        run_action(&archetype, "GET /terms/{term} [stress]", &adapter, &mut session).await;
        assert_eq!(
            adapter.calls(),
            [Operation::GetTerm {
                term_id: "FastAPI".to_string()
            }]
        );
    }
}
