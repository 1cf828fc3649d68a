use super::*;
use crate::payload::{
    query_from, term_id, PayloadKind, RPC_FALLBACK_IDS, RPC_HEAVY_QUERIES, RPC_QUERIES,
    RPC_STRESS_IDS,
};

const SEARCH_LIMIT: u32 = 10;
const HEAVY_SEARCH_LIMIT: u32 = 20;

/// Relations are looked up for this term while the session knows none.
const RELATIONS_FALLBACK: &[&str] = &["grpc"];

/// The default gRPC user, mirroring the REST browsing pattern over the RPC surface.
pub(crate) fn rest_like<A: ProtocolAdapter>(
    think: ThinkTime,
    limit: Option<Duration>,
) -> Result<Archetype<A>, ArchetypeError> {
    let name = "rest-like";
    Archetype::builder(name)
        .think(think)
        .on_start(|adapter| Box::pin(seed_from_list(adapter)))
        .action(tagged("ListTerms", name), 35, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("SearchTerms", name), 28, |ctx| {
            Box::pin(search(ctx, RPC_QUERIES, SEARCH_LIMIT))
        })
        .action(tagged("GetTerm", name), 17, |ctx| {
            Box::pin(get_term(ctx, RPC_FALLBACK_IDS, None))
        })
        .action(tagged("GetTermRelations", name), 10, |ctx| {
            Box::pin(relations(ctx))
        })
        .action(tagged("ListTerms + GetTerm", name), 10, move |ctx| {
            Box::pin(list_then(ctx, FollowUp::KnownTerm, limit))
        })
        .build()
}

pub(crate) fn light<A: ProtocolAdapter>() -> Result<Archetype<A>, ArchetypeError> {
    let name = "light";
    let (min, max) = LIGHT_THINK;
    Archetype::builder(name)
        .think_time(min, max)
        .on_start(|adapter| Box::pin(seed_from_list(adapter)))
        .action(tagged("ListTerms", name), 60, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GetTerm", name), 40, |ctx| {
            Box::pin(get_term(ctx, RELATIONS_FALLBACK, None))
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
        .action(tagged("SearchTerms", name), 50, |ctx| {
            Box::pin(search(ctx, RPC_HEAVY_QUERIES, HEAVY_SEARCH_LIMIT))
        })
        .action(tagged("ListTerms", name), 30, |ctx| Box::pin(list_terms(ctx, None)))
        .action(tagged("GetTerm+Relations", name), 20, move |ctx| {
            Box::pin(within(limit, "GetTerm + GetTermRelations", term_with_relations(ctx)))
        })
        .build()
}

/// Short think time and a tighter per-call limit. Searches and some lookups use generated payloads.
pub(crate) fn stress<A: ProtocolAdapter>(
    payloads: PayloadGenerator,
) -> Result<Archetype<A>, ArchetypeError> {
    let name = "stress";
    let (min, max) = STRESS_THINK;
    let limit = Some(STRESS_CALL_TIMEOUT);
    Archetype::builder(name)
        .think_time(min, max)
        .action(tagged("ListTerms", name), 50, move |ctx| {
            Box::pin(list_terms(ctx, limit))
        })
        .action(tagged("SearchTerms", name), 30, {
            let payloads = payloads.clone();
            move |ctx| {
                let query = payloads
                    .generate(PayloadKind::SearchQuery, &mut *ctx.rng)
                    .into_text();
                let page = payloads
                    .generate(PayloadKind::SearchLimit, &mut *ctx.rng)
                    .as_limit()
                    .unwrap_or(SEARCH_LIMIT);
                let operation = Operation::SearchTerms { query, limit: page };
                Box::pin(async move { invoke(ctx.adapter, operation, limit).await })
            }
        })
        .action(tagged("GetTerm", name), 20, move |ctx| {
            // one slot past the fixed ids looks up a generated name the target lacks
            let slot = ctx.rng.draw(RPC_STRESS_IDS.len() as u64 + 1) as usize;
            let id = match RPC_STRESS_IDS.get(slot) {
                Some(id) => id.to_string(),
                None => term_id(
                    &payloads
                        .generate(PayloadKind::TermName, &mut *ctx.rng)
                        .into_text(),
                ),
            };
            let operation = Operation::GetTerm { term_id: id };
            Box::pin(async move { invoke(ctx.adapter, operation, limit).await })
        })
        .build()
}

async fn search<A: ProtocolAdapter>(
    ctx: ActionContext<'_, A>,
    queries: &'static [&'static str],
    limit: u32,
) -> Outcome {
    let query = query_from(&mut *ctx.rng, queries);
    ctx.adapter
        .call(Operation::SearchTerms { query, limit })
        .await
}

async fn relations<A: ProtocolAdapter>(ctx: ActionContext<'_, A>) -> Outcome {
    let Some(term_id) = ctx.session.pick(&mut *ctx.rng, RELATIONS_FALLBACK) else {
        return no_term();
    };
    ctx.adapter
        .call(Operation::GetTermRelations { term_id })
        .await
}

/// A fixed term and its relations, reported as one action.
async fn term_with_relations<A: ProtocolAdapter>(ctx: ActionContext<'_, A>) -> Outcome {
    let Some(term_id) = drove_core::choose(&mut *ctx.rng, RPC_FALLBACK_IDS) else {
        return no_term();
    };
    let term = ctx
        .adapter
        .call(Operation::GetTerm {
            term_id: term_id.to_string(),
        })
        .await;
    if !term.is_success() {
        return term;
    }
    let relations = ctx
        .adapter
        .call(Operation::GetTermRelations {
            term_id: term_id.to_string(),
        })
        .await;
    term.then(relations)
}
