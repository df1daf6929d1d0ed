use ndarray::Array2;
use proptest::prelude::*;
use teatime::temporal::clamp;
use teatime::{
    CorpusStore, DateWindow, EmbeddingIndex, EngineConfig, RawTrendRow, RetrievalEngine, TopicMeta,
};

const TOPICS: &[&str] = &[
    "Eclipse",
    "Solar Eclipse",
    "Budget",
    "Super Bowl",
    "#superbowl",
    "Oscars",
    "#OscarsSoWhite",
    "Election Night",
];

fn date() -> impl Strategy<Value = String> {
    (2020u32..2026, 1u32..13, 1u32..29).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

fn rows() -> impl Strategy<Value = Vec<RawTrendRow>> {
    prop::collection::vec(
        (date(), 1u32..21, 0..TOPICS.len()).prop_map(|(d, r, t)| {
            RawTrendRow::new(&d, &r.to_string(), TOPICS[t])
        }),
        1..40,
    )
}

fn engine_with_index(rows: Vec<RawTrendRow>, dim: usize, seed: u64) -> RetrievalEngine {
    let corpus = CorpusStore::from_rows(rows).expect("rows are well-formed");
    let n = TOPICS.len();
    // Cheap deterministic fill; the properties below do not depend on the values.
    let matrix = Array2::from_shape_fn((n, dim), |(i, j)| {
        let x = (i as u64 * 31 + j as u64 * 17 + seed) % 97;
        x as f32 / 48.0 - 1.0
    });
    let records = TOPICS
        .iter()
        .map(|t| TopicMeta {
            topic: t.to_string(),
            first_seen: None,
            last_seen: None,
            days_seen: 0,
        })
        .collect();
    let index = EmbeddingIndex::new(matrix, records).expect("aligned index");
    RetrievalEngine::new(corpus, Some(index), &EngineConfig::default())
}

proptest! {
    #[test]
    fn clamp_stays_inside_bounds(rows in rows(), s in prop::option::of(date()), e in prop::option::of(date())) {
        let corpus = CorpusStore::from_rows(rows).unwrap();
        let b = corpus.bounds();
        let w = clamp(s.as_deref(), e.as_deref(), b);
        prop_assert!(w.start >= b.start);
        prop_assert!(w.end <= b.end);
    }

    #[test]
    fn clamp_of_nothing_is_bounds(rows in rows()) {
        let corpus = CorpusStore::from_rows(rows).unwrap();
        let w = clamp(None, None, corpus.bounds());
        prop_assert_eq!(w, DateWindow::from(corpus.bounds()));
    }

    #[test]
    fn keyword_results_are_bounded_sorted_and_in_window(
        rows in rows(),
        query in "(eclipse|bowl|budget|oscars|night|zzz)( (eclipse|bowl|budget|oscars|night|zzz)){0,2}",
        k in 0usize..6,
        s in prop::option::of(date()),
        e in prop::option::of(date()),
    ) {
        let engine = engine_with_index(rows, 4, 0);
        let window = engine.clamp_window(s.as_deref(), e.as_deref());
        let hits = engine.keyword_search(&query, k, s.as_deref(), e.as_deref());

        prop_assert!(hits.len() <= k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            prop_assert!(pair[0].topic < pair[1].topic);
        }
        for hit in &hits {
            prop_assert!(engine.corpus().seen_within(&hit.topic, &window));
        }
        let again = engine.keyword_search(&query, k, s.as_deref(), e.as_deref());
        prop_assert_eq!(hits, again);
    }

    #[test]
    fn dense_results_are_bounded_descending_and_in_window(
        rows in rows(),
        query in prop::collection::vec(-1.0f32..1.0, 6),
        seed in 0u64..1000,
        k in 0usize..6,
        s in prop::option::of(date()),
        e in prop::option::of(date()),
    ) {
        let engine = engine_with_index(rows, 6, seed);
        let window = engine.clamp_window(s.as_deref(), e.as_deref());
        let hits = engine.dense_search(&query, k, s.as_deref(), e.as_deref());

        prop_assert!(hits.len() <= k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for hit in &hits {
            prop_assert!(engine.corpus().seen_within(&hit.topic, &window));
            prop_assert!(hit.score.is_finite());
        }
    }

    #[test]
    fn retrieve_enriches_with_matching_timelines(
        rows in rows(),
        query in prop::collection::vec(-1.0f32..1.0, 6),
        k in 1usize..6,
    ) {
        let engine = engine_with_index(rows, 6, 7);
        let r = engine.retrieve(Some(query.as_slice()), "eclipse", k, None, None);
        prop_assert!(r.ingredients.len() <= k);
        for ing in &r.ingredients {
            let tl = engine.topic_timeline(&ing.topic);
            prop_assert_eq!(&ing.first_seen, &tl.first_seen);
            prop_assert_eq!(&ing.last_seen, &tl.last_seen);
            prop_assert_eq!(ing.days_seen, tl.days_seen);
            prop_assert!(ing.days_seen > 0);
        }
    }
}
