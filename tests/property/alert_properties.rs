use alert_console::engine::{Acceptance, Aggregator, RejectReason};
use alert_console::{Category, IncomingAlert, classify};
use chrono::{DateTime, Local, TimeZone};
use proptest::prelude::*;
use strum::IntoEnumIterator;

const MARKER: &str = "无异常";

fn stamp() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Mix of noise, heartbeats, blanks, markup and keyword-bearing alerts.
fn message() -> impl Strategy<Value = String> {
    prop_oneof![
        ".{0,40}",
        Just(MARKER.to_string()),
        Just(String::new()),
        "[ \t]{1,4}",
        "<[a-z]{1,4}>[^<]{0,12}</[a-z]{1,4}>",
        "[^<]{0,8}(车辆|行驶|跌倒|摔倒|物品|聚集|人群)[^<]{0,8}",
        "[^<]{0,8}无异常[^<]{0,8}",
    ]
}

proptest! {
    #[test]
    fn classify_is_total_and_deterministic(s in ".*") {
        let first = classify(&s);
        prop_assert_eq!(first, classify(&s));
        prop_assert!(Category::iter().any(|c| c == first));
    }

    #[test]
    fn closed_tags_never_change_the_category(s in ".{0,120}", tag in "[a-z]{1,6}") {
        let wrapped = format!("<{}>{}", tag, s);
        prop_assert_eq!(classify(&wrapped), classify(&s));
    }

    #[test]
    fn first_rule_wins_wherever_its_keyword_sits(prefix in "[^<]{0,30}", suffix in "[^<]{0,30}") {
        let text = format!("{}车辆{}", prefix, suffix);
        prop_assert_eq!(classify(&text), Category::TrafficViolation);
    }

    #[test]
    fn marker_anywhere_is_suppressed(
        prefix in "[^<]{0,30}",
        suffix in "[^<]{0,30}",
        tag in proptest::option::of("[a-z]{1,4}"),
    ) {
        let text = match tag {
            Some(tag) => format!("<{t}>{}{}{}</{t}>", prefix, MARKER, suffix, t = tag),
            None => format!("{}{}{}", prefix, MARKER, suffix),
        };

        let mut agg = Aggregator::default();
        let outcome = agg.accept(IncomingAlert::new(text.clone(), stamp()));
        prop_assert!(
            matches!(outcome, Acceptance::Rejected(RejectReason::Heartbeat)),
            "{:?} -> {:?}", text, outcome
        );
        prop_assert_eq!(agg.screen(Some(text.as_str())), Some(RejectReason::Heartbeat));
        prop_assert_eq!(agg.total_count(), 0);
        prop_assert_eq!(agg.counts().total(), 0);
    }

    #[test]
    fn counters_match_history_over_any_stream(stream in prop::collection::vec(message(), 0..60)) {
        let mut agg = Aggregator::default();
        for text in &stream {
            let before = agg.total_count();
            let screened = agg.screen(Some(text.as_str()));
            let outcome = agg.accept(IncomingAlert::new(text.clone(), stamp()));

            match outcome {
                Acceptance::Accepted(accepted) => {
                    prop_assert!(screened.is_none());
                    prop_assert_eq!(agg.total_count(), before + 1);
                    prop_assert_eq!(accepted.sequence_number, agg.total_count());
                    prop_assert_eq!(accepted.alert.category(), classify(text));
                }
                Acceptance::Rejected(reason) => {
                    prop_assert_eq!(screened, Some(reason));
                    prop_assert_eq!(agg.total_count(), before);
                }
            }

            prop_assert_eq!(agg.counts().total() as usize, agg.history().len());
            prop_assert_eq!(agg.history().len(), agg.total_count());
            prop_assert_eq!(agg.today_count_on(stamp().date_naive()), agg.total_count());
        }
    }
}
