use relay_stream::relay::*;
use relay_stream::{RelayError, ThroughConfig};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_reduce_sums_in_order() {
    let total = reduce(from_iter(1..=100), 0u64, |acc, x: u64| async move {
        Ok(acc + x)
    })
    .await;

    assert_eq!(total, Ok(5050));
}

/// Fold steps are strictly sequential: concatenation order proves no
/// step started before the previous one settled.
#[tokio::test]
async fn test_reduce_folds_strictly_sequentially() {
    let words = vec!["a", "b", "c", "d", "e"];
    let folded = reduce(from_iter(words), String::new(), |mut acc, word| {
        async move {
            // Earlier items take longer; any overlap would scramble the
            // concatenation.
            sleep(Duration::from_millis(if acc.is_empty() { 25 } else { 5 })).await;
            acc.push_str(word);
            Ok(acc)
        }
    })
    .await;

    assert_eq!(folded, Ok("abcde".to_string()));
}

/// A configured concurrency window changes nothing for reduce.
#[tokio::test]
async fn test_reduce_ignores_concurrency_config() {
    let sequential = reduce(from_iter(1..=20), 1u64, |acc, x: u64| async move {
        Ok(acc.wrapping_mul(x).wrapping_add(7))
    })
    .await;

    let configured = reduce_with_config(
        from_iter(1..=20),
        ThroughConfig::concurrent(8),
        1u64,
        |acc, x: u64| async move {
            sleep(Duration::from_millis(1)).await;
            Ok(acc.wrapping_mul(x).wrapping_add(7))
        },
    )
    .await;

    assert_eq!(sequential, configured);
}

#[tokio::test]
async fn test_reduce_rejects_on_fold_error_and_discards_accumulator() {
    let result = reduce(from_iter(1..=10), 0i64, |acc, x: i64| async move {
        if x == 4 {
            Err(RelayError::transform("fold blew up"))
        } else {
            Ok(acc + x)
        }
    })
    .await;

    assert_eq!(result, Err(RelayError::Transform("fold blew up".to_string())));
}

#[tokio::test]
async fn test_reduce_rejects_on_upstream_error() {
    let source = from_results(vec![Ok(1), Ok(2), Err(RelayError::upstream("boom")), Ok(4)]);
    let result = reduce(source, 0i64, |acc, x: i64| async move { Ok(acc + x) }).await;

    assert_eq!(result, Err(RelayError::Upstream("boom".to_string())));
}

#[tokio::test]
async fn test_reduce_of_empty_stream_is_init() {
    let result = reduce(empty::<i32>(), 42, |acc, x| async move { Ok(acc + x) }).await;
    assert_eq!(result, Ok(42));
}
