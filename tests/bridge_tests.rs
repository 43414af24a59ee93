use relay_stream::relay::*;
use relay_stream::{collect, collect_items, wait, RelayError, RelayStreamExt};

#[tokio::test]
async fn test_wait_resolves_on_clean_end() {
    assert_eq!(wait(from_iter(vec![1, 2, 3])).await, Ok(()));
}

#[tokio::test]
async fn test_wait_on_empty_stream() {
    assert_eq!(wait(empty::<i32>()).await, Ok(()));
}

/// The first signal wins: an error followed by more data (or an end)
/// settles the future with that error, once.
#[tokio::test]
async fn test_wait_rejects_with_first_error() {
    let source = from_results(vec![
        Ok(1),
        Err(RelayError::upstream("first")),
        Ok(2),
        Err(RelayError::upstream("second")),
    ]);

    assert_eq!(wait(source).await, Err(RelayError::Upstream("first".to_string())));
}

#[tokio::test]
async fn test_collect_concatenates_strings() {
    let source = from_iter(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(collect(source).await, Ok("abc".to_string()));
}

#[tokio::test]
async fn test_collect_concatenates_binary_chunks() {
    let source = from_iter(vec![vec![1u8, 2], vec![], vec![3, 4, 5]]);
    assert_eq!(collect(source).await, Ok(vec![1u8, 2, 3, 4, 5]));
}

#[tokio::test]
async fn test_collect_rejects_and_discards_partial_payload() {
    let source = from_results(vec![
        Ok("partial".to_string()),
        Err(RelayError::upstream("torn stream")),
        Ok("never seen".to_string()),
    ]);

    assert_eq!(
        collect(source).await,
        Err(RelayError::Upstream("torn stream".to_string()))
    );
}

#[tokio::test]
async fn test_collect_items_preserves_order() {
    assert_eq!(
        collect_items(from_iter(0..5)).await,
        Ok(vec![0, 1, 2, 3, 4])
    );
}

#[tokio::test]
async fn test_emit_after_delays_the_payload() {
    let started = std::time::Instant::now();
    let result = collect_items(emit_after(7, std::time::Duration::from_millis(20))).await;
    assert_eq!(result, Ok(vec![7]));
    assert!(started.elapsed() >= std::time::Duration::from_millis(20));
}

#[tokio::test]
async fn test_eval_and_raise_constructors() {
    assert_eq!(collect_items(eval(async { 9 })).await, Ok(vec![9]));
    assert_eq!(
        wait(raise::<i32>(RelayError::custom("nope"))).await,
        Err(RelayError::Custom("nope".to_string()))
    );
}

/// The extension-trait spellings route through the same helpers.
#[tokio::test]
async fn test_ext_trait_bridging() {
    let combined = from_iter(vec!["x".to_string(), "y".to_string()])
        .collect_relay()
        .await;
    assert_eq!(combined, Ok("xy".to_string()));

    let waited = from_iter(vec![1, 2, 3]).wait_relay().await;
    assert_eq!(waited, Ok(()));
}
