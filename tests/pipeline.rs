use alloy_primitives::{Address, address};
use punk_indexer::repository::{Database, TransferRepository};
use punk_indexer::source::message_stream;
use punk_indexer::{
    EventKind, EventMatcher, FailurePolicy, IndexerConfig, Pipeline, SqliteSink, TransferDecoder,
};
use serde_json::json;
use tracing::Span;

const CONTRACT: &str = "0xb47e3cd837ddf8e4c57f05d70ab865de6e193bbb";
const TRANSFER_SIG: &str = "0x05af636b70da6819000c49f85b21fa82081c632069bb626f30932034099107d8";
const ASSIGN_SIG: &str = "0x8a0e37b73a0d9c82e205d4d1a3ff3d0b57ce5f4d7bccf6bac03336dc101cb7ba";
const ERC20_TRANSFER_SIG: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

fn topic(address: &str) -> String {
    format!("0x{}{}", "0".repeat(24), address.trim_start_matches("0x"))
}

fn log_line(
    block_number: u64,
    log_index: u64,
    address: &str,
    topic0: &str,
    topic1: Option<String>,
    topic2: Option<String>,
    data: &str,
) -> String {
    json!({
        "block_number": block_number,
        "transaction_index": 3,
        "log_index": log_index,
        "transaction_hash": format!("0x{block_number:064x}"),
        "address": address,
        "topic0": topic0,
        "topic1": topic1,
        "topic2": topic2,
        "topic3": null,
        "data": data,
        "chain_id": 1,
        "block_hash": format!("0x{:064x}", block_number + 1),
    })
    .to_string()
}

fn input() -> String {
    let alice = "0xaaaa00000000000000000000000000000000000b";
    let bob = "0x2222222222222222222222222222222222222222";
    let other_contract = "0x1111111111111111111111111111111111111111";

    [
        // before deployment
        log_line(3_914_495, 0, CONTRACT, ASSIGN_SIG, Some(topic(alice)), None, "0x01"),
        // mint of punk 1000
        log_line(
            3_914_496,
            0,
            CONTRACT,
            ASSIGN_SIG,
            Some(topic(alice)),
            None,
            "0x000000000000000000000000000000000000000000000000000000000003e8",
        ),
        // unrelated contract
        log_line(3_914_600, 0, other_contract, ASSIGN_SIG, Some(topic(alice)), None, "0x02"),
        // unrelated event on the punks contract
        log_line(
            3_914_700,
            0,
            CONTRACT,
            ERC20_TRANSFER_SIG,
            Some(topic(alice)),
            Some(topic(bob)),
            "0x01",
        ),
        "{\"block_number\": \"not a number\"}".to_string(),
        String::new(),
        // alice -> bob
        log_line(
            3_920_000,
            4,
            CONTRACT,
            TRANSFER_SIG,
            Some(topic(alice)),
            Some(topic(bob)),
            "0x3e8",
        ),
        // broken data on a matched log
        log_line(3_921_000, 0, CONTRACT, TRANSFER_SIG, Some(topic(bob)), Some(topic(alice)), "0xzz"),
    ]
    .join("\n")
}

fn pipeline(policy: FailurePolicy) -> Pipeline<SqliteSink> {
    let config = IndexerConfig::default();
    Pipeline::new(
        EventMatcher::new(&config),
        TransferDecoder::new(&config),
        SqliteSink::new(Database::in_memory().unwrap(), Span::none()),
        policy,
        Span::none(),
    )
}

#[tokio::test]
async fn indexes_punk_history_into_sqlite() {
    let input = input();
    let mut pipeline = pipeline(FailurePolicy::Skip);

    let stats = pipeline.run(message_stream(input.as_bytes())).await.unwrap();
    assert_eq!(stats.received, 7);
    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.decode_failures, 1);

    let sink = pipeline.into_sink();
    assert_eq!(sink.inserted(), 2);

    let repo = TransferRepository::new(&sink.database().conn);
    let history = repo.get_asset_history(1000).unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0].kind, EventKind::Assign);
    assert_eq!(history[0].from_address, Address::ZERO);
    assert_eq!(
        history[0].to_address,
        address!("aaaa00000000000000000000000000000000000b")
    );
    assert_eq!(history[0].block_number, 3_914_496);

    assert_eq!(history[1].kind, EventKind::Transfer);
    assert_eq!(history[1].from_address, history[0].to_address);
    assert_eq!(history[1].to_address, Address::repeat_byte(0x22));
    assert_eq!(history[1].transaction_index, 3);
    assert_eq!(history[1].log_index, 4);

    assert_eq!(
        repo.get_current_owner(1000).unwrap(),
        Some(Address::repeat_byte(0x22))
    );
}

#[tokio::test]
async fn replaying_the_stream_does_not_duplicate_rows() {
    let input = input();
    let mut pipeline = pipeline(FailurePolicy::Skip);

    pipeline.run(message_stream(input.as_bytes())).await.unwrap();
    pipeline.run(message_stream(input.as_bytes())).await.unwrap();

    let sink = pipeline.into_sink();
    assert_eq!(sink.inserted(), 2);
    assert_eq!(sink.duplicates(), 2);

    let stats = TransferRepository::new(&sink.database().conn)
        .get_statistics()
        .unwrap();
    assert_eq!(stats.total_transfers, 2);
    assert_eq!(stats.mints, 1);
}

#[tokio::test]
async fn halt_policy_stops_at_first_bad_message() {
    let input = input();
    let mut pipeline = pipeline(FailurePolicy::Halt);

    let result = pipeline.run(message_stream(input.as_bytes())).await;
    assert!(result.is_err());
    assert_eq!(pipeline.stats().written, 1);
    assert_eq!(pipeline.stats().malformed, 1);
}

#[tokio::test]
async fn invalid_utf8_line_is_counted_as_malformed_and_indexing_continues() {
    let mint = log_line(
        3_914_496,
        0,
        CONTRACT,
        ASSIGN_SIG,
        Some(topic("0xaaaa00000000000000000000000000000000000b")),
        None,
        "0x3e8",
    );
    let mut input = b"\xff\xfe garbage\n".to_vec();
    input.extend_from_slice(mint.as_bytes());
    input.push(b'\n');

    let mut pipeline = pipeline(FailurePolicy::Skip);
    let stats = pipeline.run(message_stream(input.as_slice())).await.unwrap();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.written, 1);
}
