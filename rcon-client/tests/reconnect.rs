//! Exercises `Rcon`'s consecutive-failure-triggered reconnect end to end,
//! against a real (fake) TCP server rather than through the session's
//! internals directly.

use std::time::Duration;

use rcon_client::{Rcon, RconError};
use rcon_test_utils::FakeServer;

#[tokio::test]
async fn second_consecutive_timeout_trips_the_threshold_and_reconnect_resets_it() {
    let server = FakeServer::start().await;
    server.expect_handshake(b"K", "T1", "pw").await;

    let client = Rcon::new("127.0.0.1", server.port(), "pw")
        .with_timeout(Duration::from_millis(50))
        .with_reconnect_after_failures(2);

    // The fake server accepts the handshake but never answers anything
    // after it, so both calls below time out on the same connection.
    let first = client.execute("Noop", 2, "").await;
    assert!(matches!(first, Err(RconError::Timeout)));
    assert!(
        client.is_connected(),
        "a single timeout must not yet trip the reconnect threshold"
    );

    let second = client.execute("Noop", 2, "").await;
    assert!(matches!(second, Err(RconError::Timeout)));
    assert!(
        !client.is_connected(),
        "the second consecutive timeout must trip the threshold and drop the connection"
    );

    // The next command opens a fresh connection; a response on it proves
    // the failure count was reset rather than carried over.
    server.expect_handshake(b"K", "T2", "pw").await;
    server.reply_ok("ok").await;
    let third = client.execute("Noop", 2, "").await;
    assert_eq!(third.unwrap(), "ok");
    assert!(client.is_connected());
}
