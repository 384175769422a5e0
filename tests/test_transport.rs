mod common;
use common::*;

use std::io;
use std::time::Duration;

use aurora_bridge::prelude::*;

use aurora_bridge::aurora::transport::{
    read_frame, read_frame_with_retries, TcpTransport, Transport,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::test]
async fn read_frame_accumulates_across_reads() {
    common_setup();

    let (mut reader, mut writer) = tokio::io::duplex(64);
    let frame = response_frame(0, 6, [1, 2, 3, 4]);

    writer.write_all(&frame[..4]).await.unwrap();
    let trailer = frame[4..].to_vec();
    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        writer.write_all(&trailer).await.unwrap();
        writer
    });

    let read = read_frame(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(&read[..], &frame[..]);

    feeder.await.unwrap();
}

#[tokio::test]
async fn read_frame_times_out_on_a_partial_frame() {
    common_setup();

    let (mut reader, mut writer) = tokio::io::duplex(64);
    writer.write_all(&[0, 6, 1]).await.unwrap();

    let result = read_frame(&mut reader, Duration::from_millis(50)).await;
    assert!(matches!(result, Err(AuroraError::ReadTimeout)));
}

#[tokio::test]
async fn read_frame_reports_a_closed_connection() {
    common_setup();

    let (mut reader, mut writer) = tokio::io::duplex(64);
    writer.write_all(&[0, 6]).await.unwrap();
    drop(writer);

    match read_frame(&mut reader, Duration::from_secs(1)).await {
        Err(AuroraError::Transport(e)) => {
            assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn read_frame_with_retries_counts_its_attempts() {
    common_setup();

    let (mut reader, _writer) = tokio::io::duplex(64);

    let result = read_frame_with_retries(&mut reader, Duration::from_millis(10), 3).await;
    assert!(matches!(result, Err(AuroraError::NoResponse { attempts: 3 })));
}

#[tokio::test]
async fn read_frame_with_retries_gives_up_after_a_partial_frame() {
    common_setup();

    let (mut reader, mut writer) = tokio::io::duplex(64);
    writer.write_all(&[0, 6, 1, 2, 3]).await.unwrap();

    let result = read_frame_with_retries(&mut reader, Duration::from_millis(10), 2).await;
    assert!(matches!(result, Err(AuroraError::NoResponse { attempts: 2 })));
}

#[tokio::test]
async fn read_frame_with_retries_returns_a_full_frame() {
    common_setup();

    let (mut reader, mut writer) = tokio::io::duplex(64);
    let frame = response_frame(0, 6, [9, 8, 7, 6]);
    writer.write_all(&frame).await.unwrap();

    let read = read_frame_with_retries(&mut reader, Duration::from_millis(50), 3)
        .await
        .unwrap();
    assert_eq!(&read[..], &frame[..]);
}

#[tokio::test]
async fn tcp_exchange_requires_open() {
    common_setup();

    let mut transport = TcpTransport::new("127.0.0.1", 1, Duration::from_millis(100));

    assert!(!transport.is_connected());
    assert!(matches!(
        transport.exchange(&[0u8; 10]).await,
        Err(AuroraError::NotConnected)
    ));
}

#[tokio::test]
async fn tcp_exchange_discards_stale_bytes_before_sending() {
    common_setup();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let request = request_bytes(2, CommandCode::State, &[]);
    let reply = response_frame(0, 6, [2, 2, 2, 0]);

    let expected_request = request.clone();
    let server_reply = reply.clone();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // late answer from an exchange that timed out earlier
        socket.write_all(&[0xaa; 12]).await.unwrap();

        let mut buf = [0u8; 10];
        socket.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf.to_vec(), expected_request);

        socket.write_all(&server_reply).await.unwrap();
        socket
    });

    let mut transport = TcpTransport::new("127.0.0.1", port, Duration::from_secs(1));
    transport.open().await.unwrap();
    assert!(transport.is_connected());

    // give the stale bytes time to land in our receive buffer
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = transport.exchange(&request).await.unwrap();
    assert_eq!(&response[..], &reply[..]);

    transport.close().await.unwrap();
    assert!(!transport.is_connected());

    server.await.unwrap();
}

#[tokio::test]
async fn tcp_exchange_times_out_on_a_silent_peer() {
    common_setup();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 10];
        socket.read_exact(&mut buf).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let mut transport = TcpTransport::new("127.0.0.1", port, Duration::from_millis(100));
    transport.open().await.unwrap();

    let request = request_bytes(2, CommandCode::State, &[]);
    assert!(matches!(
        transport.exchange(&request).await,
        Err(AuroraError::ReadTimeout)
    ));

    server.abort();
}

#[tokio::test]
async fn tcp_exchange_surfaces_a_peer_hangup() {
    common_setup();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 10];
        socket.read_exact(&mut buf).await.unwrap();
        // reply with half a frame, then hang up
        socket.write_all(&[0, 6, 1]).await.unwrap();
    });

    let mut transport = TcpTransport::new("127.0.0.1", port, Duration::from_secs(1));
    transport.open().await.unwrap();

    let request = request_bytes(2, CommandCode::State, &[]);
    match transport.exchange(&request).await {
        Err(AuroraError::Transport(e)) => {
            assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof)
        }
        other => panic!("unexpected result: {:?}", other),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn tcp_open_fails_when_nobody_listens() {
    common_setup();

    // bind then drop, so the port is known to be closed
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut transport = TcpTransport::new("127.0.0.1", port, Duration::from_secs(1));
    assert!(matches!(
        transport.open().await,
        Err(AuroraError::Transport(_))
    ));
    assert!(!transport.is_connected());
}
