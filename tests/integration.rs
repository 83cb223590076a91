//! Integration tests for pwnative.
//!
//! These tests run a throwaway server on a Unix socket and check that the
//! client reassembles what it sends into frames.

use std::time::Duration;

use pwnative::protocol::{build_frame, Frame, FrameBuffer, Header, HEADER_SIZE};
use pwnative::{Client, ConnectionState, PwError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

fn frame_bytes(id: u32, opcode: u8, seq: u32, payload: &[u8]) -> Vec<u8> {
    let header = Header::new(id, opcode, payload.len() as u32, seq, 0);
    build_frame(&header, payload).unwrap()
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

/// Full frame encode/decode cycle through `FrameBuffer`.
#[test]
fn test_frames_survive_arbitrary_chunking() {
    let mut stream = Vec::new();
    for seq in 0..20u32 {
        let payload = vec![seq as u8; (seq as usize * 97) % 2000];
        stream.extend(frame_bytes(seq, (seq % 7) as u8, seq, &payload));
    }

    for chunk_size in [1, 7, HEADER_SIZE, 1024] {
        let mut buffer = FrameBuffer::new();
        let mut frames = Vec::new();
        for chunk in stream.chunks(chunk_size) {
            frames.extend(buffer.push(chunk).unwrap());
        }

        assert_eq!(frames.len(), 20, "chunk size {chunk_size}");
        for (seq, frame) in frames.iter().enumerate() {
            assert_eq!(frame.seq(), seq as u32);
            assert_eq!(frame.opcode(), (seq % 7) as u8);
            assert_eq!(frame.payload_len(), (seq * 97) % 2000);
            assert!(frame.payload().iter().all(|&b| b == seq as u8));
        }
    }
}

#[tokio::test]
async fn test_client_delivers_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipewire-0");
    let listener = UnixListener::bind(&path).unwrap();

    let (tx, mut frames) = mpsc::unbounded_channel::<Frame>();
    let mut client = Client::builder()
        .socket_path(&path)
        .on_frame(move |frame| {
            let _ = tx.send(frame);
        })
        .start();

    let (mut server, _) = listener.accept().await.unwrap();

    let mut data = frame_bytes(0, 1, 0, b"hello");
    data.extend(frame_bytes(2, 3, 1, &vec![0x42; 3000]));
    // Split mid-header to make sure partial headers are carried over.
    server.write_all(&data[..10]).await.unwrap();
    server.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    server.write_all(&data[10..]).await.unwrap();

    let first = next(&mut frames).await;
    assert_eq!(first.id(), 0);
    assert_eq!(first.opcode(), 1);
    assert_eq!(first.payload(), b"hello");

    let second = next(&mut frames).await;
    assert_eq!(second.id(), 2);
    assert_eq!(second.seq(), 1);
    assert_eq!(second.payload_len(), 3000);

    client.close().await;
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_client_discards_partial_frame_on_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipewire-0");
    let listener = UnixListener::bind(&path).unwrap();

    let (tx, mut frames) = mpsc::unbounded_channel::<Frame>();
    let (err_tx, mut errors) = mpsc::unbounded_channel::<String>();
    let mut client = Client::builder()
        .socket_path(&path)
        .backoff(Duration::from_millis(50))
        .on_frame(move |frame| {
            let _ = tx.send(frame);
        })
        .on_error(move |e| {
            let _ = err_tx.send(e.to_string());
        })
        .start();

    // First connection: half a frame, then hang up.
    let (mut server, _) = listener.accept().await.unwrap();
    let partial = frame_bytes(9, 9, 9, b"never completed");
    server.write_all(&partial[..HEADER_SIZE + 3]).await.unwrap();
    drop(server);

    assert_eq!(next(&mut errors).await, PwError::ConnectionClosed.to_string());

    // Second connection: one complete frame.
    let (mut server, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .unwrap()
        .unwrap();
    server
        .write_all(&frame_bytes(1, 2, 3, b"fresh"))
        .await
        .unwrap();

    let frame = next(&mut frames).await;
    assert_eq!(frame.id(), 1);
    assert_eq!(frame.payload(), b"fresh");

    client.close().await;
    assert!(frames.try_recv().is_err());
}

#[tokio::test]
async fn test_client_reconnects_after_oversize_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipewire-0");
    let listener = UnixListener::bind(&path).unwrap();

    let (connected_tx, mut connects) = mpsc::unbounded_channel::<()>();
    let (err_tx, mut errors) = mpsc::unbounded_channel::<bool>();
    let (tx, mut frames) = mpsc::unbounded_channel::<Frame>();
    let mut client = Client::builder()
        .socket_path(&path)
        .max_payload_size(64)
        .backoff(Duration::from_millis(50))
        .on_connected(move || {
            let _ = connected_tx.send(());
        })
        .on_frame(move |frame| {
            let _ = tx.send(frame);
        })
        .on_error(move |e| {
            let _ = err_tx.send(matches!(e, PwError::FrameTooLarge { size: 3000, max: 64 }));
        })
        .start();

    let (mut server, _) = listener.accept().await.unwrap();
    next(&mut connects).await;

    // Oversize header, its whole payload, then a frame that would be valid.
    let mut data = Header::new(1, 1, 3000, 1, 0).encode().unwrap().to_vec();
    data.extend(vec![0u8; 3000]);
    data.extend(frame_bytes(5, 0, 2, b"ok"));
    // The client may hang up before the write completes.
    let _ = server.write_all(&data).await;

    assert!(next(&mut errors).await);

    // The client drops the out-of-sync connection instead of reading on.
    let mut buf = vec![0u8; 64];
    let n = tokio::time::timeout(WAIT, server.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);

    let (mut server, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .unwrap()
        .unwrap();
    next(&mut connects).await;
    server
        .write_all(&frame_bytes(6, 0, 3, b"fresh"))
        .await
        .unwrap();

    // Nothing from the oversize payload was reported as a frame.
    let frame = next(&mut frames).await;
    assert_eq!(frame.id(), 6);
    assert_eq!(frame.payload(), b"fresh");

    client.close().await;
    assert!(frames.try_recv().is_err());
    assert!(errors.try_recv().is_err());
}
