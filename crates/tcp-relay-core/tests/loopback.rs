//! Loopback tests: real sockets on 127.0.0.1 with ephemeral ports.

use std::io::{self, Cursor, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tcp_relay_core::{
    ConnectionState, Direction, Listener, Mode, Receiver, Sender, Session, SessionConfig,
    TransferConfig,
};

fn loopback_listener() -> Listener {
    Listener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0), 10).expect("bind loopback")
}

fn local_v4(listener: &Listener) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::LOCALHOST, listener.local_addr().port())
}

/// Payload with NULs, non-UTF8 bytes and several chunk boundaries.
fn awkward_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| match i % 7 {
            0 => 0x00,
            1 => 0xff,
            2 => 0xc3,
            _ => (i % 256) as u8,
        })
        .collect()
}

/// Output sink shared between the serving thread and the test.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn round_trip_preserves_every_byte() {
    let transfer = TransferConfig {
        buffer_size: 1000,
        ..TransferConfig::default()
    };
    let listener = loopback_listener();
    let target = local_v4(&listener);
    let payload = awkward_payload(64 * 1024 + 17);

    let expected = payload.clone();
    let sending = transfer.clone();
    let client = thread::spawn(move || {
        let sender = Sender::connect(target, &sending).unwrap();
        sender.relay(&mut Cursor::new(payload)).unwrap()
    });

    let mut out = Vec::new();
    let received = Receiver::accept_one(&listener, &transfer)
        .unwrap()
        .drain(&mut out)
        .unwrap();
    let sent = client.join().unwrap();

    assert_eq!(out, expected);
    assert_eq!(received.bytes, expected.len() as u64);
    assert_eq!(sent.bytes, expected.len() as u64);
    assert_eq!(sent.direction, Direction::Outbound);
    assert_eq!(received.direction, Direction::Inbound);
    assert_eq!(received.state, ConnectionState::Closed);
}

#[test]
fn drain_ends_on_peer_half_close() {
    let listener = loopback_listener();
    let target = local_v4(&listener);

    // The client half-closes but keeps its socket open and waits for the
    // receiver to finish, so only the FIN can end the drain.
    let client = thread::spawn(move || {
        let mut stream = TcpStream::connect(target).unwrap();
        stream.write_all(b"no trailing newline").unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        rest
    });

    let mut out = Vec::new();
    let info = Receiver::accept_one(&listener, &TransferConfig::default())
        .unwrap()
        .drain(&mut out)
        .unwrap();

    assert_eq!(out, b"no trailing newline");
    assert_eq!(info.bytes, 19);
    assert!(client.join().unwrap().is_empty());
}

#[test]
fn sender_half_closes_write_side() {
    let listener = loopback_listener();
    let target = local_v4(&listener);

    let client = thread::spawn(move || {
        let sender = Sender::connect(target, &TransferConfig::default()).unwrap();
        sender.relay(&mut Cursor::new(b"ping".to_vec())).unwrap()
    });

    let (mut peer, _) = listener.accept().unwrap();
    let mut got = Vec::new();
    peer.read_to_end(&mut got).unwrap();

    assert_eq!(got, b"ping");
    assert_eq!(client.join().unwrap().bytes, 4);
}

#[test]
fn terminal_input_connects_and_sends_nothing() {
    let listener = loopback_listener();
    let target = local_v4(&listener);

    let client = thread::spawn(move || {
        let config = SessionConfig::send(target.ip().to_string(), target.port());
        let session = Session::new(config).unwrap();
        session.run(None::<&mut io::Empty>, &mut io::sink()).unwrap()
    });

    let (mut peer, _) = listener.accept().unwrap();
    let mut got = Vec::new();
    peer.read_to_end(&mut got).unwrap();

    assert!(got.is_empty());
    let stats = client.join().unwrap();
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.bytes_sent, 0);
}

#[test]
fn session_send_then_listen_without_repeat() {
    let mut config = SessionConfig::listen();
    config.address = "127.0.0.1".into();
    config.port = 0;
    let server = Session::new(config).unwrap();
    assert_eq!(server.config().mode, Mode::Listen);

    let listener = server.bind().unwrap();
    let target = local_v4(&listener);

    let client = thread::spawn(move || {
        let session = Session::new(SessionConfig::send("127.0.0.1", target.port())).unwrap();
        session
            .run(Some(&mut Cursor::new(b"hello\0world\n".to_vec())), &mut io::sink())
            .unwrap()
    });

    let mut out = Vec::new();
    let stats = server.serve(&listener, &mut out).unwrap();

    assert_eq!(out, b"hello\0world\n");
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.bytes_received, 12);
    assert_eq!(client.join().unwrap().bytes_sent, 12);
}

#[test]
fn repeat_mode_drains_sequential_peers() {
    let mut config = SessionConfig::listen();
    config.address = "127.0.0.1".into();
    config.port = 0;
    config.repeat = true;
    let server = Session::new(config).unwrap();

    let listener = server.bind().unwrap();
    let target = local_v4(&listener);
    let sink = SharedSink::default();

    // Repeat mode never returns on its own; the thread is left running.
    let mut serving = sink.clone();
    thread::spawn(move || server.serve(&listener, &mut serving));

    for payload in [&b"first peer|"[..], &b"second peer"[..]] {
        let sender = Sender::connect(target, &TransferConfig::default()).unwrap();
        sender.relay(&mut Cursor::new(payload)).unwrap();
    }

    let expected = b"first peer|second peer".to_vec();
    for _ in 0..200 {
        if sink.contents() == expected {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(sink.contents(), expected);
}

#[test]
fn connect_to_closed_port_fails() {
    let port = loopback_listener().local_addr().port();
    let session = Session::new(SessionConfig::send("127.0.0.1", port)).unwrap();

    let err = session
        .run(Some(&mut io::empty()), &mut io::sink())
        .unwrap_err();
    assert_eq!(err.exit_code(), 255);
    assert!(err.to_string().starts_with("connect: "));
}

#[test]
fn bad_address_is_rejected_before_connecting() {
    let session = Session::new(SessionConfig::send("not an address", 3000)).unwrap();
    let err = session
        .run(Some(&mut io::empty()), &mut io::sink())
        .unwrap_err();
    assert!(matches!(err, tcp_relay_core::Error::Address(_)));
}
