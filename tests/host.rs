mod support;

use sdhttpd::network::application::http::{Outcome, Server, Status};
use sdhttpd::network::tcp::TcpAcceptor;
use sdhttpd::storage::host::HostFs;
use sdhttpd::storage::{FileSystem, Mode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{Read as StdRead, Write as StdWrite};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use support::{Part, Response, upload_request};

/// A fresh directory under `SDHTTPD_TEST_DIR` or the system temp dir.
fn test_root(name: &str) -> PathBuf {
    dotenvy::dotenv().ok();
    let base = std::env::var_os("SDHTTPD_TEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let root = base.join(format!("sdhttpd-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).unwrap();
    root
}

/// Sends `request` from a client thread and returns everything it read back.
///
/// The client waits `delay` before reading so a large response is still
/// being written when the server has finished with the request.
fn client(
    address: std::net::SocketAddr,
    request: Vec<u8>,
    delay: Duration,
) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut stream = TcpStream::connect(address).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(&request).unwrap();
        thread::sleep(delay);
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        response
    })
}

fn browser_get(path: &str) -> Vec<u8> {
    format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nUser-Agent: curl/8.5.0\r\nAccept: */*\r\n\r\n",
        path
    )
    .into_bytes()
}

#[test]
fn test_host_fs_files_and_directories() {
    let root = test_root("fs");
    std::fs::create_dir(root.join("logs")).unwrap();
    std::fs::write(root.join("logs/boot.txt"), b"booted").unwrap();

    let mut fs = HostFs::new(&root);

    let mut file = fs.open("/logs/boot.txt", Mode::Read).unwrap();
    assert!(!fs.is_dir(&file));
    assert_eq!(fs.size(&file), 6);
    let mut buf = [0u8; 16];
    let n = fs.read(&mut file, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"booted");
    assert_eq!(fs.read(&mut file, &mut buf).unwrap(), 0);
    fs.close(file).unwrap();

    let mut out = fs.open("logs/new.txt", Mode::WriteTruncate).unwrap();
    assert_eq!(fs.write(&mut out, b"fresh").unwrap(), 5);
    fs.flush(&mut out).unwrap();
    fs.close(out).unwrap();
    assert_eq!(std::fs::read(root.join("logs/new.txt")).unwrap(), b"fresh");

    let mut dir = fs.open("/logs", Mode::Read).unwrap();
    assert!(fs.is_dir(&dir));
    fs.rewind_dir(&mut dir).unwrap();
    let mut names = Vec::new();
    let mut name = [0u8; 64];
    while let Some(len) = fs.next_entry(&mut dir, &mut name).unwrap() {
        names.push(String::from_utf8(name[..len].to_vec()).unwrap());
    }
    names.sort();
    assert_eq!(names, ["boot.txt", "new.txt"]);
    fs.close(dir).unwrap();

    assert!(fs.open("../escape", Mode::Read).is_err());
    assert!(fs.open("missing.txt", Mode::Read).is_err());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_serves_over_tcp() {
    let root = test_root("tcp");
    std::fs::create_dir(root.join("uploads")).unwrap();
    std::fs::write(root.join("hello.txt"), b"hello from disk").unwrap();
    let mut big = vec![0u8; 4 * 1024 * 1024];
    StdRng::seed_from_u64(7).fill(&mut big[..]);
    std::fs::write(root.join("big.bin"), &big).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let acceptor = TcpAcceptor::new(listener, Some(Duration::from_secs(5)));

    let mut scratch = [0u8; 512];
    let mut streaming = [0u8; 64];
    let mut server =
        Server::new(acceptor, HostFs::new(&root), &mut scratch, &mut streaming).unwrap();

    let request = upload_request("/uploads", &[Part::file("up.txt", b"sent over tcp")]);
    let pending = client(address, request, Duration::ZERO);
    let outcome = server.poll().unwrap();
    assert!(matches!(outcome, Some(Outcome::Uploaded(report)) if report.files_written == 1));
    let response = Response::parse(&pending.join().unwrap());
    assert_eq!(response.status, 303);
    assert_eq!(
        std::fs::read(root.join("uploads/up.txt")).unwrap(),
        b"sent over tcp"
    );

    let pending = client(address, browser_get("/hello.txt"), Duration::ZERO);
    assert_eq!(server.poll().unwrap(), Some(Outcome::Responded(Status::Ok)));
    let response = Response::parse(&pending.join().unwrap());
    assert_eq!(response.body, b"hello from disk");

    for _ in 0..3 {
        let pending = client(address, browser_get("/big.bin"), Duration::from_millis(200));
        assert_eq!(server.poll().unwrap(), Some(Outcome::Responded(Status::Ok)));
        let response = Response::parse(&pending.join().unwrap());
        assert_eq!(response.header("Content-Length"), Some("4194304"));
        assert!(response.body == big, "body truncated to {} bytes", response.body.len());
    }

    let pending = client(address, browser_get("/uploads"), Duration::ZERO);
    server.poll().unwrap();
    let response = Response::parse(&pending.join().unwrap());
    assert!(
        response
            .text()
            .contains("<a href=\"/uploads/up.txt\">up.txt</a><br/>")
    );

    let pending = client(address, browser_get("/missing"), Duration::ZERO);
    assert_eq!(
        server.poll().unwrap(),
        Some(Outcome::Responded(Status::NotFound))
    );
    assert_eq!(Response::parse(&pending.join().unwrap()).status, 404);

    std::fs::remove_dir_all(&root).unwrap();
}
