use criterion::{BatchSize, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdhttpd::network::application::http::path::decode_in_place;
use sdhttpd::network::application::http::{MultipartParser, Outcome, PartHandler, Server};
use sdhttpd::network::{Accept, Close, Connection, Read, Write};
use sdhttpd::storage::ram::RamFs;
use std::hint::black_box;
use std::ops::ControlFlow;

const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

struct Sink(usize);

impl PartHandler for Sink {
    fn on_part_data(&mut self, data: &[u8]) -> ControlFlow<()> {
        self.0 += data.len();
        ControlFlow::Continue(())
    }
}

struct SliceConnection<'a> {
    input: &'a [u8],
    max_read: usize,
}

impl Read for SliceConnection<'_> {
    type Error = ();
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.max_read).min(self.input.len());
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input = &self.input[n..];
        Ok(n)
    }
}

impl Write for SliceConnection<'_> {
    type Error = ();
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for SliceConnection<'_> {
    type Error = ();
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for SliceConnection<'_> {}

struct NoClients;

impl Accept for NoClients {
    type Connection = SliceConnection<'static>;
    type Error = ();
    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error> {
        Ok(None)
    }
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut payload = vec![0u8; len];
    rng.fill(&mut payload[..]);
    // Sprinkle line breaks so the parser exercises its lookbehind.
    for at in (0..len).step_by(97) {
        payload[at] = b'\r';
        if at + 1 < len {
            payload[at + 1] = b'\n';
        }
    }
    payload
}

fn body(payload: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"bench.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        BOUNDARY
    )
    .into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn bench_multipart_feed(c: &mut Criterion) {
    let body = body(&random_payload(64 * 1024));
    let mut group = c.benchmark_group("multipart_feed");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunk in [64usize, 512, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut parser = MultipartParser::new(BOUNDARY.as_bytes()).unwrap();
                let mut sink = Sink(0);
                for piece in body.chunks(chunk) {
                    parser.feed(black_box(piece), &mut sink);
                }
                assert!(parser.is_finished());
                black_box(sink.0)
            })
        });
    }
    group.finish();
}

pub fn bench_decode_path(c: &mut Criterion) {
    let encoded = b"/media/photos/2024%20summer/IMG%5F0042+copy%28final%29.jpg".to_vec();
    c.bench_function("decode_path", |b| {
        b.iter_batched(
            || encoded.clone(),
            |mut buf| black_box(decode_in_place(&mut buf)),
            BatchSize::SmallInput,
        )
    });
}

pub fn bench_upload_to_ram(c: &mut Criterion) {
    let payload = random_payload(8 * 1024);
    let body = body(&payload);
    let mut request = format!(
        "POST /uploads HTTP/1.1\r\nContent-Type: multipart/form-data; boundary={}\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY,
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);

    let mut group = c.benchmark_group("upload_to_ram");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("8KiB", |b| {
        b.iter_batched(
            || {
                let mut fs: RamFs<4, { 16 * 1024 }> = RamFs::new();
                fs.create_dir("uploads").unwrap();
                fs
            },
            |fs| {
                let mut scratch = [0u8; 512];
                let mut streaming = [0u8; 64];
                let mut server =
                    Server::new(NoClients, fs, &mut scratch, &mut streaming).unwrap();
                let outcome = server.serve(SliceConnection {
                    input: &request,
                    max_read: 1460,
                });
                assert!(matches!(outcome, Outcome::Uploaded(report) if report.complete));
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
