use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::http::bench_multipart_feed,
    network::application::http::bench_decode_path,
    network::application::http::bench_upload_to_ram
);
criterion_main!(benches);
