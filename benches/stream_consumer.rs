//! Benchmarks for the streaming path
//!
//! This benchmark measures:
//! - SSE decoding + chunk mapping through `Pipeline`
//! - Consumer throughput with and without a pending boundary cancellation
//! - Boundary evaluation cost

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use deepseek_kit::pipeline::Pipeline;
use deepseek_kit::stream::{CancelBoundary, ConsumerConfig, StreamConsumer};
use deepseek_kit::types::StreamFragment;
use deepseek_kit::BoxStream;
use futures::{stream, StreamExt};

fn sse_body(n: usize) -> String {
    let mut body = String::new();
    for i in 0..n {
        body.push_str(&format!(
            "data: {{\"id\":\"c1\",\"model\":\"deepseek-chat\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"word{} \"}},\"finish_reason\":null}}]}}\n\n",
            i
        ));
    }
    body.push_str("data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\ndata: [DONE]\n\n");
    body
}

fn fragments(n: usize) -> Vec<deepseek_kit::Result<StreamFragment>> {
    (0..n)
        .map(|i| {
            let text = if i % 12 == 11 { "end. " } else { "word " };
            Ok(StreamFragment::text(text))
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("pipeline");
    let body = sse_body(500);
    group.throughput(Throughput::Bytes(body.len() as u64));

    group.bench_function("decode_map_500_chunks", |b| {
        b.to_async(&rt).iter(|| async {
            let chunks: Vec<deepseek_kit::Result<Bytes>> = body
                .as_bytes()
                .chunks(64)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(chunks));
            let out = Pipeline::sse().process_stream(input).await.unwrap();
            black_box(out.collect::<Vec<_>>().await.len())
        })
    });
    group.finish();
}

fn bench_consumer(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("consumer");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("consume_1000_fragments", |b| {
        b.to_async(&rt).iter(|| async {
            let consumer = StreamConsumer::new(ConsumerConfig::default());
            let session = consumer.consume(stream::iter(fragments(1000))).await;
            black_box(session.chunk_count())
        })
    });

    group.bench_function("consume_with_pending_paragraph_cancel", |b| {
        b.to_async(&rt).iter(|| async {
            let consumer = StreamConsumer::new(ConsumerConfig::default());
            // Never satisfied: every fragment pays for an evaluation.
            consumer
                .control()
                .cancel(CancelBoundary::AfterParagraph, "bench");
            let session = consumer.consume(stream::iter(fragments(1000))).await;
            black_box(session.chunk_count())
        })
    });
    group.finish();
}

fn bench_boundaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary_evaluate");
    let buffer = "Lorem ipsum dolor sit amet ".repeat(200);
    for boundary in CancelBoundary::ALL {
        group.bench_function(boundary.as_str(), |b| {
            b.iter(|| black_box(boundary.evaluate(black_box(&buffer), black_box("consectetur adipiscing"))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_consumer, bench_boundaries);
criterion_main!(benches);
