use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use tether::{
    ConnectParams, DeleteOptions, ElementRef, Instance, MemoryAdapter, Offset, Size,
    TopologyRouter,
};

type Bench = Instance<MemoryAdapter, TopologyRouter>;

#[derive(Debug, Clone)]
struct GraphSpec {
    node_count: usize,
    edges: Vec<(usize, usize)>,
}

impl GraphSpec {
    fn build(&self) -> (Bench, Vec<ElementRef>) {
        let mut inst = Instance::new(MemoryAdapter::new(), TopologyRouter);
        let mut nodes = Vec::with_capacity(self.node_count);
        for i in 0..self.node_count {
            let x = (i % 20) as f64 * 150.0;
            let y = (i / 20) as f64 * 80.0;
            nodes.push(inst.adapter_mut().create_with_geometry(
                &format!("n{i}"),
                Offset::new(x, y),
                Size::new(120.0, 60.0),
            ));
        }

        inst.batch(
            |inst| {
                for &(from, to) in &self.edges {
                    let _ = inst.connect(&ConnectParams::new(nodes[from], nodes[to]), None);
                }
            },
            true,
        );
        (inst, nodes)
    }
}

fn build_spec(node_count: usize, fanout: usize) -> GraphSpec {
    let mut edges = Vec::new();
    for i in 0..node_count {
        for k in 1..=fanout {
            let to = i + k;
            if to >= node_count {
                break;
            }
            edges.push((i, to));
        }
    }
    GraphSpec { node_count, edges }
}

fn bench_repaint(c: &mut Criterion) {
    let mut group = c.benchmark_group("repaint");
    group.measurement_time(Duration::from_secs(5));

    let cases = [("n50_f2", 50usize, 2usize), ("n400_f3", 400, 3)];

    for (name, nodes, fanout) in cases {
        let spec = build_spec(nodes, fanout);
        let (mut inst, els) = spec.build();

        group.bench_function(BenchmarkId::new("repaint_everything", name), |b| {
            b.iter(|| black_box(inst.repaint_everything().connections.len()))
        });

        let middle = els[els.len() / 2];
        group.bench_function(BenchmarkId::new("repaint_one", name), |b| {
            b.iter(|| black_box(inst.repaint(black_box(middle)).endpoints.len()))
        });

        group.bench_with_input(
            BenchmarkId::new("delete_every_connection", name),
            &spec,
            |b, spec| {
                b.iter_batched(
                    || spec.build().0,
                    |mut inst| black_box(inst.delete_every_connection(&DeleteOptions::default())),
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_repaint);
criterion_main!(benches);
