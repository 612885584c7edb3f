// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_monad::{ClickKind, NodeId, PickTarget, PointerPicker, Tree};

/// Full tree of `fanout` children per node, `depth` levels below the root, with a
/// chain of sibling links in every container.
fn gen_tree(fanout: usize, depth: u32) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.add_root("Monad 0");
    let mut level = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for &parent in &level {
            let children: Vec<_> = (0..fanout)
                .map(|_| tree.add_node(parent).unwrap())
                .collect();
            for pair in children.windows(2) {
                tree.add_link(parent, pair[0], pair[1]).unwrap();
            }
            next.extend(children);
        }
        level = next;
    }
    (tree, root)
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");
    for &(fanout, depth) in &[(4usize, 4u32), (8, 3), (16, 2)] {
        let (mut tree, root) = gen_tree(fanout, depth);
        group.throughput(Throughput::Elements(tree.node_count() as u64));
        group.bench_function(format!("miss_f{fanout}_d{depth}"), |b| {
            let mut picker = |_: PickTarget| false;
            b.iter(|| black_box(tree.walk(root, 1, ClickKind::None, &mut picker)));
        });
        group.bench_function(format!("pointer_f{fanout}_d{depth}"), |b| {
            let mut picker = PointerPicker::new(Point::new(20.0, 20.0));
            b.iter(|| black_box(tree.walk(root, 2, ClickKind::Primary, &mut picker)));
        });
    }
    group.finish();
}

fn bench_deletion(c: &mut Criterion) {
    let mut group = c.benchmark_group("deletion");
    group.bench_function("full_deletion_two_ticks_f8_d3", |b| {
        b.iter_batched(
            || gen_tree(8, 3),
            |(mut tree, root)| {
                let victims: Vec<_> = tree.children(root).step_by(2).collect();
                for v in victims {
                    tree.request_full_deletion(v).unwrap();
                }
                let mut picker = |_: PickTarget| false;
                tree.walk(root, 1, ClickKind::None, &mut picker);
                tree.walk(root, 1, ClickKind::None, &mut picker);
                black_box(tree.node_count());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_walk, bench_deletion);
criterion_main!(benches);
