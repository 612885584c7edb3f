// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_monad::{NodeId, Tree};
use understory_monad_codec::{DecodeOptions, decode, encode};

/// Full tree with sibling links everywhere and one cross-depth link per grandchild.
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
            if let Some(uncle) = tree.parent(parent).and_then(|g| tree.children(g).last()) {
                tree.add_link(parent, children[0], uncle).unwrap();
            }
            next.extend(children);
        }
        level = next;
    }
    (tree, root)
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for &(fanout, depth) in &[(4usize, 4u32), (16, 2)] {
        let (tree, root) = gen_tree(fanout, depth);
        let token = encode(&tree, root).unwrap();
        group.throughput(Throughput::Bytes(token.len() as u64));
        group.bench_function(format!("encode_f{fanout}_d{depth}"), |b| {
            b.iter(|| black_box(encode(&tree, root).unwrap()));
        });
        group.bench_function(format!("decode_f{fanout}_d{depth}"), |b| {
            b.iter_batched(
                || {
                    let mut target = Tree::new();
                    let god = target.add_root("Monad 0");
                    (target, god)
                },
                |(mut target, god)| {
                    let r = decode(&mut target, &token, god, &DecodeOptions::default());
                    black_box(r.unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
