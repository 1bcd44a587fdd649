use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_command_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    group.bench_function("typing_insert_with_100_threads", |b| {
        let mut session = common::session_with_comments(100, 100);
        session.set_cursor(0);
        b.iter(|| {
            session.insert_char(std::hint::black_box('x')).unwrap();
        });
    });

    group.bench_function("undo_redo_ping_pong", |b| {
        let mut session = common::session_with_comments(100, 100);
        session.set_cursor(0);
        session.insert_char('x').unwrap();
        b.iter(|| {
            session.undo().unwrap();
            session.redo().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_command_dispatch);
criterion_main!(benches);
