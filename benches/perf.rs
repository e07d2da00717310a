use altercmd::catalog::partition::PartitionBy;
use altercmd::catalog::types::{ColumnSpec, ColumnType};
use altercmd::command::AlterCommand;
use altercmd::config::DecodeLimits;
use altercmd::writer::memory::MemoryTableWriter;
use altercmd::{NameScratch, WriterTask, encode_alter_task};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const COLUMNS: usize = 32;

fn wide_add_column() -> AlterCommand<'static> {
    let mut cmd = AlterCommand::new();
    let mut builder = cmd.of_add_column(0, "bench_table", 1);
    for i in 0..COLUMNS {
        let spec = if i % 4 == 0 {
            ColumnSpec::symbol(256, true).with_index(1024)
        } else {
            ColumnSpec::new(ColumnType::Double)
        };
        builder.add_column(&format!("column_{i}"), &spec);
    }
    cmd
}

fn bench_alter_hot_paths(c: &mut Criterion) {
    let cmd = wide_add_column();
    let limits = DecodeLimits::default();

    c.bench_function("encode_add_32_columns", |b| {
        let mut out = Vec::with_capacity(cmd.encoded_len());
        b.iter(|| {
            out.clear();
            cmd.encode(&mut out);
            black_box(out.len());
        });
    });

    let mut task_buf = Vec::new();
    encode_alter_task(&cmd, &mut task_buf);

    c.bench_function("decode_add_32_columns", |b| {
        let mut decoded = AlterCommand::new();
        b.iter(|| {
            let task = WriterTask::parse(black_box(&task_buf), &limits).expect("task");
            let consumed = decoded.decode_task(&task, &limits).expect("decode");
            black_box(consumed);
        });
    });

    c.bench_function("decode_and_apply_add_32_columns", |b| {
        let mut scratch = NameScratch::with_capacity(64);
        b.iter(|| {
            let mut writer = MemoryTableWriter::new("bench_table", 1, PartitionBy::Day);
            let task = WriterTask::parse(&task_buf, &limits).expect("task");
            let mut decoded = AlterCommand::new();
            decoded.decode_task(&task, &limits).expect("decode");
            decoded
                .apply_with(&mut writer, false, &mut scratch)
                .expect("apply");
            black_box(writer.metadata().columns.len());
        });
    });

    let mut lag = AlterCommand::new();
    lag.of_set_commit_lag(0, "bench_table", 1, 1_000_000);
    let mut lag_buf = Vec::new();
    lag.encode(&mut lag_buf);
    c.bench_function("apply_set_commit_lag", |b| {
        let mut writer = MemoryTableWriter::new("bench_table", 1, PartitionBy::Day);
        let log = writer.call_log();
        b.iter(|| {
            let (decoded, _) = AlterCommand::decode(&lag_buf, &limits).expect("decode");
            decoded.apply(&mut writer, false).expect("apply");
            log.clear();
        });
    });
}

criterion_group!(benches, bench_alter_hot_paths);
criterion_main!(benches);
