use altercmd::catalog::partition::{PartitionBy, partition_name};
use altercmd::catalog::types::{ColumnSpec, ColumnType};
use altercmd::command::AlterCommand;
use altercmd::config::DecodeLimits;
use altercmd::error::{AlterError, AlterErrorCode, PartitionFailure, StorageError};
use altercmd::writer::TableWriter;
use altercmd::writer::memory::{MemoryTableWriter, WriterCall, WriterOp};

const HOUR_TS: i64 = 1_709_622_000_000_000;

fn decoded_apply(
    cmd: &AlterCommand<'_>,
    writer: &mut MemoryTableWriter,
    accept_structure_change: bool,
) -> Result<(), AlterError> {
    let mut buf = Vec::new();
    cmd.encode(&mut buf);
    let (decoded, _) = AlterCommand::decode(&buf, &DecodeLimits::default())?;
    decoded.apply(writer, accept_structure_change)
}

#[test]
fn add_columns_land_in_order_with_their_properties() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::Day)
        .with_column("ts", ColumnSpec::new(ColumnType::Timestamp));
    let mut cmd = AlterCommand::new();
    cmd.of_add_column(0, "trades", 1)
        .add_column("a", &ColumnSpec::new(ColumnType::Int))
        .add_column("b", &ColumnSpec::symbol(128, true).with_index(256));
    decoded_apply(&cmd, &mut writer, false).expect("add columns");

    let meta = writer.metadata();
    assert_eq!(meta.column_names().collect::<Vec<_>>(), vec!["ts", "a", "b"]);
    let a = meta.column("a").expect("a");
    assert_eq!(a.column_type, ColumnType::Int);
    assert!(!a.symbol_cache && !a.indexed);
    let b = meta.column("b").expect("b");
    assert_eq!(b.column_type, ColumnType::Symbol);
    assert_eq!(b.symbol_capacity, 128);
    assert!(b.symbol_cache);
    assert!(b.indexed);
    assert_eq!(b.index_value_block_capacity, 256);
}

#[test]
fn dropping_an_unknown_column_is_a_validation_error_without_mutation() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::Day)
        .with_column("price", ColumnSpec::new(ColumnType::Double));
    let before = writer.metadata().clone();
    let mut cmd = AlterCommand::new();
    cmd.of_drop_column(17, "trades", 1).column("qty");
    let err = decoded_apply(&cmd, &mut writer, true).expect_err("unknown column");
    assert_eq!(err.code(), AlterErrorCode::Validation);
    assert_eq!(err.position(), Some(17));
    assert_eq!(err.to_string(), "[17] invalid column: qty");
    assert_eq!(writer.metadata(), &before);
    assert!(writer.calls().is_empty());
}

#[test]
fn attaching_a_missing_partition_names_the_partition_folder() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::Hour);
    let mut cmd = AlterCommand::new();
    cmd.of_attach_partition(3, "trades", 1).partition(HOUR_TS);
    let err = decoded_apply(&cmd, &mut writer, false).expect_err("missing");
    let expected = partition_name(PartitionBy::Hour, HOUR_TS);
    assert_eq!(expected, "2024-03-05T07");
    assert_eq!(
        err.to_string(),
        format!("[3] attach partition failed, folder '{expected}' does not exist")
    );
    assert_eq!(err.code(), AlterErrorCode::PartitionStatus);
}

#[test]
fn attaching_twice_never_succeeds_the_second_time() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::Hour);
    writer.stage_partition(HOUR_TS, 1_000);
    let mut cmd = AlterCommand::new();
    cmd.of_attach_partition(3, "trades", 1).partition(HOUR_TS);
    decoded_apply(&cmd, &mut writer, false).expect("first attach");
    let attached = writer.attached_partitions();

    let err = decoded_apply(&cmd, &mut writer, false).expect_err("second attach");
    assert!(matches!(
        err,
        AlterError::Partition {
            failure: PartitionFailure::AlreadyAttached { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("already attached"));
    assert_eq!(writer.attached_partitions(), attached);
}

#[test]
fn attaching_to_a_table_with_symbols_is_unsupported() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::Day)
        .with_column("sym", ColumnSpec::symbol(64, true));
    writer.stage_partition(HOUR_TS, 10);
    let mut cmd = AlterCommand::new();
    cmd.of_attach_partition(0, "trades", 1).partition(HOUR_TS);
    let err = decoded_apply(&cmd, &mut writer, false).expect_err("symbols");
    assert!(matches!(
        err,
        AlterError::Partition {
            failure: PartitionFailure::TableHasSymbols,
            ..
        }
    ));
}

#[test]
fn renames_apply_in_order_without_rollback() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None)
        .with_column("old1", ColumnSpec::new(ColumnType::Int))
        .with_column("old2", ColumnSpec::new(ColumnType::Int));
    let mut cmd = AlterCommand::new();
    cmd.of_rename_column(0, "trades", 1)
        .rename("old1", "new1")
        .rename("old2", "new2");
    decoded_apply(&cmd, &mut writer, true).expect("renames");
    assert_eq!(
        writer.metadata().column_names().collect::<Vec<_>>(),
        vec!["new1", "new2"]
    );

    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None)
        .with_column("old1", ColumnSpec::new(ColumnType::Int))
        .with_column("old2", ColumnSpec::new(ColumnType::Int));
    writer.inject_failure(WriterOp::RenameColumn, "old2", StorageError::new(5, "io"));
    let err = decoded_apply(&cmd, &mut writer, true).expect_err("second rename");
    assert!(matches!(err, AlterError::RenameColumn { ref column, errno: 5, .. } if column == "old2"));
    assert_eq!(
        writer.metadata().column_names().collect::<Vec<_>>(),
        vec!["new1", "old2"]
    );
}

#[test]
fn structural_changes_are_rejected_without_touching_the_writer() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None)
        .with_column("a", ColumnSpec::new(ColumnType::Int));
    let log = writer.call_log();
    let mut cmd = AlterCommand::new();

    cmd.of_drop_column(0, "trades", 1).column("a");
    let err = decoded_apply(&cmd, &mut writer, false).expect_err("drop rejected");
    assert!(matches!(err, AlterError::StructureChangeRejected));
    assert!(err.is_retryable());

    cmd.of_rename_column(0, "trades", 1).rename("a", "b");
    let err = decoded_apply(&cmd, &mut writer, false).expect_err("rename rejected");
    assert!(matches!(err, AlterError::StructureChangeRejected));

    assert!(log.is_empty());
    assert!(writer.metadata().column("a").is_some());
}

#[test]
fn tuning_parameters_are_idempotent() {
    let mut once = MemoryTableWriter::new("trades", 1, PartitionBy::None);
    let mut twice = MemoryTableWriter::new("trades", 1, PartitionBy::None);
    let mut cmd = AlterCommand::new();

    cmd.of_set_commit_lag(0, "trades", 1, 30_000_000);
    decoded_apply(&cmd, &mut once, false).expect("lag");
    decoded_apply(&cmd, &mut twice, false).expect("lag");
    decoded_apply(&cmd, &mut twice, false).expect("lag again");

    cmd.of_set_max_uncommitted_rows(0, "trades", 1, 250_000);
    decoded_apply(&cmd, &mut once, false).expect("rows");
    decoded_apply(&cmd, &mut twice, false).expect("rows");
    decoded_apply(&cmd, &mut twice, false).expect("rows again");

    assert_eq!(once.metadata(), twice.metadata());
    assert_eq!(once.metadata().commit_lag_micros, 30_000_000);
    assert_eq!(once.metadata().max_uncommitted_rows, 250_000);
}

#[test]
fn do_nothing_touches_nothing() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None);
    let mut cmd = AlterCommand::new();
    cmd.of_do_nothing();
    decoded_apply(&cmd, &mut writer, false).expect("noop");
    assert!(writer.calls().is_empty());
}

#[test]
fn partial_add_column_is_not_rolled_back() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None);
    writer.inject_failure(WriterOp::AddColumn, "c", StorageError::new(28, "no space left"));
    let mut cmd = AlterCommand::new();
    let mut builder = cmd.of_add_column(5, "trades", 1);
    for name in ["a", "b", "c", "d", "e"] {
        builder.add_column(name, &ColumnSpec::new(ColumnType::Long));
    }
    let err = decoded_apply(&cmd, &mut writer, false).expect_err("fails on c");
    assert_eq!(err.errno(), Some(28));
    assert_eq!(
        writer.metadata().column_names().collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    let attempts = writer
        .calls()
        .into_iter()
        .filter(|c| matches!(c, WriterCall::AddColumn { .. }))
        .count();
    assert_eq!(attempts, 3);
}

#[test]
fn writer_trait_objects_are_accepted() {
    let mut writer = MemoryTableWriter::new("trades", 1, PartitionBy::None);
    let dyn_writer: &mut dyn TableWriter = &mut writer;
    let mut cmd = AlterCommand::new();
    cmd.of_set_commit_lag(0, "trades", 1, 7);
    cmd.apply(dyn_writer, false).expect("dyn apply");
    assert_eq!(writer.metadata().commit_lag_micros, 7);
}
