use altercmd::catalog::types::{ColumnSpec, ColumnType};
use altercmd::command::{AlterCommand, AlterOp};
use altercmd::config::DecodeLimits;
use altercmd::task::{WriterTask, encode_alter_task};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Built {
    AddColumns(Vec<(String, i32, i32, bool, bool, i32)>),
    AddIndex(String, i32),
    Attach(Vec<i64>),
    Drop(Vec<i64>),
    Cache(String, bool),
    DropColumns(Vec<String>),
    Renames(Vec<(String, String)>),
    MaxRows(i32),
    CommitLag(i64),
    Nothing,
}

const TYPE_CODES: [i32; 14] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 18];

fn name() -> impl Strategy<Value = String> {
    "\\PC{0,12}"
}

fn built() -> impl Strategy<Value = Built> {
    prop_oneof![
        prop::collection::vec(
            (
                name(),
                prop::sample::select(TYPE_CODES.to_vec()),
                any::<i32>(),
                any::<bool>(),
                any::<bool>(),
                any::<i32>()
            ),
            0..4
        )
        .prop_map(Built::AddColumns),
        (name(), any::<i32>()).prop_map(|(n, b)| Built::AddIndex(n, b)),
        prop::collection::vec(any::<i64>(), 0..6).prop_map(Built::Attach),
        prop::collection::vec(any::<i64>(), 0..6).prop_map(Built::Drop),
        (name(), any::<bool>()).prop_map(|(n, c)| Built::Cache(n, c)),
        prop::collection::vec(name(), 0..5).prop_map(Built::DropColumns),
        prop::collection::vec((name(), name()), 0..4).prop_map(Built::Renames),
        any::<i32>().prop_map(Built::MaxRows),
        any::<i64>().prop_map(Built::CommitLag),
        Just(Built::Nothing),
    ]
}

fn build(cmd: &mut AlterCommand<'_>, position: i32, table: &str, id: i32, spec: &Built) {
    match spec {
        Built::AddColumns(cols) => {
            let mut b = cmd.of_add_column(position, table, id);
            for (n, code, cap, cache, indexed, block) in cols {
                let column_type = ColumnType::from_code(i64::from(*code)).expect("known code");
                let spec = ColumnSpec {
                    column_type,
                    symbol_capacity: *cap,
                    symbol_cache: *cache,
                    indexed: *indexed,
                    index_value_block_capacity: *block,
                };
                b.add_column(n, &spec);
            }
        }
        Built::AddIndex(n, block) => {
            cmd.of_add_index(position, table, id, n, *block);
        }
        Built::Attach(ts) => {
            let mut b = cmd.of_attach_partition(position, table, id);
            for t in ts {
                b.partition(*t);
            }
        }
        Built::Drop(ts) => {
            let mut b = cmd.of_drop_partition(position, table, id);
            for t in ts {
                b.partition(*t);
            }
        }
        Built::Cache(n, true) => {
            cmd.of_cache_symbol(position, table, id, n);
        }
        Built::Cache(n, false) => {
            cmd.of_remove_cache_symbol(position, table, id, n);
        }
        Built::DropColumns(names) => {
            let mut b = cmd.of_drop_column(position, table, id);
            for n in names {
                b.column(n);
            }
        }
        Built::Renames(pairs) => {
            let mut b = cmd.of_rename_column(position, table, id);
            for (old, new) in pairs {
                b.rename(old, new);
            }
        }
        Built::MaxRows(rows) => {
            cmd.of_set_max_uncommitted_rows(position, table, id, *rows);
        }
        Built::CommitLag(lag) => {
            cmd.of_set_commit_lag(position, table, id, *lag);
        }
        Built::Nothing => {
            cmd.of_do_nothing();
        }
    }
}

fn texts(cmd: &AlterCommand<'_>) -> Vec<String> {
    cmd.text_args().iter().map(|t| t.to_string()).collect()
}

proptest! {
    #[test]
    fn decode_of_encode_preserves_every_field(
        spec in built(),
        position in any::<i32>(),
        table in "[a-z_]{1,16}",
        id in any::<i32>(),
    ) {
        let mut cmd = AlterCommand::new();
        build(&mut cmd, position, &table, id, &spec);
        let mut buf = Vec::new();
        cmd.encode(&mut buf);
        prop_assert_eq!(buf.len(), cmd.encoded_len());

        let (decoded, consumed) = AlterCommand::decode(&buf, &DecodeLimits::default())
            .expect("decode");
        prop_assert_eq!(consumed, buf.len());
        prop_assert_eq!(decoded.op(), cmd.op());
        prop_assert_eq!(decoded.position(), cmd.position());
        prop_assert_eq!(decoded.numeric_args(), cmd.numeric_args());
        prop_assert_eq!(texts(&decoded), texts(&cmd));
    }

    #[test]
    fn envelope_round_trip_restores_table_identity(
        spec in built(),
        table in "\\PC{0,20}",
        id in any::<i32>(),
    ) {
        let mut cmd = AlterCommand::new();
        build(&mut cmd, 1, &table, id, &spec);
        let mut buf = Vec::new();
        encode_alter_task(&cmd, &mut buf);

        let limits = DecodeLimits::default();
        let task = WriterTask::parse(&buf, &limits).expect("envelope");
        let mut decoded = AlterCommand::new();
        decoded.decode_task(&task, &limits).expect("decode");
        prop_assert_eq!(decoded.table_name(), cmd.table_name());
        prop_assert_eq!(decoded.table_id(), id);
        prop_assert_eq!(decoded.op(), cmd.op());
        prop_assert_eq!(texts(&decoded), texts(&cmd));
    }
}

#[test]
fn add_column_layout_is_fixed() {
    let mut cmd = AlterCommand::new();
    cmd.of_add_column(40, "trades", 2)
        .add_column("a", &ColumnSpec::new(ColumnType::Int));
    let mut buf = Vec::new();
    cmd.encode(&mut buf);

    let mut expected = Vec::new();
    expected.extend_from_slice(&AlterOp::AddColumn.code().to_le_bytes());
    expected.extend_from_slice(&40i32.to_le_bytes());
    expected.extend_from_slice(&5i32.to_le_bytes());
    for v in [5i64, 0, -1, -1, 0] {
        expected.extend_from_slice(&v.to_le_bytes());
    }
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.extend_from_slice(&[b'a', 0]);
    assert_eq!(buf, expected);
}

#[test]
fn producer_descriptor_is_reusable_after_encoding() {
    let mut producer = AlterCommand::new();
    let mut queue = Vec::new();
    producer.of_drop_column(1, "t", 1).column("x");
    producer.encode(&mut queue);
    let first_len = queue.len();
    producer.of_cache_symbol(2, "t", 1, "sym");
    producer.encode(&mut queue);

    let limits = DecodeLimits::default();
    let (first, n) = AlterCommand::decode(&queue, &limits).expect("first");
    assert_eq!(n, first_len);
    assert_eq!(first.op(), AlterOp::DropColumn);
    let (second, _) = AlterCommand::decode(&queue[n..], &limits).expect("second");
    assert_eq!(second.op(), AlterOp::AddSymbolCache);
    assert_eq!(texts(&second), vec!["sym"]);
}
