use altercmd::catalog::partition::PartitionBy;
use altercmd::config::AlterConfig;
use altercmd::offline;
use altercmd::recovery::replay_log_file;
use altercmd::writer::memory::MemoryTableWriter;
use std::path::Path;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Err("missing command".into());
    }
    match args[1].as_str() {
        "log" => match args.get(2).map(String::as_str) {
            Some("dump") => cmd_log_dump(&args[3..]),
            Some("check") => cmd_log_check(&args[3..]),
            Some("replay") => cmd_log_replay(&args[3..]),
            Some(other) => Err(format!("unknown log command: {other}")),
            None => Err("missing log subcommand".into()),
        },
        other => {
            print_usage();
            Err(format!("unknown top-level command: {other}"))
        }
    }
}

fn cmd_log_dump(args: &[String]) -> Result<(), String> {
    let file = parse_flag_value(args, "--file").ok_or("--file is required")?;
    let config = parse_recovery_config(args);
    let entries =
        offline::dump_log(Path::new(&file), &config).map_err(|e| format!("dump log: {e}"))?;
    let json = args.iter().any(|a| a == "--json");
    for entry in &entries {
        if json {
            let line = serde_json::to_string(entry).map_err(|e| format!("encode json: {e}"))?;
            println!("{line}");
        } else {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{:?}\t{:?}",
                entry.seq,
                entry.table_id,
                entry.table_name,
                entry.op,
                entry.position,
                entry.numeric_args,
                entry.text_args
            );
        }
    }
    Ok(())
}

fn cmd_log_check(args: &[String]) -> Result<(), String> {
    let file = parse_flag_value(args, "--file").ok_or("--file is required")?;
    let config = parse_recovery_config(args);
    let report =
        offline::check_log(Path::new(&file), &config).map_err(|e| format!("check log: {e}"))?;
    println!(
        "{}\t{}\t{}\t{}{}",
        if report.ok { "ok" } else { "violations" },
        report.frames,
        report.commands,
        report.last_seq,
        if report.truncated_tail {
            "\ttruncated-tail"
        } else {
            ""
        }
    );
    for v in &report.violations {
        println!("violation\t{v}");
    }
    if report.ok {
        Ok(())
    } else {
        Err("command log violations found".into())
    }
}

/// Replays a log into an empty in-memory table and prints the resulting
/// metadata as JSON.
fn cmd_log_replay(args: &[String]) -> Result<(), String> {
    let file = parse_flag_value(args, "--file").ok_or("--file is required")?;
    let table = parse_flag_value(args, "--table").ok_or("--table is required")?;
    let table_id = parse_flag_value(args, "--table-id")
        .ok_or("--table-id is required")?
        .parse::<i32>()
        .map_err(|e| format!("invalid --table-id: {e}"))?;
    let partition_by = match parse_flag_value(args, "--partition-by").as_deref() {
        None | Some("none") => PartitionBy::None,
        Some("hour") => PartitionBy::Hour,
        Some("day") => PartitionBy::Day,
        Some("month") => PartitionBy::Month,
        Some("year") => PartitionBy::Year,
        Some(other) => return Err(format!("invalid --partition-by: {other}")),
    };
    let from_seq = match parse_flag_value(args, "--from-seq") {
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| format!("invalid --from-seq: {e}"))?,
        None => 0,
    };
    let config = parse_recovery_config(args);
    let mut writer = MemoryTableWriter::new(table, table_id, partition_by);
    let report = replay_log_file(Path::new(&file), &mut writer, from_seq, &config)
        .map_err(|e| format!("replay log [{}]: {e}", e.code_str()))?;
    let out = serde_json::json!({
        "report": report,
        "table": writer.metadata(),
        "attached_partitions": writer.attached_partitions(),
    });
    let text = serde_json::to_string_pretty(&out).map_err(|e| format!("encode json: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn parse_recovery_config(args: &[String]) -> AlterConfig {
    if args.iter().any(|a| a == "--permissive") {
        AlterConfig::development()
    } else {
        AlterConfig::production()
    }
}

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  altercmd log dump --file <command.log> [--json]");
    eprintln!("  altercmd log check --file <command.log> [--permissive]");
    eprintln!(
        "  altercmd log replay --file <command.log> --table <name> --table-id <id> [--partition-by none|hour|day|month|year] [--from-seq <n>] [--permissive]"
    );
}
