//! Semicolon-separated text format.
//!
//! ```text
//! <name>;<description>;<created YYYY-MM-DD>;<deadline YYYY-MM-DD>;<STATUS>;<PRIORITY>;
//! HISTORY
//! <history records, same layout>
//! STATISTICS
//! <created>;<completed>;<failed>
//! ```
//!
//! Active tasks are written in store order (deadline, then priority). On read they
//! are placed back into their buckets without touching the counters; the counters
//! come from the statistics line alone.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{write_atomically, FileManager};
use crate::db::{Database, Statistics};
use crate::error::StorageError;
use crate::fields::{Priority, Status};
use crate::task::Task;

pub const HISTORY_MARKER: &str = "HISTORY";
pub const STATISTICS_MARKER: &str = "STATISTICS";
const DATE_FORMAT: &str = "%Y-%m-%d";
const FIELD_COUNT: usize = 6;

/// Text database stored at a fixed path.
#[derive(Debug, Clone)]
pub struct CsvFileManager {
    path: PathBuf,
}

impl CsvFileManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileManager for CsvFileManager {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Database, StorageError> {
        let file = File::open(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        decode(BufReader::new(file))
    }

    fn save(&self, db: &Database) -> Result<(), StorageError> {
        write_atomically(&self.path, |w| encode(db, w))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Tasks,
    History,
    Statistics,
}

/// Decode a whole store. Nothing is returned unless every line is valid.
pub fn decode<R: BufRead>(reader: R) -> Result<Database, StorageError> {
    let mut db = Database::default();
    let mut section = Section::Tasks;
    let mut stats = None;
    let mut line_count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let number = idx + 1;
        line_count = number;
        let line = line.map_err(|e| StorageError::malformed(number, e))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        match section {
            Section::Tasks if line == HISTORY_MARKER => section = Section::History,
            Section::Tasks => db.insert(parse_active_task(line, number)?),
            Section::History if line == STATISTICS_MARKER => section = Section::Statistics,
            Section::History => db.add_to_history(parse_task(line, number)?),
            Section::Statistics if stats.is_none() => stats = Some(parse_statistics(line, number)?),
            Section::Statistics if line.trim().is_empty() => {}
            Section::Statistics => {
                return Err(StorageError::malformed(number, "unexpected data after statistics"))
            }
        }
    }

    let next = line_count + 1;
    match (section, stats) {
        (Section::Statistics, Some(stats)) => {
            db.set_statistics(stats);
            Ok(db)
        }
        (Section::Tasks, _) => Err(StorageError::malformed(next, "missing HISTORY marker")),
        (Section::History, _) => Err(StorageError::malformed(next, "missing STATISTICS marker")),
        (Section::Statistics, None) => Err(StorageError::malformed(next, "missing statistics")),
    }
}

/// Encode a whole store.
pub fn encode<W: Write>(db: &Database, w: &mut W) -> io::Result<()> {
    for task in db.all_tasks() {
        write_task(w, task)?;
    }
    writeln!(w, "{HISTORY_MARKER}")?;
    for task in db.history() {
        write_task(w, task)?;
    }
    writeln!(w, "{STATISTICS_MARKER}")?;
    let stats = db.statistics();
    writeln!(w, "{};{};{}", stats.created, stats.completed, stats.failed)
}

fn write_task<W: Write>(w: &mut W, task: &Task) -> io::Result<()> {
    writeln!(
        w,
        "{};{};{};{};{};{};",
        task.name(),
        task.description(),
        task.creation_date().format(DATE_FORMAT),
        task.deadline().format(DATE_FORMAT),
        task.status().as_token(),
        task.priority().as_token(),
    )
}

/// Active records must still be open; DONE and FAILED belong in the history.
fn parse_active_task(line: &str, number: usize) -> Result<Task, StorageError> {
    let task = parse_task(line, number)?;
    if task.status().is_terminal() {
        return Err(StorageError::malformed(
            number,
            format!("active task has status {}", task.status()),
        ));
    }
    Ok(task)
}

fn parse_task(line: &str, number: usize) -> Result<Task, StorageError> {
    let mut fields: Vec<&str> = line.split(';').collect();
    // Records end with a separator, leaving an empty last field.
    if fields.len() == FIELD_COUNT + 1 && fields[FIELD_COUNT].is_empty() {
        fields.pop();
    }
    if fields.len() != FIELD_COUNT {
        return Err(StorageError::malformed(
            number,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let creation_date = parse_date(fields[2], number)?;
    let deadline = parse_date(fields[3], number)?;
    let status: Status = fields[4]
        .parse()
        .map_err(|e| StorageError::malformed(number, e))?;
    let priority: Priority = fields[5]
        .parse()
        .map_err(|e| StorageError::malformed(number, e))?;

    Task::restore(fields[0], fields[1], creation_date, deadline, status, priority)
        .map_err(|e| StorageError::malformed(number, e))
}

fn parse_date(s: &str, number: usize) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| StorageError::malformed(number, format!("invalid date '{s}': {e}")))
}

fn parse_statistics(line: &str, number: usize) -> Result<Statistics, StorageError> {
    let counters = line
        .split(';')
        .map(|c| c.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::malformed(number, format!("invalid counter: {e}")))?;
    match counters[..] {
        [created, completed, failed] => Ok(Statistics {
            created,
            completed,
            failed,
        }),
        _ => Err(StorageError::malformed(
            number,
            format!("expected 3 counters, found {}", counters.len()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::TaskService;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn encode_to_string(db: &Database) -> String {
        let mut buf = Vec::new();
        encode(db, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn malformed_line(text: &str) -> usize {
        match decode(text.as_bytes()) {
            Err(StorageError::Malformed { line, .. }) => line,
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    const SAMPLE: &str = "\
Pay bills;electricity;2026-04-01;2026-04-05;TODO;HIGH;
Call dentist;;2026-04-01;2026-04-05;TODO;LOW;
Book flights;summer;2026-04-02;2026-04-09;TODO;URGENT;
HISTORY
Water plants;;2026-04-01;2026-04-02;DONE;MEDIUM;
Renew passport;;2026-03-20;2026-03-30;FAILED;HIGH;
STATISTICS
7;1;1
";

    #[test]
    fn test_encode_exact_layout() {
        let mut svc = TaskService::new(Database::default());
        svc.add_task(Task::create("Call dentist", "", day(5), Priority::Low, day(1)).unwrap());
        svc.add_task(Task::create("Book flights", "summer", day(9), Priority::Urgent, day(2)).unwrap());
        svc.add_task(Task::create("Pay bills", "electricity", day(5), Priority::High, day(1)).unwrap());
        let mut db = svc.into_database();
        db.add_to_history(
            Task::restore("Water plants", "", day(1), day(2), Status::Done, Priority::Medium).unwrap(),
        );
        db.add_to_history(
            Task::restore(
                "Renew passport",
                "",
                NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 30).unwrap(),
                Status::Failed,
                Priority::High,
            )
            .unwrap(),
        );
        db.set_statistics(Statistics {
            created: 7,
            completed: 1,
            failed: 1,
        });
        assert_eq!(encode_to_string(&db), SAMPLE);
    }

    #[test]
    fn test_decode_then_encode_is_identical() {
        let db = decode(SAMPLE.as_bytes()).unwrap();
        assert_eq!(encode_to_string(&db), SAMPLE);
    }

    #[test]
    fn test_decode_restores_buckets_and_counters() {
        let db = decode(SAMPLE.as_bytes()).unwrap();
        let bucket: Vec<_> = db.find_tasks_by_date(day(5)).iter().map(Task::name).collect();
        assert_eq!(bucket, vec!["Pay bills", "Call dentist"]);
        assert_eq!(db.history().len(), 2);
        assert_eq!(db.history()[1].status(), Status::Failed);
        // Counters come from the statistics line, not from replaying the tasks.
        assert_eq!(
            db.statistics(),
            Statistics {
                created: 7,
                completed: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_decode_resorts_out_of_order_records() {
        let text = "\
low;;2026-04-01;2026-04-05;TODO;LOW;
urgent;;2026-04-01;2026-04-05;TODO;URGENT;
HISTORY
STATISTICS
2;0;0
";
        let db = decode(text.as_bytes()).unwrap();
        let bucket: Vec<_> = db.find_tasks_by_date(day(5)).iter().map(Task::name).collect();
        assert_eq!(bucket, vec!["urgent", "low"]);
    }

    #[test]
    fn test_decode_accepts_crlf_and_legacy_status() {
        let text = "a;;2026-04-01;2026-04-05;TO_DO;LOW;\r\nHISTORY\r\nSTATISTICS\r\n1;0;0";
        let db = decode(text.as_bytes()).unwrap();
        assert_eq!(db.task_count(), 1);
        assert_eq!(db.statistics().created, 1);
    }

    #[test]
    fn test_malformed_lines_are_numbered() {
        // Unknown priority on the second line.
        let text = "a;;2026-04-01;2026-04-05;TODO;LOW;\nb;;2026-04-01;2026-04-05;TODO;SOMEDAY;\nHISTORY\nSTATISTICS\n0;0;0\n";
        assert_eq!(malformed_line(text), 2);

        // Bad date inside the history section.
        let text = "HISTORY\na;;2026-04-01;2026-13-05;DONE;LOW;\nSTATISTICS\n0;0;0\n";
        assert_eq!(malformed_line(text), 2);

        // Missing field.
        let text = "a;2026-04-01;2026-04-05;TODO;LOW;\nHISTORY\nSTATISTICS\n0;0;0\n";
        assert_eq!(malformed_line(text), 1);

        // Empty name.
        let text = ";;2026-04-01;2026-04-05;TODO;LOW;\nHISTORY\nSTATISTICS\n0;0;0\n";
        assert_eq!(malformed_line(text), 1);

        // Non-numeric counter.
        let text = "HISTORY\nSTATISTICS\n1;x;0\n";
        assert_eq!(malformed_line(text), 3);

        // Too few counters.
        let text = "HISTORY\nSTATISTICS\n1;0\n";
        assert_eq!(malformed_line(text), 3);

        // Trailing junk.
        let text = "HISTORY\nSTATISTICS\n1;0;0\nmore\n";
        assert_eq!(malformed_line(text), 4);
    }

    #[test]
    fn test_finished_records_rejected_in_active_section() {
        let text = "x;;2020-01-01;2020-01-02;DONE;LOW;\nHISTORY\nSTATISTICS\n1;1;0\n";
        assert_eq!(malformed_line(text), 1);

        let text = "a;;2026-04-01;2026-04-05;TODO;LOW;\nb;;2026-04-01;2026-04-05;FAILED;LOW;\nHISTORY\nSTATISTICS\n2;0;1\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "incorrect data in line 2: active task has status FAILED");
    }

    #[test]
    fn test_missing_sections_fail() {
        assert_eq!(malformed_line(""), 1);
        assert_eq!(malformed_line("a;;2026-04-01;2026-04-05;TODO;LOW;\n"), 2);
        assert_eq!(malformed_line("HISTORY\n"), 2);
        assert_eq!(malformed_line("HISTORY\nSTATISTICS\n"), 3);
    }

    #[test]
    fn test_malformed_error_mentions_token() {
        let err = decode("a;;2026-04-01;2026-04-05;LATER;LOW;\nHISTORY\nSTATISTICS\n0;0;0\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.to_string(), "incorrect data in line 1: unknown status 'LATER'");
    }
}
