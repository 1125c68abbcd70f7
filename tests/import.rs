use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use fmpxml::{
    import_file, import_reader, import_with, CoercionError, CoercionErrorKind, Coercer,
    FieldType, ImportError, ImportOptions, ImportStatus, Record, RowError, RowHandler,
    TypedValue,
};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fmpxml=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="03-04-2023" NAME="FileMaker" VERSION="19.6.3"/>
  <DATABASE DATEFORMAT="D/m/yyyy" LAYOUT="" NAME="people.fmp12" RECORDS="3" TIMEFORMAT="k:mm:ss "/>
  <METADATA>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="RECORDID" TYPE="NUMBER"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="NAME" TYPE="TEXT"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="DOB" TYPE="DATE"/>
  </METADATA>
"#;

fn row(id: u64, cells: &[&str]) -> String {
    let mut s = format!("    <ROW MODID=\"1\" RECORDID=\"{}\">", id);
    for c in cells {
        s.push_str(&format!("<COL><DATA>{}</DATA></COL>", c));
    }
    s.push_str("</ROW>\n");
    s
}

fn document(rows: &[String]) -> String {
    let mut doc = String::from(HEADER);
    doc.push_str(&format!("  <RESULTSET FOUND=\"{}\">\n", rows.len()));
    for r in rows {
        doc.push_str(r);
    }
    doc.push_str("  </RESULTSET>\n</FMPXMLRESULT>\n");
    doc
}

fn dmy() -> ImportOptions {
    ImportOptions::default().with_date_format("%d/%m/%Y")
}

fn collect(doc: &str, options: &ImportOptions) -> Result<(Vec<Record>, fmpxml::ImportSummary)> {
    let mut records = Vec::new();
    let summary = import_reader(
        Cursor::new(doc.as_bytes().to_vec()),
        &mut |r: Record| -> Result<()> {
            records.push(r);
            Ok(())
        },
        options,
    )?;
    Ok((records, summary))
}

#[test]
fn test_scenario_typed_record() -> Result<()> {
    init_test_logging();
    let doc = document(&[row(1, &["7", "Ann", "01/02/2000"])]);
    let (records, summary) = collect(&doc, &dmy())?;

    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.get("RECORDID"), Some(&TypedValue::Number(7.0)));
    assert_eq!(r.get("NAME"), Some(&TypedValue::Text("Ann".into())));
    assert_eq!(
        r.get("DOB"),
        Some(&TypedValue::Date(NaiveDate::from_ymd_opt(2000, 2, 1).unwrap()))
    );
    assert_eq!(summary.status, ImportStatus::Clean);
    assert_eq!(summary.document.error_code, Some(0));
    assert_eq!(summary.document.found, Some(1));
    assert_eq!(
        summary.document.database.as_ref().and_then(|d| d.name.as_deref()),
        Some("people.fmp12")
    );
    Ok(())
}

#[test]
fn test_scenario_bad_number_keeps_going() -> Result<()> {
    init_test_logging();
    let doc = document(&[row(1, &["x", "Bo", ""]), row(2, &["8", "Cy", "03/04/2001"])]);
    let (records, summary) = collect(&doc, &dmy())?;

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].get("RECORDID"),
        Some(&TypedValue::Invalid(CoercionError::new(
            CoercionErrorKind::NumberFormat,
            "x"
        )))
    );
    assert_eq!(records[0].get("NAME"), Some(&TypedValue::Text("Bo".into())));
    assert_eq!(records[0].get("DOB"), Some(&TypedValue::Null));
    assert_eq!(records[1].get("RECORDID"), Some(&TypedValue::Number(8.0)));

    assert_eq!(summary.cell_errors, 1);
    assert_eq!(
        summary.status,
        ImportStatus::CompletedWithErrors {
            cell_errors: 1,
            rows_skipped: 0
        }
    );
    Ok(())
}

#[test]
fn test_every_row_dispatched_with_every_key() -> Result<()> {
    init_test_logging();
    let rows: Vec<String> = (0..250)
        .map(|i| match i % 3 {
            0 => row(i, &["1", "full", "01/01/2000"]),
            1 => row(i, &["2"]),
            _ => format!("    <ROW RECORDID=\"{}\"></ROW>\n", i),
        })
        .collect();
    let (records, summary) = collect(&document(&rows), &dmy())?;

    assert_eq!(records.len(), 250);
    assert_eq!(summary.rows_dispatched, 250);
    for r in &records {
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["RECORDID", "NAME", "DOB"]);
    }
    assert_eq!(records[1].get("NAME"), Some(&TypedValue::Null));
    assert_eq!(records[2].get("RECORDID"), Some(&TypedValue::Null));
    assert_eq!(records[2].record_id(), Some(2));
    Ok(())
}

#[test]
fn test_overlong_row_is_skipped() -> Result<()> {
    init_test_logging();

    struct Counting {
        ids: Vec<Option<u64>>,
        skipped: Vec<RowError>,
    }
    impl RowHandler for Counting {
        fn import_node(&mut self, record: Record) -> Result<()> {
            self.ids.push(record.record_id());
            Ok(())
        }
        fn row_skipped(&mut self, error: &RowError) {
            self.skipped.push(error.clone());
        }
    }

    let doc = document(&[
        row(1, &["1", "a", "01/01/2000"]),
        row(2, &["2", "b", "01/01/2000", "surplus"]),
        row(3, &["3", "c", "01/01/2000"]),
    ]);
    let mut h = Counting {
        ids: Vec::new(),
        skipped: Vec::new(),
    };
    let summary = import_reader(Cursor::new(doc.into_bytes()), &mut h, &dmy())?;

    assert_eq!(h.ids, vec![Some(1), Some(3)]);
    assert_eq!(
        h.skipped,
        vec![RowError::ColumnIndexOutOfRange {
            record_id: Some(2),
            index: 3,
            columns: 3
        }]
    );
    assert_eq!(summary.rows_skipped, 1);
    assert!(!summary.is_clean());
    Ok(())
}

#[test]
fn test_handler_error_stops_the_import() {
    init_test_logging();
    let rows: Vec<String> = (1..=5).map(|i| row(i, &["1", "a", ""])).collect();
    let doc = document(&rows);

    let mut calls = 0;
    let res = import_reader(
        Cursor::new(doc.into_bytes()),
        &mut |r: Record| -> Result<()> {
            calls += 1;
            if r.record_id() == Some(2) {
                anyhow::bail!("duplicate key");
            }
            Ok(())
        },
        &dmy(),
    );
    assert!(matches!(res, Err(ImportError::Handler(_))));
    assert_eq!(calls, 2);
}

#[test]
fn test_malformed_schema_aborts() {
    init_test_logging();
    let doc = r#"<FMPXMLRESULT><METADATA><FIELD NAME="A"/></METADATA>
        <RESULTSET><ROW><COL><DATA>1</DATA></COL></ROW></RESULTSET></FMPXMLRESULT>"#;
    let mut calls = 0;
    let res = import_reader(
        Cursor::new(doc.as_bytes().to_vec()),
        &mut |_r: Record| -> Result<()> {
            calls += 1;
            Ok(())
        },
        &ImportOptions::default(),
    );
    assert!(matches!(res, Err(ImportError::MalformedSchema(_))));
    assert_eq!(calls, 0);
}

#[test]
fn test_broken_and_truncated_streams_are_fatal() {
    init_test_logging();
    let mut noop = |_r: Record| -> Result<()> { Ok(()) };

    let broken = format!("{}<RESULTSET><ROW><COL></ROW>", HEADER);
    let res = import_reader(Cursor::new(broken.into_bytes()), &mut noop, &dmy());
    assert!(matches!(res, Err(ImportError::Stream(_))));

    let truncated = format!("{}<RESULTSET>{}", HEADER, row(1, &["1", "a", ""]));
    let res = import_reader(Cursor::new(truncated.into_bytes()), &mut noop, &dmy());
    assert!(matches!(res, Err(ImportError::Io(_)) | Err(ImportError::Stream(_))));

    let res = import_reader(Cursor::new(Vec::new()), &mut noop, &dmy());
    assert!(matches!(res, Err(ImportError::MalformedSchema(_))));
}

#[test]
fn test_import_file_and_missing_file() -> Result<()> {
    init_test_logging();
    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(document(&[row(1, &["1", "a", "24/12/1999"])]).as_bytes())?;

    let mut n = 0;
    let summary = import_file(
        tmp.path(),
        &mut |_r: Record| -> Result<()> {
            n += 1;
            Ok(())
        },
        &dmy(),
    )?;
    assert_eq!(n, 1);
    assert_eq!(summary.schema.len(), 3);

    let mut noop = |_r: Record| -> Result<()> { Ok(()) };
    let res = import_file("/definitely/not/here.xml", &mut noop, &dmy());
    assert!(matches!(res, Err(ImportError::Io(_))));

    let res = import_file(tmp.path(), &mut noop, &ImportOptions::default().with_date_format(""));
    assert!(matches!(res, Err(ImportError::Config(_))));
    Ok(())
}

#[test]
fn test_repeating_fields_times_and_entities() -> Result<()> {
    init_test_logging();
    let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
<ERRORCODE>0</ERRORCODE>
<METADATA>
<FIELD EMPTYOK="YES" MAXREPEAT="3" NAME="PHONE" TYPE="TEXT"/>
<FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="OPENS" TYPE="TIME"/>
<FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="NOTE" TYPE="TEXT"/>
<FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="SEEN" TYPE="TIMESTAMP"/>
</METADATA>
<RESULTSET FOUND="1">
<ROW MODID="4" RECORDID="10"><COL><DATA>555-1</DATA><DATA>555-2</DATA><DATA/></COL><COL><DATA>9.30 am</DATA></COL><COL><DATA> Fish &amp; Chips </DATA></COL><COL><DATA>12/25/2024 18:00:00</DATA></COL></ROW>
</RESULTSET>
</FMPXMLRESULT>"#;
    let (records, summary) = collect(doc, &ImportOptions::default())?;
    assert!(summary.is_clean());
    assert_eq!(summary.schema[0].max_repeat, 3);

    let r = &records[0];
    assert_eq!(r.mod_id(), Some(4));
    assert_eq!(
        r.get("PHONE"),
        Some(&TypedValue::Repeated(vec![
            TypedValue::Text("555-1".into()),
            TypedValue::Text("555-2".into()),
            TypedValue::Text(String::new()),
        ]))
    );
    assert_eq!(
        r.get("OPENS").and_then(TypedValue::as_time),
        NaiveTime::from_hms_opt(9, 30, 0)
    );
    assert_eq!(r.get("NOTE").and_then(TypedValue::as_str), Some(" Fish & Chips "));
    assert_eq!(
        r.get("SEEN").and_then(TypedValue::as_timestamp),
        NaiveDate::from_ymd_opt(2024, 12, 25).and_then(|d| d.and_hms_opt(18, 0, 0))
    );
    Ok(())
}

#[test]
fn test_custom_strategy_through_import() -> Result<()> {
    init_test_logging();
    let coercer = Coercer::new(dmy()).with_strategy(FieldType::Text, |raw, _| {
        Ok(TypedValue::Text(raw.trim().to_uppercase()))
    });
    let doc = document(&[row(1, &["1", "  ann ", ""])]);

    let mut names = Vec::new();
    import_with(
        Cursor::new(doc.into_bytes()),
        &mut |r: Record| -> Result<()> {
            names.push(r.get("NAME").cloned());
            Ok(())
        },
        coercer,
    )?;
    assert_eq!(names, vec![Some(TypedValue::Text("ANN".into()))]);
    Ok(())
}
