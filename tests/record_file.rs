use flr_file::layout::DeclarativeLayout;
use flr_file::{
    Discriminator, FlrConfig, FlrError, FlrFile, OpenMode, RangeSet, Record, RecordKinds,
    parse_layout,
};
use std::fs;
use std::path::Path;

fn xy_config() -> FlrConfig {
    let mut layout = DeclarativeLayout::new();
    layout.insert(
        "A".to_string(),
        [("x".to_string(), 1..=3), ("y".to_string(), 4..=5)]
            .into_iter()
            .collect(),
    );
    FlrConfig::new(RecordKinds::single("A"), layout)
}

fn ledger_config() -> FlrConfig {
    parse_layout(
        r#"
        KIND header MATCH "HDR" AT 1
        KIND entry MATCH "E" AT 1
        FIELD header date 4-11
        FIELD entry account 2-5
        FIELD entry amount 6-12
        "#,
    )
    .unwrap()
}

fn read_all(path: &Path, config: FlrConfig, fast: Option<&str>) -> Vec<Record> {
    FlrFile::open(path, OpenMode::Read, config, |file| {
        if let Some(ranges) = fast {
            file.enable_fast()?;
            if !ranges.is_empty() {
                file.set_ranges(RangeSet::parse(ranges)?)?;
            }
        }
        file.records().collect()
    })
    .unwrap()
}

#[test]
fn test_concrete_scenario_sequential_and_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xy.dat");
    fs::write(&path, "abc12\ndef34\n").unwrap();

    let sequential = read_all(&path, xy_config(), None);
    assert_eq!(sequential.len(), 2);
    assert_eq!(sequential[0].get("x"), Some("abc"));
    assert_eq!(sequential[0].get("y"), Some("12"));
    assert_eq!(sequential[1].get("x"), Some("def"));
    assert_eq!(sequential[1].get("y"), Some("34"));

    let fast = read_all(&path, xy_config(), Some("1..2"));
    assert_eq!(fast, sequential);

    // Both records come from a single chunk
    FlrFile::open(&path, OpenMode::Read, xy_config(), |file| {
        file.enable_fast()?;
        file.set_ranges(RangeSet::parse("1..2")?)?;
        let reader = file.fast_reader().unwrap();
        let chunks: Vec<_> = reader.pending_chunks().copied().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].len, 2 * reader.record_width());
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_fast_matches_sequential_on_larger_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("many.dat");
    let text: String = (0..500).map(|i| format!("{:03}{:02}\n", i % 1000, i % 100)).collect();
    fs::write(&path, &text).unwrap();

    let sequential = read_all(&path, xy_config(), None);
    // Small budget forces many chunks
    let fast = read_all(&path, xy_config().with_buffer_budget(64), Some(""));
    assert_eq!(sequential.len(), 500);
    assert_eq!(fast, sequential);

    let selected = read_all(&path, xy_config().with_buffer_budget(64), Some("10..19,400..402"));
    let expected: Vec<Record> = sequential[9..19]
        .iter()
        .chain(&sequential[399..402])
        .cloned()
        .collect();
    assert_eq!(selected, expected);
}

#[test]
fn test_unknown_trailing_kind_ends_enumeration_but_fails_direct_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.dat");
    fs::write(&path, "HDR20240101\nE10010000150\n\nE20020000075\nZZZ\n").unwrap();

    let records = read_all(&path, ledger_config(), None);
    let kinds: Vec<&str> = records.iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec!["header", "entry", "entry"]);
    assert_eq!(records[0].get("date"), Some("20240101"));
    assert_eq!(records[2].get("amount"), Some("0000075"));

    let err = FlrFile::open(&path, OpenMode::Read, ledger_config(), |file| {
        while file.read_line_record()?.is_some() {}
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, FlrError::UnknownRecordKind { line: 5 }), "{err}");
}

#[test]
fn test_write_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.dat");

    FlrFile::open(&path, OpenMode::Write, ledger_config(), |file| {
        file.write_record(&Record::new("header").with("date", "20240101"))?;
        file.write_values(&["1001", "0000150", "entry"])?;
        file.write_record(
            &Record::new("entry")
                .with("account", "2002")
                .with("amount", "0000075"),
        )
    })
    .unwrap();

    // Separators precede records 2..N only; tags are not written
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "   20240101\n 10010000150\n 20020000075");

    // Without the tag column the discriminators do not match, so write tags
    // through a layout that covers them
    let tagged = parse_layout(
        "KIND header MATCH \"HDR\" AT 1\nKIND entry MATCH \"E\" AT 1\n\
         FIELD header tag 1-3\nFIELD header date 4-11\n\
         FIELD entry tag 1-1\nFIELD entry account 2-5\nFIELD entry amount 6-12\n",
    )
    .unwrap();
    FlrFile::open(&path, OpenMode::Write, tagged.clone(), |file| {
        file.write_values(&["HDR", "20240101", "header"])?;
        file.write_values(&["E", "1001", "0000150", "entry"])
    })
    .unwrap();
    FlrFile::open(&path, OpenMode::Append, tagged.clone(), |file| {
        // A new session starts its own separator tracking
        file.write_values(&["E", "2002", "0000075", "entry"])
    })
    .unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "HDR20240101\nE10010000150E20020000075"
    );

    let records = read_all(&path, tagged, None);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("account"), Some("1001"));
}

#[test]
fn test_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.dat");
    let output = dir.path().join("out.dat");
    let original = "abc12\ndef34\nghi56";
    fs::write(&input, original).unwrap();

    let records = read_all(&input, xy_config(), None);
    FlrFile::open(&output, OpenMode::Write, xy_config(), |file| {
        records.iter().try_for_each(|r| file.write_record(r))
    })
    .unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), original);
}

#[test]
fn test_scoped_open_closes_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.dat");

    let result: flr_file::Result<()> = FlrFile::open(&path, OpenMode::Write, xy_config(), |file| {
        file.write_values(&["abc", "12"])?;
        file.write_record(&Record::new("B"))
    });
    assert!(matches!(result, Err(FlrError::KindMismatchOnWrite { .. })));
    // The buffered first record was still flushed on close
    assert_eq!(fs::read_to_string(&path).unwrap(), "abc12");
}

#[test]
fn test_configuration_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.dat");
    fs::write(&path, "HDR20240101\n").unwrap();

    let err = FlrFile::open(&path, OpenMode::Read, ledger_config(), |file| {
        file.set_ranges(RangeSet::parse("1..1")?)
    })
    .unwrap_err();
    assert!(matches!(err, FlrError::ConfigurationConflict(_)));

    let config = FlrConfig::new(
        RecordKinds::Discriminated(vec![Discriminator::new("missing", "M", 1)]),
        DeclarativeLayout::new(),
    );
    assert!(matches!(
        FlrFile::open(&path, OpenMode::Read, config, |_| Ok(())),
        Err(FlrError::ConfigurationConflict(_))
    ));

    assert!(matches!(
        RangeSet::parse("first..last"),
        Err(FlrError::InvalidRangeArgument(_))
    ));
}

#[test]
fn test_latin1_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("latin1.dat");
    let output = dir.path().join("latin1.out");
    let original: &[u8] = b"M\xfcl12\nJos34\n\xc5se56";
    fs::write(&input, original).unwrap();

    let sequential = read_all(&input, xy_config(), None);
    let fast = read_all(&input, xy_config(), Some(""));
    assert_eq!(fast, sequential);
    assert_eq!(sequential[0].get_bytes("x"), Some(&b"M\xfcl"[..]));

    FlrFile::open(&output, OpenMode::Write, xy_config(), |file| {
        sequential.iter().try_for_each(|r| file.write_record(r))
    })
    .unwrap();
    assert_eq!(fs::read(&output).unwrap(), original);
}

#[test]
fn test_huge_ranges_and_budget_read_what_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.dat");
    fs::write(&path, "abc12\ndef34\n").unwrap();

    let config = parse_layout("KIND A\nFIELD A x 1-3\nFIELD A y 4-5\nBUDGET 1000000000000\n").unwrap();
    let records = read_all(
        &path,
        config,
        Some("4000000000000000000..4000000000000000000,1..100000000000"),
    );
    let xs: Vec<&str> = records.iter().filter_map(|r| r.get("x")).collect();
    assert_eq!(xs, vec!["abc", "def"]);

    let nothing = read_all(&path, xy_config(), Some("3..18446744073709551615"));
    assert!(nothing.is_empty());
}
