use h36m_metadata::{ActionKey, Error, MetadataLayout, SequenceMetadataIndex};

const SUBJECTS: [&str; 7] = ["S1", "S5", "S6", "S7", "S8", "S9", "S11"];

fn load() -> SequenceMetadataIndex {
    let buf = include_str!("h36m/metadata.xml");
    SequenceMetadataIndex::from_xml(buf.as_bytes()).expect("from_xml")
}

/// The (action, subaction) pairs of the 32 data rows in the fixture.
fn fixture_keys() -> Vec<(usize, usize)> {
    let mut keys = vec![(1, 1), (1, 2)];
    for action in 2..=16 {
        keys.push((action, 1));
        keys.push((action, 2));
    }
    keys
}

#[test]
fn test_subjects_in_header_order() {
    let index = load();
    assert_eq!(index.subjects(), &SUBJECTS);
    assert_eq!(index.sequence_mappings().len(), SUBJECTS.len());
}

#[test]
fn test_base_filename_for_every_sequence() -> eyre::Result<()> {
    let index = load();
    for subject in SUBJECTS {
        for (action, subaction) in fixture_keys() {
            for camera in index.camera_ids() {
                let expected = format!("{subject}_{action:02}_{subaction}.{camera}");
                let actual = index.base_filename(
                    subject,
                    &action.to_string(),
                    &subaction.to_string(),
                    camera,
                )?;
                assert_eq!(actual, expected);
            }
        }
        assert_eq!(index.sequences(subject)?.count(), 32);
    }
    // the camera is a literal suffix
    assert_eq!(
        index.resolve_base_filename("S9", "5", "2", "not-a-camera")?,
        "S9_05_2.not-a-camera"
    );
    Ok(())
}

#[test]
fn test_lookup_errors() {
    let index = load();
    for (subject, action, subaction) in [
        ("S2", "2", "1"),
        ("S1", "17", "1"),
        ("S1", "2", "3"),
        ("s1", "2", "1"),
        // present in the document but after the last read row
        ("S1", "99", "1"),
    ] {
        let result = index.base_filename(subject, action, subaction, "54138969");
        assert!(matches!(result, Err(Error::Lookup { .. })), "{result:?}");
    }
    assert!(matches!(index.sequences("S3"), Err(Error::Lookup { .. })));
}

#[test]
fn test_action_names_are_positional() {
    let index = load();
    let names: Vec<_> = index.action_names().collect();
    assert_eq!(names.len(), 15);
    for (i, (id, _)) in names.iter().enumerate() {
        assert_eq!(*id, (i + 1).to_string());
    }
    assert_eq!(names[0], ("1", "Directions"));
    assert_eq!(names[14], ("15", "WalkTogether"));
    assert_eq!(index.action_name("10").unwrap(), "Smoking");
    assert!(matches!(index.action_name("0"), Err(Error::Lookup { .. })));
    assert!(matches!(index.action_name("16"), Err(Error::Lookup { .. })));
}

#[test]
fn test_camera_order_preserved() {
    let index = load();
    assert_eq!(
        index.camera_ids(),
        &["54138969", "55011271", "58860488", "60457274"]
    );
    assert_eq!(index.camera_number("58860488"), Some(3));
}

#[test]
fn test_layout_override() -> eyre::Result<()> {
    let buf = include_str!("h36m/metadata.xml");

    // reading one more row picks up the trailing row
    let layout = MetadataLayout { mapping_rows: 33 };
    let index = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout)?;
    assert_eq!(index.prefix("S11", "99", "1")?, "S11_ignored");

    let layout = MetadataLayout { mapping_rows: 34 };
    let result = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout);
    assert!(matches!(result, Err(Error::MalformedDocument { .. })));

    let layout = MetadataLayout { mapping_rows: 2 };
    let index = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout)?;
    let keys: Vec<&ActionKey> = index.sequences("S1")?.map(|(k, _)| k).collect();
    assert_eq!(keys, vec![&ActionKey::new("1", "1"), &ActionKey::new("1", "2")]);
    Ok(())
}

#[test]
fn test_section_order_irrelevant() {
    let buf = r#"<metadata>
        <dbcameras><index2id><item>c1</item></index2id></dbcameras>
        <actionnames><item>Walking</item></actionnames>
        <mapping>
            <tr><td/><td/><td>S1</td></tr>
            <tr><td>1</td><td>1</td><td>Walking 1</td></tr>
        </mapping>
    </metadata>"#;
    let layout = MetadataLayout { mapping_rows: 1 };
    let index = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout).unwrap();
    assert_eq!(
        index.base_filename("S1", "1", "1", "c1").unwrap(),
        "Walking 1.c1"
    );
    assert_eq!(index.camera_ids(), &["c1"]);
}

#[test]
fn test_missing_dbcameras() {
    let buf = include_str!("h36m/metadata.xml").replace("dbcameras", "cameras");
    let result = SequenceMetadataIndex::from_xml(buf.as_bytes());
    assert!(matches!(result, Err(Error::MalformedDocument { .. })));
}

#[test]
fn test_from_path() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/h36m/metadata.xml");
    let index = SequenceMetadataIndex::from_path(&path).unwrap();
    assert_eq!(index.subjects().len(), 7);
    assert!(matches!(
        SequenceMetadataIndex::from_path(path.with_extension("missing")),
        Err(Error::Io(_))
    ));
}
