use std::cell::Cell;

use super::*;
use crate::utils::SerializationFormat::{Json, Toml, Yaml};

#[test]
fn it_validates_empty_input() {
    // Nothing at all: still in the initial state
    assert_eq!(validate_str(""), ValidationOutcome::Incomplete { state: 1 });
    // Blanks only
    assert_eq!(
        validate_str(" \n\t "),
        ValidationOutcome::Incomplete { state: 1 }
    );
}

#[test]
fn it_requires_end() {
    let outcome = validate_str("B 4 2 1 1 ;");
    assert_eq!(outcome, ValidationOutcome::Incomplete { state: 1 });
    assert!(!outcome.is_accepted());
    assert!(matches!(
        outcome.into_result(),
        Err(CifError::Incomplete { state: 1 })
    ));

    let outcome = validate_str("B 4 2 1 1 ; E");
    assert_eq!(outcome, ValidationOutcome::Accepted { state: 91 });
    assert_eq!(outcome.into_result().ok(), Some(91));
    assert_eq!(
        validate_str("B 4 2 1 1 ; E \n"),
        ValidationOutcome::Accepted { state: 92 }
    );
}

#[test]
fn it_reports_invalid_bytes() {
    // Minus signs are not separators
    let outcome = validate_str("P 12-3");
    assert_eq!(
        outcome,
        ValidationOutcome::Invalid {
            state: 4,
            byte: b'-',
            offset: 4
        }
    );
    assert_eq!(outcome.state(), 4);
    assert_eq!(
        outcome.messages(),
        vec![
            "validate: error: invalid content detected when validating input",
            "    State: 4",
            "    Input char: - (ASCII=45)",
            "    Offset: 4",
        ]
    );
    // Unknown command keywords
    assert_eq!(
        validate_str("L NM ; X 1 ;"),
        ValidationOutcome::Invalid {
            state: 1,
            byte: b'X',
            offset: 7
        }
    );
    // Anything after End other than blanks
    assert!(matches!(
        validate_str("E ; "),
        ValidationOutcome::Invalid { state: 92, .. }
    ));
}

#[test]
fn it_stops_at_the_first_invalid_byte() {
    let pulled = Cell::new(0);
    let src = b"P 12-3 ; E";
    let bytes = src.iter().copied().inspect(|_| pulled.set(pulled.get() + 1));
    let outcome = validate(bytes);
    assert!(matches!(outcome, ValidationOutcome::Invalid { offset: 4, .. }));
    // Four accepted bytes, plus the rejected one
    assert_eq!(pulled.get(), 5);
}

#[test]
fn it_validates_readers() -> CifResult<()> {
    let src: &[u8] = b"DS 1 ; L NM ; B 4 2 1 1 ; DF ; C 1 ; E";
    let outcome = Validator::shared().validate_reader(src)?;
    assert!(outcome.is_accepted());
    Ok(())
}

#[test]
fn it_validates_with_a_private_grammar() -> CifResult<()> {
    let grammar = CifGrammar::new()?;
    let validator = Validator::new(&grammar);
    assert_eq!(
        validator.validate(b"L NM ; E".iter().copied()),
        ValidationOutcome::Accepted { state: 91 }
    );
    // Step-wise, through a cursor
    let mut cursor = CifCursor::new(&grammar);
    assert_eq!(cursor.feed(b'E'), Some(91));
    assert_eq!(cursor.feed(b';'), None);
    assert_eq!(cursor.state(), 91);
    assert_eq!(cursor.offset(), 1);
    assert!(cursor.finish().is_accepted());
    Ok(())
}

#[test]
fn it_shares_one_grammar_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let src = format!("DS {} ; B 4 2 1 1 ; DF ; E", i);
                validate_str(&src)
            })
        })
        .collect();
    for h in handles {
        let outcome = h.join().unwrap();
        assert_eq!(outcome, ValidationOutcome::Accepted { state: 91 });
    }
    assert!(std::ptr::eq(CifGrammar::shared(), CifGrammar::shared()));
}

#[test]
fn it_parses_boxes() -> CifResult<()> {
    let b: CifBox = "B 4 2 1 1 ;".parse()?;
    assert_eq!(
        b,
        CifBox {
            size: CifSize::new(4, 2),
            position: CifPoint::new(1, 1),
            rotation: CifBox::DEFAULT_ROTATION,
        }
    );
    let b: CifBox = "B 4 2 -1 1 0 1 ;".parse()?;
    assert_eq!(b.position, CifPoint::new(-1, 1));
    assert_eq!(b.rotation, CifPoint::new(0, 1));
    // Upper-case letters are separators
    let b: CifBox = "B L 40 W 20 C 30 10;".parse()?;
    assert_eq!(b.size, CifSize::new(40, 20));
    assert_eq!(b.position, CifPoint::new(30, 10));
    // Rotation is always written
    assert_eq!(b.to_string(), "B 40 20 30 10 1 0 ;");
    Ok(())
}

#[test]
fn it_parses_definition_commands() -> CifResult<()> {
    let cmd: CifCommand = "D D 7 ;".parse()?;
    assert_eq!(
        cmd,
        CifCommand::DefinitionDelete(CifDefinitionDelete { id: 7 })
    );
    assert_eq!(cmd.to_string(), "D D 7 ;");
    assert_eq!(cmd.command_type(), CifCommandType::DefinitionDelete);
    assert_eq!(cmd.family(), CifCommandFamily::Control);
    assert_eq!(cmd.id(), Some(7));

    let cmd: CifCommand = "DS 12 100 1;".parse()?;
    assert_eq!(
        cmd,
        CifCommand::DefinitionStart(CifDefinitionStart {
            id: 12,
            scale: Some(CifScale { a: 100, b: 1 }),
        })
    );
    assert_eq!(cmd.to_string(), "D S 12 100 1 ;");
    let cmd: CifCommand = "D S 3 ;".parse()?;
    assert_eq!(cmd.to_string(), "D S 3 ;");

    let cmd: CifCommand = "DF ;".parse()?;
    assert_eq!(cmd, CifCommand::DefinitionFinish);
    assert_eq!(cmd.to_string(), "D F ;");
    Ok(())
}

#[test]
fn it_parses_calls() -> CifResult<()> {
    let call: CifCall = "C 12 T 100 -200 MX R 0 1 M Y;".parse()?;
    assert_eq!(call.id, 12);
    assert_eq!(
        call.transforms,
        vec![
            CifTransform::Translate(CifPoint::new(100, -200)),
            CifTransform::Mirror(CifAxis::X),
            CifTransform::Rotate(CifPoint::new(0, 1)),
            CifTransform::Mirror(CifAxis::Y),
        ]
    );
    assert_eq!(call.to_string(), "C 12 T 100 -200 M X R 0 1 M Y ;");
    let call: CifCall = "C 3;".parse()?;
    assert!(call.transforms.is_empty());
    assert_eq!(call.to_string(), "C 3 ;");
    Ok(())
}

#[test]
fn it_parses_paths() -> CifResult<()> {
    let p: CifPolygon = "P 0 0 10 0 10 10 0 10;".parse()?;
    assert_eq!(p.points.len(), 4);
    assert_eq!(p.to_string(), "P 0 0 10 0 10 10 0 10 ;");
    let cmd = CifCommand::from(p);
    assert_eq!(cmd.family(), CifCommandFamily::Primitive);
    assert_eq!(cmd.path().map(|p| p.len()), Some(4));

    let w: CifWire = "W 4 -5 -5 5 -5 5 5 ;".parse()?;
    assert_eq!(w.width, 4);
    assert_eq!(w.points[0], CifPoint::new(-5, -5));
    assert_eq!(w.to_string(), "W 4 -5 -5 5 -5 5 5 ;");

    let r: CifRoundFlash = "R 6 0 -20 ;".parse()?;
    assert_eq!(r.to_string(), "R 6 0 -20 ;");
    assert_eq!(
        CifCommand::from(r).position(),
        Some(&CifPoint::new(0, -20))
    );
    Ok(())
}

#[test]
fn it_parses_extensions() -> CifResult<()> {
    let u: CifUserExtension = "94 pad 10 20 ;".parse()?;
    assert_eq!(u.code, 9);
    assert_eq!(u.text, "4 pad 10 20");
    assert_eq!(u.to_string(), "94 pad 10 20 ;");

    let c: CifComment = "(a comment, of (sorts) ;".parse()?;
    assert_eq!(c.text, "a comment, of (sorts");
    assert_eq!(c.to_string(), "(a comment, of (sorts) ;");
    assert_eq!(CifCommand::from(c).family(), CifCommandFamily::Extension);

    let l: CifLayer = "L CPG;".parse()?;
    assert_eq!(l.name, "CPG");
    assert_eq!(l.to_string(), "L CPG ;");
    Ok(())
}

#[test]
fn it_rejects_malformed_fields() {
    match "B 4 ;".parse::<CifBox>() {
        Err(CifError::MalformedField {
            command,
            field,
            pos,
            found,
        }) => {
            assert_eq!(command, Some(CifCommandType::Box));
            assert_eq!(field, "size.height");
            assert_eq!(pos, 4);
            assert_eq!(found, Some(b';'));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        "C 1 M Z ;".parse::<CifCall>(),
        Err(CifError::MalformedField { field: "mirror", .. })
    ));
    assert!(matches!(
        "P ;".parse::<CifPolygon>(),
        Err(CifError::MalformedField { field: "path", .. })
    ));
    // Beyond the range of signed 64-bit integers
    assert!(matches!(
        "T 99999999999999999999 0".parse::<CifPoint>(),
        Err(CifError::MalformedField { field: "point", .. })
    ));
    assert!(matches!(
        "D D 7 ; 5".parse::<CifCommand>(),
        Err(CifError::Trailing { pos: 8 })
    ));
    assert!(matches!(
        "X 1 ;".parse::<CifCommand>(),
        Err(CifError::Unsupported {
            keyword: b'X',
            pos: 0
        })
    ));
}

#[test]
fn it_parses_files() -> CifResult<()> {
    let file = CifFile::open(resource("sample.cif"))?;
    let types: Vec<CifCommandType> = file.commands.iter().map(|c| c.command_type()).collect();
    use CifCommandType::*;
    assert_eq!(
        types,
        vec![
            Comment,
            DefinitionStart,
            UserExtension,
            Layer,
            Box,
            Box,
            Polygon,
            Layer,
            Wire,
            RoundFlash,
            DefinitionFinish,
            DefinitionStart,
            Call,
            Call,
            DefinitionFinish,
            Call,
            DefinitionDelete,
            End,
        ]
    );
    assert_eq!(
        file.commands[2],
        CifCommand::UserExtension(CifUserExtension {
            code: 9,
            text: " inv".into()
        })
    );
    Ok(())
}

#[test]
fn it_round_trips() -> CifResult<()> {
    let file = CifFile::open(resource("sample.cif"))?;
    let cif = file.to_string()?;
    assert!(validate_str(&cif).is_accepted());
    let readback = CifFile::parse_str(&cif)?;
    assert_eq!(file, readback);

    // Through disk
    let path = std::env::temp_dir().join("cif21_round_trip.cif");
    file.save(&path)?;
    let readback = CifFile::open(&path)?;
    assert_eq!(file, readback);
    Ok(())
}

#[test]
fn it_appends_end() -> CifResult<()> {
    let mut file = CifFile::new();
    file.commands.push(CifLayer { name: "NM".into() }.into());
    file.commands.push(
        CifBox {
            size: CifSize::new(4, 2),
            position: CifPoint::new(1, 1),
            ..Default::default()
        }
        .into(),
    );
    let cif = file.to_string()?;
    assert_eq!(cif, "L NM ;\nB 4 2 1 1 1 0 ;\nE\n");
    // An existing End is not duplicated
    file.commands.push(CifCommand::End);
    assert_eq!(file.to_string()?, cif);
    Ok(())
}

#[test]
fn it_reports_loader_messages() {
    let mut loader = CifLoader::default();
    let result = loader.load_bytes(b"P 12-3 ; E");
    assert!(matches!(
        result,
        Err(CifError::Invalid {
            state: 4,
            byte: b'-',
            offset: 4
        })
    ));
    let msgs = loader.messages();
    assert!(msgs.iter().any(|m| m == "    State: 4"));
    assert!(msgs.iter().any(|m| m.contains("(ASCII=45)")));

    let result = loader.load_bytes(b"L NM ;");
    assert!(matches!(result, Err(CifError::Incomplete { state: 1 })));
    assert!(loader.messages()[0].contains("missing End command"));

    let result = loader.load_file(resource("does_not_exist.cif"));
    assert!(matches!(result, Err(CifError::Resource(_))));
    assert!(loader.messages()[0].starts_with("open: error: can't open input file"));
}

#[test]
fn it_skips_unsupported_commands() -> CifResult<()> {
    let src = b"L NM ; X 1 2 ; B 4 2 1 1 ; E";

    // Aborting is the default, once validation is disabled
    let opts = CifReadOptions {
        validate: false,
        ..Default::default()
    };
    let mut loader = CifLoader::new(opts.clone());
    assert!(matches!(
        loader.load_bytes(src),
        Err(CifError::Unsupported {
            keyword: b'X',
            pos: 7
        })
    ));

    let opts = CifReadOptions {
        unsupported: UnsupportedPolicy::Skip,
        ..opts
    };
    let mut loader = CifLoader::new(opts);
    let file = loader.load_bytes(src)?;
    assert_eq!(file.commands.len(), 3);
    assert_eq!(loader.messages().len(), 1);
    assert!(loader.messages()[0].contains("skipping"));
    Ok(())
}

#[test]
fn it_loads_read_options() -> CifResult<()> {
    let opts: CifReadOptions = Yaml.from_str(
        r#"
        unsupported: Skip
        "#,
    )?;
    assert!(opts.validate);
    assert_eq!(opts.unsupported, UnsupportedPolicy::Skip);
    Ok(())
}

#[test]
fn it_serializes() -> CifResult<()> {
    let file = CifFile::open(resource("sample.cif"))?;
    let json = Json.to_string(&file)?;
    let from_json: CifFile = Json.from_str(&json)?;
    assert_eq!(file, from_json);
    let yaml = Yaml.to_string(&file)?;
    let from_yaml: CifFile = Yaml.from_str(&yaml)?;
    assert_eq!(file, from_yaml);
    // And the outcome type
    let outcome = validate_str("P 12-3");
    let json = serde_json::to_string(&outcome).unwrap();
    let from_json: ValidationOutcome = serde_json::from_str(&json).unwrap();
    assert_eq!(outcome, from_json);
    Ok(())
}

#[test]
fn it_serializes_toml() -> CifResult<()> {
    // Every command, including those without payloads, is a TOML table
    let file = CifFile::open(resource("sample.cif"))?;
    let toml = Toml.to_string(&file)?;
    assert!(toml.contains("type = \"End\""));
    assert!(toml.contains("type = \"DefinitionFinish\""));
    let from_toml: CifFile = Toml.from_str(&toml)?;
    assert_eq!(file, from_toml);

    let path = std::env::temp_dir().join("cif21_sample.cif.toml");
    Toml.save(&file, &path)?;
    let from_disk: CifFile = Toml.open(&path)?;
    assert_eq!(file, from_disk);
    Ok(())
}

#[test]
fn it_tags_serialized_commands() -> CifResult<()> {
    let cmd: CifCommand = "B 4 2 1 1 ;".parse()?;
    let json = serde_json::to_value(&cmd).unwrap();
    assert_eq!(json["type"], "Box");
    assert_eq!(json["size"]["width"], 4);
    let json = serde_json::to_value(&CifCommand::End).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "End" }));
    Ok(())
}

#[test]
fn it_keeps_opaque_text_exact() -> CifResult<()> {
    // Multi-byte UTF-8 text is written back byte-for-byte
    let src = "(caf\u{e9}) ;\n9 \u{3bc}m ;\nE\n";
    let file = CifFile::parse_str(src)?;
    assert_eq!(
        file.commands[0],
        CifCommand::Comment(CifComment {
            text: "caf\u{e9}".into()
        })
    );
    assert_eq!(file.to_string()?.as_bytes(), src.as_bytes());

    // Text which is not UTF-8 is rejected, rather than altered
    let mut loader = CifLoader::default();
    match loader.load_bytes(b"(caf\xe9) ; E") {
        Err(CifError::MalformedField {
            command,
            field,
            pos,
            found,
        }) => {
            assert_eq!(command, Some(CifCommandType::Comment));
            assert_eq!(field, "text");
            assert_eq!(pos, 4);
            assert_eq!(found, Some(0xe9));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(loader.messages()[0].starts_with("load: error"));
    assert!(matches!(
        loader.load_bytes(b"9 \xff\xfe ; E"),
        Err(CifError::MalformedField {
            command: Some(CifCommandType::UserExtension),
            field: "text",
            pos: 2,
            ..
        })
    ));
    Ok(())
}

#[test]
fn it_writes_schema() -> CifResult<()> {
    // Create the [schemars] JSON-Schema for [CifFile]
    use schemars::schema_for;
    let schema = schema_for!(CifFile);
    let json = Json.to_string(&schema)?;
    assert!(json.contains("CifCommand"));
    assert!(json.contains("CifTransform"));
    Ok(())
}

/// Helper function: Grab the full path of resource-file `fname`
fn resource(rname: &str) -> String {
    format!("{}/resources/{}", env!("CARGO_MANIFEST_DIR"), rname)
}
