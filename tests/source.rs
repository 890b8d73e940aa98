use std::{io::Read, path::PathBuf};

use anyhow::Result;
use pretty_assertions::assert_eq;
use rstest::rstest;

use vertigo::{charset::Charset, source::InputSource, Error, ParserConf};

#[test]
fn test_input_source_kinds() -> Result<()> {
    assert_eq!(
        InputSource::parse("/data/syn.vert")?,
        InputSource::File(PathBuf::from("/data/syn.vert"))
    );
    assert_eq!(
        InputSource::parse("/data/syn.vert.gz")?,
        InputSource::Gzip(PathBuf::from("/data/syn.vert.gz"))
    );
    assert_eq!(
        InputSource::parse("| /usr/bin/python3  gen.py --docs 10")?,
        InputSource::Command {
            program: "/usr/bin/python3".to_owned(),
            args: vec!["gen.py".to_owned(), "--docs".to_owned(), "10".to_owned()],
        }
    );
    Ok(())
}

#[test]
fn test_input_source_invalid() {
    assert!(matches!(InputSource::parse("|  "), Err(Error::Config(_))));
    assert!(matches!(InputSource::parse(""), Err(Error::Config(_))));
}

#[rstest]
#[case("| python3 \"/data/my gen.py\"", "python3", &["/data/my gen.py"])]
#[case("| sh -c 'cat a b'", "sh", &["-c", "cat a b"])]
#[case("| echo \"say \\\"hi\\\"\" x", "echo", &["say \"hi\"", "x"])]
#[case("| printf '' done", "printf", &["", "done"])]
#[case("| gen --name=\"a b\"c", "gen", &["--name=a bc"])]
fn test_input_command_quoting(
    #[case] locator: &str,
    #[case] program: &str,
    #[case] args: &[&str],
) -> Result<()> {
    let source = InputSource::parse(locator)?;
    assert_eq!(
        source,
        InputSource::Command {
            program: program.to_owned(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    );
    // printed form parses back to the same command
    assert_eq!(InputSource::parse(&format!("| {}", source))?, source);
    Ok(())
}

#[rstest]
#[case("| python3 \"gen.py")]
#[case("| sh -c 'cat")]
#[case("| echo \"a\\")]
fn test_input_command_unterminated_quote(#[case] locator: &str) {
    assert!(matches!(InputSource::parse(locator), Err(Error::Config(_))));
}

#[test]
fn test_quoted_command_source() -> Result<()> {
    let source = InputSource::parse("| sh -c 'cat ./tests/data/overlap.vert'")?;
    let mut opened = source.open()?;
    let mut data = String::new();
    opened.reader.read_to_string(&mut data)?;
    if let Some(child) = opened.child {
        child.wait()?;
    }
    assert_eq!(data, std::fs::read_to_string("./tests/data/overlap.vert")?);
    Ok(())
}

#[test]
fn test_input_source_missing_file() {
    let res = InputSource::parse("./tests/data/missing.vert").and_then(|s| s.open());
    assert!(matches!(res, Err(Error::Open { .. })));
}

#[test]
fn test_command_source_output() -> Result<()> {
    let source = InputSource::parse("| cat ./tests/data/overlap.vert")?;
    let opened = source.open()?;
    let mut data = String::new();
    let mut reader = opened.reader;
    reader.read_to_string(&mut data)?;
    drop(reader);
    opened.child.expect("command has a child process").wait()?;

    assert_eq!(data, std::fs::read_to_string("./tests/data/overlap.vert")?);
    Ok(())
}

#[rstest]
#[case("", "UTF-8")]
#[case("utf8", "UTF-8")]
#[case("UTF-8", "UTF-8")]
#[case("iso-8859-2", "ISO-8859-2")]
#[case("ISO_8859_2", "ISO-8859-2")]
#[case("iso-8859-1", "windows-1252")]
#[case("windows-1250", "windows-1250")]
#[case("cp1251", "windows-1251")]
fn test_charset_names(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(Charset::from_name(name).unwrap().name(), expected);
}

#[rstest]
#[case("shift_jis")]
#[case("utf-16le")]
#[case("latin9")]
#[case("klingon")]
fn test_unsupported_charset(#[case] name: &str) {
    assert!(matches!(Charset::from_name(name), Err(Error::Config(_))));
}

#[test]
fn test_charset_decode() -> Result<()> {
    let latin2 = Charset::from_name("iso-8859-2")?;
    // "žluťoučký kůň"
    let bytes = b"\xbelu\xbbou\xe8k\xfd k\xf9\xf2";
    assert_eq!(latin2.decode(bytes, 0)?, "žluťoučký kůň");

    let utf8 = Charset::utf8();
    assert_eq!(utf8.decode("kůň".as_bytes(), 0)?, "kůň");
    assert!(matches!(
        utf8.decode(b"k\xf9\xf2", 3),
        Err(Error::Decode { line: 3, .. })
    ));
    Ok(())
}

#[test]
fn test_load_conf() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{"inputFilePath": "| cat x.vert", "structAttrAccumulator": "comb", "logProgressEachNth": 0}"#,
    )?;

    let conf = ParserConf::load(&path)?;
    assert_eq!(conf.input_file_path, "| cat x.vert");
    assert_eq!(conf.struct_attr_accumulator, "comb");
    assert_eq!(conf.encoding, "");
    assert_eq!(conf.log_progress_each_nth, 0);
    assert_eq!(conf.channel_chunk_size, 250_000);
    assert!(conf.filter_args.is_empty());

    std::fs::write(&path, r#"{"structAttrAccumulator": "comb"}"#)?;
    assert!(matches!(ParserConf::load(&path), Err(Error::Config(_))));
    Ok(())
}
