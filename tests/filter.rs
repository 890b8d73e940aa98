use std::sync::Arc;

use anyhow::Result;
use pretty_assertions::assert_eq;

use vertigo::{filter::matches, AttrMap, FilterCnf, ParserConf, Token};

fn token_with(pairs: &[(&str, &str)]) -> Token {
    Token {
        idx: 0,
        word: "word".to_owned(),
        attrs: vec!["lemma".into(), "tag".into(), "pos".into(), "func".into()],
        struct_attrs: Arc::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
    }
}

fn type_and_language() -> FilterCnf {
    FilterCnf::from_pairs(&[
        &[("doc.type", "foo"), ("doc.type", "bar")],
        &[("doc.language", "en"), ("doc.language", "cs")],
    ])
}

#[test]
fn test_token_matches_filter() {
    let token = token_with(&[("doc.type", "bar"), ("doc.language", "en")]);
    assert!(token.matches_filter(&type_and_language()));
}

#[test]
fn test_token_matches_filter_no_match() {
    let token = token_with(&[("doc.type", "xxx"), ("doc.language", "en")]);
    assert!(!token.matches_filter(&type_and_language()));
}

#[test]
fn test_missing_attribute_never_matches() {
    let token = token_with(&[("doc.type", "foo")]);
    assert!(!token.matches_filter(&type_and_language()));

    // not even an empty expected value
    let filter = FilterCnf::from_pairs(&[&[("doc.language", "")]]);
    assert!(!token.matches_filter(&filter));
}

#[test]
fn test_empty_filter_matches_everything() {
    assert!(matches(&AttrMap::new(), &FilterCnf::default()));
    assert!(token_with(&[("doc.type", "xxx")]).matches_filter(&FilterCnf::default()));
}

#[test]
fn test_clause_without_alternatives_never_matches() {
    let filter = FilterCnf::new(vec![vec![]]);
    assert!(!matches(&AttrMap::new(), &filter));
}

#[test]
fn test_token_pos_attr_by_index() {
    let token = token_with(&[]);
    assert_eq!(token.pos_attr_by_index(0), Some("word"));
    assert_eq!(token.pos_attr_by_index(1), Some("lemma"));
    assert_eq!(token.pos_attr_by_index(2), Some("tag"));
    assert_eq!(token.pos_attr_by_index(3), Some("pos"));
    assert_eq!(token.pos_attr_by_index(4), Some("func"));
    assert_eq!(token.pos_attr_by_index(80), None);
}

#[test]
fn test_token_word_lc() {
    let mut token = token_with(&[]);
    token.word = "Žluťoučký".to_owned();
    assert_eq!(token.word_lc(), "žluťoučký");
}

#[test]
fn test_filter_from_str() -> Result<()> {
    let filter: FilterCnf = "doc.type=foo|doc.type=bar; doc.language=en|doc.language=cs".parse()?;
    assert_eq!(filter, type_and_language());

    let filter: FilterCnf = "div.author=John Doe".parse()?;
    assert_eq!(filter, FilterCnf::from_pairs(&[&[("div.author", "John Doe")]]));

    assert!("doc.type".parse::<FilterCnf>().is_err());
    assert!("=foo".parse::<FilterCnf>().is_err());
    assert!("".parse::<FilterCnf>()?.is_empty());
    Ok(())
}

#[test]
fn test_filter_from_json() -> Result<()> {
    let conf = ParserConf::from_json(
        r#"{
            "inputFilePath": "corpus.vert",
            "filterArgs": [
                [["div.author", "John Doe"]],
                [["div.title", "Unknown"], ["div.title", "Superunknown"]]
            ]
        }"#,
    )?;
    assert_eq!(
        conf.filter_args,
        FilterCnf::from_pairs(&[
            &[("div.author", "John Doe")],
            &[("div.title", "Unknown"), ("div.title", "Superunknown")],
        ])
    );

    let token = token_with(&[("div.author", "John Doe"), ("div.title", "Superunknown")]);
    assert!(token.matches_filter(&conf.filter_args));
    Ok(())
}
