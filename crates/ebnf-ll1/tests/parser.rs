use ebnf_ll1::{
    lit, Grammar, Language, Lookahead, ParseError, ParseErrorKind, ParseOptions, ParseReport,
    Parser, ProductionHandle, Term, Token,
};
use proptest::prelude::*;

#[derive(Default, Debug)]
struct Events {
    starts: usize,
    finishes: usize,
    statements: Vec<String>,
}

struct Triples {
    language: Language,
    doc: ProductionHandle,
    stmt: ProductionHandle,
}

/// `subject verb object (, object)* (; verb object ...)* .` statements.
fn triples() -> Triples {
    let mut b = Language::builder();
    let iri = b.terminal("IRI", r"<[^>\s]*>").unwrap();
    let name = b.terminal("NAME", "[a-z]+").unwrap();
    for punct in [".", ";", ","] {
        b.literal(punct).unwrap();
    }

    let doc = b.production("doc");
    let stmt = b.production("stmt");
    let predlist = b.production("predlist");
    let predtail = b.production("predtail");
    let objlist = b.production("objlist");
    let objtail = b.production("objtail");
    let term = b.production("term");

    let starts = [Lookahead::Terminal(iri), Lookahead::Terminal(name)];
    let p = Term::Production;
    for first in starts.clone() {
        b.branch(doc, first.clone(), [p(stmt), p(doc)]);
        b.branch(stmt, first.clone(), [p(term), p(predlist), Term::from(lit("."))]);
        b.branch(predlist, first.clone(), [p(term), p(objlist), p(predtail)]);
        b.branch(objlist, first.clone(), [p(term), p(objtail)]);
        b.branch(term, first.clone(), [Term::from(first)]);
    }
    b.empty(doc);
    b.branch(predtail, lit(";"), [lit(";").into(), p(predlist)]);
    b.empty(predtail);
    b.branch(objtail, lit(","), [lit(",").into(), p(objlist)]);
    b.empty(objtail);

    b.follow(doc, std::iter::empty());
    b.follow(stmt, starts.clone());
    b.follow(predlist, [lit(".")]);
    b.follow(predtail, [lit(".")]);
    b.follow(objlist, [lit(";"), lit(".")]);
    b.follow(objtail, [lit(";"), lit(".")]);
    b.follow(term, starts.into_iter().chain([lit(","), lit(";"), lit(".")]));
    b.start(doc);

    Triples {
        language: b.build(),
        doc,
        stmt,
    }
}

/// Collects terms upwards and emits every finished statement.
fn grammar(triples: &Triples) -> Grammar<Vec<String>, Events> {
    let language = &triples.language;
    let stmt = triples.stmt;

    let push_text = |_: ProductionHandle, token: &Token, data: &mut Vec<String>, _: &mut Events| {
        data.push(token.text.clone())
    };

    let mut builder = Grammar::<Vec<String>, Events>::builder()
        .terminal(language.terminal("IRI").unwrap(), push_text)
        .terminal(language.terminal("NAME").unwrap(), push_text)
        .any_literal(push_text);

    for (production, _) in language.symbols.productions() {
        builder = builder
            .start(production, |_, _, events: &mut Events| events.starts += 1)
            .finish(production, move |parent, data, events| {
                events.finishes += 1;
                match production == stmt {
                    true => events.statements.push(data.join(" ")),
                    false => parent.extend(data),
                }
            });
    }
    builder.build()
}

fn parse(
    src: &str,
    validate: bool,
) -> (Result<ParseReport<Vec<String>>, ParseError>, Events) {
    let triples = triples();
    let grammar = grammar(&triples);
    let mut events = Events::default();

    let parser =
        Parser::new(&triples.language, &grammar).with_options(ParseOptions { validate });
    let result = parser.parse(triples.language.tokenize(src), triples.doc, &mut events);
    (result, events)
}

#[test]
fn well_formed() {
    let (result, events) = parse("<a> b c ; d e , f .\nx y z .", false);
    let report = result.unwrap();

    assert!(report.is_ok(), "{:?}", report.errors);
    assert_eq!(events.statements, ["<a> b c ; d e , f .", "x y z ."]);
    assert_eq!(events.starts, events.finishes);
}

#[test]
fn empty_document() {
    let (result, events) = parse("  # nothing here\n", false);
    assert!(result.unwrap().is_ok());
    assert_eq!(events.starts, 1);
    assert_eq!(events.finishes, 1);
}

#[test]
fn recovers_at_follow_of_erroring_production() {
    let (result, events) = parse("<a> b . x y z .", false);
    let report = result.unwrap();

    assert_eq!(report.errors.len(), 1);
    let error = &report.errors[0];
    assert_eq!(
        error.kind,
        ParseErrorKind::Syntax {
            expected: vec!["IRI".into(), "NAME".into()]
        }
    );
    assert_eq!(error.production.as_deref(), Some("objlist"));
    assert_eq!(error.found.as_deref(), Some("\".\""));
    assert_eq!(error.line, 1);

    assert_eq!(events.statements, ["<a> b .", "x y z ."]);
    assert_eq!(events.starts, events.finishes);
}

/// The innermost production on the stack whose FOLLOW set holds the
/// lookahead is completed, its parent resumes parsing.
#[test]
fn recovery_anchors_at_innermost_follow() {
    let (result, events) = parse("<a> b c d .", false);
    let report = result.unwrap();

    // `d` follows a statement, so the first one is abandoned there, and the
    // second one lacks its objects, which `.` follows
    let productions = report
        .errors
        .iter()
        .map(|e| e.production.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(productions, [Some("stmt"), Some("predlist")]);
    assert_eq!(events.statements, ["<a> b c", "d ."]);
    assert_eq!(events.starts, events.finishes);
}

#[test]
fn skips_tokens_until_follow() {
    let (result, events) = parse("<a> b c , , , ; d e . x y z .", false);
    let report = result.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(events.statements.last().unwrap(), "x y z .");
    assert_eq!(events.starts, events.finishes);
}

#[test]
fn lex_errors_are_skipped() {
    let (result, events) = parse("<a> b %%% c .\nx y z .", false);
    let report = result.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].is_lex());
    assert_eq!(events.statements, ["<a> b c .", "x y z ."]);
}

#[test]
fn unexpected_end() {
    let (result, events) = parse("<a> b", false);
    let report = result.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0].kind,
        ParseErrorKind::UnexpectedEnd { .. }
    ));
    assert_eq!(events.starts, events.finishes);
    assert_eq!(events.statements, ["<a> b"]);
}

#[test]
fn trailing_input() {
    let triples = triples();
    let grammar = grammar(&triples);
    let mut events = Events::default();

    let parser = Parser::new(&triples.language, &grammar);
    let lexer = triples.language.tokenize("x y z . a b c .");
    let report = parser.parse(lexer, triples.stmt, &mut events).unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ParseErrorKind::TrailingInput);
    assert_eq!(report.errors[0].found.as_deref(), Some("NAME \"a\""));
    assert_eq!(events.statements, ["x y z ."]);
}

#[test]
fn missing_branch_entry_is_structural() {
    let mut b = Language::builder();
    let name = b.terminal("NAME", "[a-z]+").unwrap();
    let doc = b.production("doc");
    let missing = b.production("missing");
    b.branch(
        doc,
        Lookahead::Terminal(name),
        [Term::Production(missing), Term::Terminal(name)],
    );
    let language = b.build();

    let grammar = Grammar::<(), ()>::builder().build();
    let report = Parser::new(&language, &grammar)
        .parse(language.tokenize("a"), doc, &mut ())
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].is_structural());
    assert_eq!(report.errors[0].production.as_deref(), Some("missing"));
}

#[test]
fn validate_aborts_on_first_error() {
    let src = "<a> b . x y z .";

    let (result, _) = parse(src, false);
    assert!(result.is_ok());

    let (result, events) = parse(src, true);
    let error = result.unwrap_err();
    assert!(error.is_syntax());
    assert_eq!(error.production.as_deref(), Some("objlist"));
    assert_eq!(events.starts, events.finishes);
    assert!(events.statements.len() <= 1);
}

#[test]
fn deep_nesting_does_not_recurse() {
    let mut src = String::from("<a> b c");
    for _ in 0..5_000 {
        src.push_str(" , c");
    }
    src.push_str(" .");

    let (result, events) = parse(&src, false);
    assert!(result.unwrap().is_ok());
    assert_eq!(events.statements.len(), 1);
    assert_eq!(events.starts, events.finishes);
}

fn tokens() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec!["<a>", "b", ".", ";", ",", "%", "\n"]);
    prop::collection::vec(token, 0..40).prop_map(|tokens| tokens.join(" "))
}

proptest! {
    #[test]
    fn handlers_are_paired(src in tokens(), validate in any::<bool>()) {
        let (_, events) = parse(&src, validate);
        prop_assert_eq!(events.starts, events.finishes);
    }

    #[test]
    fn recovery_terminates(src in tokens()) {
        let (result, events) = parse(&src, false);
        let report = result.unwrap();
        prop_assert!(events.statements.len() <= src.matches("<a>").count() + src.matches('b').count());
        // an error either consumes input or is followed by one that does
        prop_assert!(report.errors.len() <= 2 * src.split_whitespace().count() + 2);
    }
}
