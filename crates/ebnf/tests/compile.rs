use ebnf::{compile_expr, sxp, Ebnf, Expr, Rule, RuleKind};
use proptest::prelude::*;

const TURTLE: &str = r##"
/* A small part of the Turtle grammar */
[1]  turtleDoc   ::= statement*
[2]  statement   ::= directive | triples '.'
[3]  directive   ::= prefixID | base
[4]  prefixID    ::= '@prefix' PNAME_NS IRIREF '.'
[5]  base        ::= '@base' IRIREF '.'
[6]  triples     ::= subject predicateObjectList
[7]  predicateObjectList
                 ::= verb objectList (';' (verb objectList)?)*
[8]  objectList  ::= object (',' object)*
[9]  verb        ::= predicate | 'a'
[10] subject     ::= iri | BlankNode
[11] predicate   ::= iri
[12] object      ::= iri | BlankNode | literal
[13] literal     ::= STRING

@terminals

[18] IRIREF      ::= '<' ([^#x00-#x20<>"{}|^`\\] | UCHAR)* '>'
[19] PNAME_NS    ::= PN_PREFIX? ':'
[22] STRING      ::= '"' ([^#x22#x5C#xA#xD] | ECHAR)* '"'
[26] UCHAR       ::= '\u' HEX HEX HEX HEX
[159s] ECHAR     ::= '\' [tbnrf"'\\]
[163s] PN_CHARS_BASE
                 ::= [A-Z] | [a-z] | [#x00C0-#x00D6]
[167s] PN_PREFIX ::= PN_CHARS_BASE ((PN_CHARS_BASE | '.')* PN_CHARS_BASE)?
[171s] HEX       ::= [0-9] | [A-F] | [a-f]

@pass            [ \t\r\n]+ | "#" [^\r\n]*
"##;

fn id(s: &str) -> Expr {
    Expr::Id(s.into())
}

fn lit(s: &str) -> Expr {
    Expr::Literal(s.into())
}

#[test]
fn turtle_rules() {
    let ebnf = Ebnf::compile(TURTLE).unwrap();
    let rules = ebnf.rules();
    assert_eq!(rules.len(), 22);

    let first = &rules[0];
    assert_eq!(first.symbol.as_deref(), Some("turtleDoc"));
    assert_eq!(first.line, 3);
    assert_eq!(first.expr, Expr::Star(Box::new(id("statement"))));
    assert_eq!(ebnf.start(), Some(first));

    let list = ebnf.lookup("predicateObjectList").unwrap();
    assert_eq!(list.number, "7");
    assert_eq!(list.line, 9);
    assert_eq!(
        list.expr,
        Expr::Seq(vec![
            id("verb"),
            id("objectList"),
            Expr::Star(Box::new(Expr::Seq(vec![
                lit(";"),
                Expr::Opt(Box::new(Expr::Seq(vec![id("verb"), id("objectList")]))),
            ]))),
        ])
    );

    let echar = ebnf.lookup("ECHAR").unwrap();
    assert_eq!(echar.number, "159s");
    assert_eq!(
        echar.expr,
        Expr::Seq(vec![lit("\\"), Expr::Range(r#"tbnrf"'\\"#.into())])
    );

    let pass = rules.last().unwrap();
    assert_eq!(pass.kind, RuleKind::Pass);
    assert_eq!(pass.symbol, None);
    assert_eq!(
        pass.expr,
        Expr::Alt(vec![
            Expr::Plus(Box::new(Expr::Range(r" \t\r\n".into()))),
            Expr::Seq(vec![lit("#"), Expr::Star(Box::new(Expr::Range(r"^\r\n".into())))]),
        ])
    );
}

#[test]
fn single_rule() {
    let rules = ebnf::compile("[2] Prolog ::= BaseDecl? PrefixDecl*").unwrap();
    assert_eq!(rules.len(), 1);

    let prolog = &rules[0];
    assert_eq!(prolog.number, "2");
    assert_eq!(prolog.symbol.as_deref(), Some("Prolog"));
    assert_eq!(prolog.kind, RuleKind::Rule);
    assert_eq!(
        prolog.expr,
        Expr::Seq(vec![
            Expr::Opt(Box::new(id("BaseDecl"))),
            Expr::Star(Box::new(id("PrefixDecl"))),
        ])
    );

    let ebnf = Ebnf::from(rules);
    let text = ebnf.to_sxp();
    assert!(text.contains(r#"("2" Prolog rule (seq (opt BaseDecl) (star PrefixDecl)))"#));
    assert_eq!(Ebnf::from_sxp(&text).unwrap(), ebnf);
}

#[test]
fn terminals_marker_switches_kind() {
    let ebnf = Ebnf::compile(TURTLE).unwrap();
    let kinds = ebnf
        .rules()
        .iter()
        .filter_map(|rule| Some((rule.symbol.as_deref()?, rule.kind)))
        .collect::<Vec<_>>();

    assert!(kinds[..13].iter().all(|(_, kind)| *kind == RuleKind::Rule));
    assert!(kinds[13..].iter().all(|(_, kind)| *kind == RuleKind::Token));
}

#[test]
fn uppercase_symbol_latches_token_mode() {
    let ebnf = Ebnf::compile("[1] a ::= B\n[2] B ::= 'b' c\n[3] c ::= 'c'").unwrap();
    let kinds = ebnf.rules().iter().map(|r| r.kind).collect::<Vec<_>>();
    assert_eq!(kinds, [RuleKind::Rule, RuleKind::Token, RuleKind::Token]);
}

#[test]
fn original_text_is_kept() {
    let ebnf = Ebnf::compile(TURTLE).unwrap();
    let prefix = ebnf.lookup("PN_CHARS_BASE").unwrap();
    assert_eq!(
        prefix.original_text,
        "[163s] PN_CHARS_BASE\n                 ::= [A-Z] | [a-z] | [#x00C0-#x00D6]"
    );
}

#[test]
fn syntax_errors_name_the_rule() {
    let src = "[1] a ::= b\n[2] c ::= (d | e\n[3] f ::= g";
    let err = Ebnf::compile(src).unwrap_err();
    assert_eq!(err.rule.as_deref(), Some("2"));
    assert_eq!(err.line, 2);
    assert_eq!(err.to_string(), "unterminated group in rule [2] at line 2");

    let err = Ebnf::compile("@pass ' '\n@pass '\t'").unwrap_err();
    assert_eq!(err.message, "duplicate rule number");
}

#[test]
fn sxp_round_trip() {
    let ebnf = Ebnf::compile(TURTLE).unwrap();
    let text = ebnf.to_sxp();
    assert!(text.contains(r#"("1" turtleDoc rule (star statement))"#));
    assert!(text.contains(r#"("0" nil pass (alt"#));
    assert_eq!(Ebnf::from_sxp(&text).unwrap(), ebnf);

    // unwrapped rules read the same
    let rules = ebnf
        .rules()
        .iter()
        .map(|rule| sxp::Sxp(rule).to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(sxp::parse_rules(&rules).unwrap(), ebnf.rules());
}

#[test]
fn json_round_trip() {
    let ebnf = Ebnf::compile("[1] a ::= b? - c | ()\n@pass ' '").unwrap();
    let json = ebnf.to_json().unwrap();
    assert!(json.contains(r#""kind": "pass""#));
    assert!(json.contains(r#""seq": []"#));

    let read: Ebnf = serde_json::from_str(&json).unwrap();
    assert_eq!(read, ebnf);
    assert_eq!(read.rules()[0].original_text, "[1] a ::= b? - c | ()");
}

#[test]
fn display_reads_back() {
    let ebnf = Ebnf::compile(TURTLE).unwrap();
    for rule in ebnf.rules() {
        let printed = rule.expr.to_string();
        assert_eq!(compile_expr(&printed).unwrap(), rule.expr, "{printed}");
    }
}

#[test]
fn rule_display() {
    let rule = Rule::new("4", Some("a"), RuleKind::Rule, compile_expr("(b | c) d").unwrap());
    assert_eq!(rule.to_string(), "[4] a ::= (b | c) d");
}

/// Expressions in the shape the compiler produces, without singleton groups.
fn expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        "[a-z ]{1,6}".prop_map(Expr::Literal),
        "[a-z0-9-]{1,5}".prop_map(Expr::Range),
        "#x[0-9A-F]{2,4}".prop_map(Expr::Hex),
        "[a-zA-Z][a-zA-Z0-9_]{0,6}".prop_map(Expr::Id),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Expr::Seq),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Expr::Alt),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Expr::Diff(Box::new(a), Box::new(b))),
            inner.clone().prop_map(|a| Expr::Opt(Box::new(a))),
            inner.clone().prop_map(|a| Expr::Star(Box::new(a))),
            inner.prop_map(|a| Expr::Plus(Box::new(a))),
        ]
    })
}

proptest! {
    #[test]
    fn printed_expressions_compile_back(expr in expr()) {
        let printed = expr.to_string();
        prop_assert_eq!(compile_expr(&printed).unwrap(), expr);
    }

    #[test]
    fn sxp_expressions_read_back(expr in expr()) {
        let written = sxp::Sxp(&expr).to_string();
        prop_assert_eq!(sxp::parse_expr(&written).unwrap(), expr);
    }
}
