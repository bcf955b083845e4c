use retrace::{
    at_least, many, one_of, Grammar, ParseError, Parser, TokenSpec,
};

#[test]
fn failed_attempt_restores_position_and_keeps_branch_alive() {
    let grammar = Grammar::build(|g| {
        let x = g.register(TokenSpec::literal("x").named("x"))?;
        let doomed: Parser<i64> = Parser::failing(ParseError::NoMatchingToken { offset: 0 });
        let root = Parser::from_fn(move |scope| {
            let before = scope.offset();
            let result = scope.parse(&doomed);
            assert!(result.is_err());
            assert_eq!(scope.offset(), before);
            let found = scope.expect(&x)?;
            Ok(found.text().to_string())
        });
        Ok(root)
    })
    .unwrap();

    assert_eq!(grammar.parse("x").unwrap(), "x");
}

#[test]
fn position_is_monotonic_on_success_and_stable_on_failure() {
    let grammar = Grammar::build(|g| {
        let a = g.register(TokenSpec::literal("a").named("a"))?;
        let b = g.register(TokenSpec::literal("b").named("b"))?;
        let pair = {
            let (a, b) = (a.clone(), b.clone());
            Parser::from_fn(move |scope| {
                scope.expect(&a)?;
                scope.expect(&b)?;
                Ok(())
            })
        };
        let root = Parser::from_fn(move |scope| {
            let before = scope.offset();
            match scope.parse(&pair) {
                Ok(()) => assert!(scope.offset() >= before),
                Err(_) => assert_eq!(scope.offset(), before),
            }
            // consume whatever is left so the end-of-input check passes
            while scope.current_token().is_some() {
                scope
                    .expect(&a)
                    .or_else(|_| scope.expect(&b))
                    .map(|_| ())
                    .unwrap_or(());
            }
            Ok(scope.offset())
        });
        Ok(root)
    })
    .unwrap();

    assert_eq!(grammar.parse("ab").unwrap(), 2);
    assert_eq!(grammar.parse("aa").unwrap(), 2);
}

#[test]
fn inner_attempt_does_not_disturb_outer_alternation() {
    let grammar = Grammar::build(|g| {
        let a = g.register(TokenSpec::literal("a").named("a"))?;
        let b = g.register(TokenSpec::literal("b").named("b"))?;
        let doomed: Parser<()> = Parser::failing(ParseError::NoMatchingToken { offset: 0 });

        let gives_up = {
            let a = a.clone();
            Parser::from_fn(move |scope| {
                scope.expect(&a)?;
                // a speculative sub-parse that fails and is ignored
                let _ = scope.parse(&doomed);
                scope.fail::<String>(ParseError::NoMatchingToken {
                    offset: scope.offset(),
                })
            })
        };
        let takes_both = Parser::from_fn(move |scope| {
            let first = scope.expect(&a)?;
            let second = scope.expect(&b)?;
            Ok(format!("{}{}", first.text(), second.text()))
        });

        Ok(one_of(vec![gives_up, takes_both]))
    })
    .unwrap();

    // the first branch consumes "a" before giving up; the second must see
    // the input from the start again
    assert_eq!(grammar.parse("ab").unwrap(), "ab");
}

#[test]
fn long_alternation_chain_succeeds_on_the_last_branch() {
    let grammar = Grammar::build(|g| {
        let z = g.literal("z", "z")?;
        let mut alternatives: Vec<Parser<String>> = (0..2_000)
            .map(|i| Parser::failing(ParseError::NoMatchingToken { offset: i % 2 }))
            .collect();
        alternatives.push(z.map(|m| m.text().to_string()));
        Ok(one_of(alternatives))
    })
    .unwrap();

    assert_eq!(grammar.parse("z").unwrap(), "z");
}

#[test]
fn folded_or_chain_behaves_like_one_choice() {
    let grammar = Grammar::build(|g| {
        let z = g.literal("z", "z")?;
        let first: Parser<String> = Parser::failing(ParseError::NoMatchingToken { offset: 0 });
        let chained = (0..500)
            .map(|_| Parser::failing(ParseError::NoMatchingToken { offset: 0 }))
            .fold(first, |acc, next: Parser<String>| acc.or(next));
        Ok(chained.or(z.map(|m| m.text().to_string())))
    })
    .unwrap();

    assert_eq!(grammar.parse("z").unwrap(), "z");
}

#[test]
fn repetition_below_lower_bound_reports_shortfall() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        Ok(at_least(3, a).map(|matches| matches.len()))
    })
    .unwrap();

    assert_eq!(grammar.parse("aaaa").unwrap(), 4);

    let err = grammar.parse("aa").unwrap_err();
    match err {
        ParseError::NotEnoughRepetition {
            offset,
            expected,
            actual,
        } => {
            assert_eq!(offset, 2);
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected NotEnoughRepetition, got {other:?}"),
    }
}

#[test]
fn exhausted_choice_aggregates_causes_and_reports_furthest() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let b = g.literal("b", "b")?;
        let c = g.literal("c", "c")?;
        let a_then_b = a.then(b).map(|_| "ab");
        let just_c = c.map(|_| "c");
        Ok(one_of(vec![a_then_b, just_c]))
    })
    .unwrap();

    // branch one consumes "a" and dies at offset 1; branch two dies at 0
    let err = grammar.parse("ax").unwrap_err();
    match &err {
        ParseError::NoViableAlternative { offset, causes } => {
            assert_eq!(*offset, 1);
            assert_eq!(causes.len(), 2);
            assert_eq!(err.principal().offset(), 1);
        }
        other => panic!("expected NoViableAlternative, got {other:?}"),
    }
}

#[test]
fn nested_choices_flatten_their_causes() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let b = g.literal("b", "b")?;
        let c = g.literal("c", "c")?;
        Ok(a.or(b).or(c).map(|m| m.text().to_string()))
    })
    .unwrap();

    let err = grammar.parse("z").unwrap_err();
    match err {
        ParseError::NoViableAlternative { causes, .. } => {
            assert_eq!(causes.len(), 3);
            assert!(causes
                .iter()
                .all(|cause| !matches!(cause, ParseError::NoViableAlternative { .. })));
        }
        other => panic!("expected NoViableAlternative, got {other:?}"),
    }
}

#[test]
fn parse_results_are_deterministic() {
    let grammar = Grammar::build(|g| {
        g.ignore("whitespace", r"\s+")?;
        let int = g.pattern("int", r"\d+")?;
        let plus = g.literal("plus", "+")?;
        Ok(retrace::separated(int.map(|m| m.text().to_string()), plus))
    })
    .unwrap();

    for input in ["1 + 2 + 3", "1 +", "", "nope", "7"] {
        let first = grammar.parse(input);
        let second = grammar.parse(input);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}

#[test]
fn scope_reports_current_token_without_consuming() {
    let grammar = Grammar::build(|g| {
        let a = g.register(TokenSpec::literal("a").named("a"))?;
        let root = Parser::from_fn(move |scope| {
            let peeked = scope.current_token().expect("token available");
            assert_eq!(peeked.text(), "a");
            assert_eq!(scope.offset(), 0);
            let consumed = scope.expect(&a)?;
            assert_eq!(consumed, peeked);
            Ok(scope.offset())
        });
        Ok(root)
    })
    .unwrap();

    assert_eq!(grammar.parse("a").unwrap(), 1);
}

#[test]
fn scope_skip_and_check_compose() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let b = g.literal("b", "b")?;
        let root = Parser::from_fn(move |scope| {
            scope.skip(&a)?;
            let saw_b = scope.check(&b);
            Ok(saw_b)
        });
        Ok(root)
    })
    .unwrap();

    assert_eq!(grammar.parse("ab").unwrap(), true);
    assert_eq!(grammar.parse("a").unwrap(), false);
}

#[test]
fn pure_and_failing_are_inert_on_input() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let tagged = Parser::pure(10).then(a.map(|m| m.text().len() as i32));
        Ok(tagged.map(|(tag, len)| tag + len))
    })
    .unwrap();

    assert_eq!(grammar.parse("a").unwrap(), 11);

    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let doomed: Parser<i32> = Parser::failing(ParseError::NoMatchingToken { offset: 0 });
        Ok(doomed.or(a.map(|_| 1)))
    })
    .unwrap();

    assert_eq!(grammar.parse("a").unwrap(), 1);
}

#[test]
fn many_collects_until_first_failure() {
    let grammar = Grammar::build(|g| {
        let a = g.literal("a", "a")?;
        let b = g.literal("b", "b")?;
        Ok(many(a).then(b).map(|(heads, _)| heads.len()))
    })
    .unwrap();

    assert_eq!(grammar.parse("aaab").unwrap(), 3);
    assert_eq!(grammar.parse("b").unwrap(), 0);
}
