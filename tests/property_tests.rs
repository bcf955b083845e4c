use proptest::prelude::*;

use retrace::{left_associative, Grammar};

const MAX_INPUT_BYTES: usize = 256;

// saturating arithmetic so hostile inputs exercise the engine, not overflow
fn sum_grammar() -> Grammar<i64> {
    Grammar::build(|g| {
        g.ignore("whitespace", r"\s+")?;
        let int = g.pattern("int", r"\d+")?;
        let plus = g.literal("plus", "+")?;
        let number = int.map(|m| m.text().parse::<i64>().unwrap_or(i64::MAX));
        Ok(left_associative(number, plus, |l, _, r| l.saturating_add(r)))
    })
    .expect("sum grammar builds")
}

proptest! {
    #[test]
    fn arbitrary_input_never_panics(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let grammar = sum_grammar();
        let _ = grammar.parse(&input);
    }

    #[test]
    fn whitespace_insertion_is_transparent(
        terms in proptest::collection::vec(0i64..1_000, 1..8),
        pad in 0usize..4,
    ) {
        let grammar = sum_grammar();
        let dense = terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("+");
        let spacing = " ".repeat(pad);
        let spaced = terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(&format!("{spacing}+{spacing}"));

        prop_assert_eq!(grammar.parse(&dense).unwrap(), grammar.parse(&spaced).unwrap());
    }

    #[test]
    fn parse_is_deterministic(input in ".*") {
        let grammar = sum_grammar();
        let first = grammar.parse(&input);
        let second = grammar.parse(&input);
        prop_assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn well_formed_sums_evaluate(terms in proptest::collection::vec(0i64..1_000, 1..8)) {
        let grammar = sum_grammar();
        let input = terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        let expected: i64 = terms.iter().sum();
        prop_assert_eq!(grammar.parse(&input).unwrap(), expected);
    }
}
