use embedded_script_eval::{eval, Value};
use proptest::prelude::*;

proptest! {
    // i64::MIN is excluded: its literal spelling has no in-range positive
    // part for the unary minus to negate.
    #[test]
    fn integer_literals_round_trip(n in (i64::MIN + 1)..=i64::MAX) {
        prop_assert_eq!(eval(&n.to_string()).unwrap(), Value::Fixnum(n));
    }

    #[test]
    fn string_literal_form_reparses_to_the_same_value(s in ".*") {
        let val = Value::Str(s);
        let source = val.inspect();
        prop_assert_eq!(eval(&source).unwrap(), val);
    }

    #[test]
    fn addition_commutes_for_small_integers(a in -1000i64..1000, b in -1000i64..1000) {
        let left = eval(&format!("{a} + {b}")).unwrap();
        let right = eval(&format!("{b} + {a}")).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn float_literals_agree_with_rust_parsing(int in 0i64..10_000, frac in 0u32..10_000) {
        let source = format!("{int}.{frac}");
        let expected: f64 = source.parse().unwrap();
        prop_assert_eq!(eval(&source).unwrap(), Value::Float(expected));
    }
}
