use embedded_script_eval as ese;
use ese::{Context, Value};
use pretty_assertions::assert_eq;

#[test]
fn eval_simple_arithmetic() {
    let val = ese::eval("1 + 2").unwrap();
    assert_eq!(val.as_i64().unwrap(), 3);
}

#[test]
fn argv_values_reach_the_script() {
    let mut ctx = Context::new();
    let res = ctx
        .load_string_with_args(
            "sum(ARGV)",
            vec![Value::from(1i64), Value::from(2i64), Value::from(3.5)],
        )
        .unwrap();
    assert_eq!(res, Value::Float(6.5));
    assert_eq!(res.as_f64().unwrap(), 6.5);
    assert_eq!(res.to_string(), "6.5");
}

#[test]
fn parse_once_run_many() {
    let mut ctx = Context::new();
    let program = ctx
        .parse("a = 'Hello'\nb = 'World'\na + b")
        .unwrap();
    let first = ctx.run(&program).unwrap();
    let second = ctx.run(&program).unwrap();
    assert_eq!(first.as_str().unwrap(), "HelloWorld");
    assert_eq!(first, second);
}

#[test]
fn builtins_compose_with_operators() {
    assert_eq!(
        ese::eval("unique([3, 3, 1]) + [2]").unwrap(),
        Value::Array(vec![Value::Fixnum(3), Value::Fixnum(1), Value::Fixnum(2)])
    );
    assert_eq!(
        ese::eval("upper('hello') + '!'").unwrap(),
        Value::Str("HELLO!".into())
    );
    assert_eq!(
        ese::eval("max(len('abc'), to_i('2'))").unwrap(),
        Value::Fixnum(3)
    );
}

#[test]
fn scripts_build_and_query_structures() {
    let src = "
        people = [{'name' => 'ada', 'age' => 36}, {'name' => 'alan', 'age' => 41}]
        oldest = people[1]
        upper(oldest['name'])
    ";
    assert_eq!(ese::eval(src).unwrap(), Value::Str("ALAN".into()));
}

#[test]
fn parse_errors_surface_with_line_numbers() {
    let err = ese::eval("ok = 1\n)").unwrap_err();
    assert_eq!(
        err.to_string(),
        "parse error: line 2: unexpected character ')'"
    );
}

#[test]
fn runtime_errors_surface_with_their_message() {
    let err = ese::eval("x = 10\nx / 0").unwrap_err();
    assert_eq!(err.to_string(), "runtime error: divided by 0");
}

#[test]
fn results_decode_strictly() {
    let val = ese::eval("'42'").unwrap();
    let err = val.as_i64().unwrap_err();
    assert_eq!(err.to_string(), "value is not a fixnum but string");
    assert_eq!(val.as_str().unwrap(), "42");
}

#[test]
fn results_convert_to_json() {
    let val = ese::eval("{'xs' => [1, 2.5], 'ok' => true}").unwrap();
    let json = val.to_json();
    assert_eq!(json["xs"][1], serde_json::json!(2.5));
    assert_eq!(json["ok"], serde_json::json!(true));
}
