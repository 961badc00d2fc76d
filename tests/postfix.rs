//! Postfix rendering tests — the `intermediate()` form of whole programs.

use std::rc::Rc;

use shunt::compiler::Compiler;
use shunt::report::{LoggerReport, MemoryLogger};

fn postfix(source: &str) -> String {
    let report = Rc::new(LoggerReport::new(MemoryLogger::default(), false));
    let result = Compiler::new(report).compile(source);
    assert!(result.is_ok(), "{source:?}: {:?}", result.error());
    result.intermediate()
}

#[test]
fn parenthesised_sum_times_constant() {
    assert_eq!(postfix("(2+3)*5"), "2 3 + 5 * EOL");
}

#[test]
fn mixed_precedence_with_variables() {
    assert_eq!(
        postfix("12 + a * (b * c + d / e)"),
        "12 a b c * d e / + * + EOL"
    );
}

#[test]
fn word_operators() {
    assert_eq!(postfix("(2 plus 3) times 5"), "2 3 plus 5 times EOL");
    assert_eq!(postfix("1 plus two"), "1 two plus EOL");
}

#[test]
fn nested_parentheses() {
    assert_eq!(
        postfix("((2+7)/3+(14-3)*4)/2"),
        "2 7 + 3 / 14 3 - 4 * + 2 / EOL"
    );
}

#[test]
fn identifiers_are_literals() {
    assert_eq!(postfix("first + second"), "first second + EOL");
}

#[test]
fn single_argument_calls() {
    assert_eq!(postfix("1 plus pow2(2)"), "1 2 pow2 plus EOL");
    assert_eq!(postfix("1 plus pow(2)"), "1 2 pow plus EOL");
}

#[test]
fn separators_appear_in_output() {
    assert_eq!(postfix("1 plus pow(2, 2)"), "1 2 2 , pow plus EOL");
    assert_eq!(postfix("1 plus min3(3, 1, 2)"), "1 3 1 , 2 , min3 plus EOL");
}

#[test]
fn redundant_parentheses_inside_arguments() {
    assert_eq!(postfix("1 - pow(a + (b), c)"), "1 a b + c , pow - EOL");
    assert_eq!(postfix("1 - pow(a + b, c)"), "1 a b + c , pow - EOL");
}

#[test]
fn nested_calls() {
    assert_eq!(
        postfix("1 - pow(pow(a + b, d), c)"),
        "1 a b + d , pow c , pow - EOL"
    );
}

#[test]
fn variable_declaration() {
    assert_eq!(postfix("val a is 1 plus 2"), "a val 1 2 plus is EOL");
    assert_eq!(postfix("val a = 1"), "a val 1 = EOL");
}

#[test]
fn one_eol_per_statement() {
    assert_eq!(
        postfix("val a = 1\nval b = a + 1\npow(2)"),
        "a val 1 = EOL b val a 1 + = EOL 2 pow EOL"
    );
    assert_eq!(postfix("1; 2"), "1 EOL 2 EOL");
}

#[test]
fn function_declaration_and_call() {
    assert_eq!(
        postfix("fun addOne(x) { x plus 1; }\naddOne(0)"),
        "addOne x fun x 1 plus EOL EOL 0 addOne EOL"
    );
}

#[test]
fn caret_binds_tighter_than_times() {
    assert_eq!(postfix("2 * 3 ^ 2"), "2 3 2 ^ * EOL");
}

#[test]
fn empty_program() {
    assert_eq!(postfix(""), "EOL");
}
