use super::token::{tokenize, Token, TokenizerError};

fn word(w: &str) -> Token {
    Token::Word(w.to_string())
}

fn assert_tokens(code: &str, expected: Vec<Token>) {
    let tokens = tokenize(code).expect("valid tokens");
    assert_eq!(tokens, expected, "tokenizing {:?}", code);
}

#[test]
fn words_and_structure() {
    assert_tokens(
        "(+ 1 2)",
        vec![
            Token::Open,
            word("+"),
            word("1"),
            word("2"),
            Token::Close,
        ],
    );
}

#[test]
fn parens_need_no_surrounding_space() {
    assert_tokens(
        "(car(cdr x))",
        vec![
            Token::Open,
            word("car"),
            Token::Open,
            word("cdr"),
            word("x"),
            Token::Close,
            Token::Close,
        ],
    );
}

#[test]
fn quote_is_its_own_token() {
    assert_tokens(
        "'(a 'b)",
        vec![
            Token::Quote,
            Token::Open,
            word("a"),
            Token::Quote,
            word("b"),
            Token::Close,
        ],
    );
}

#[test]
fn dot_is_recognized_standalone() {
    assert_tokens(
        "(a . b)",
        vec![
            Token::Open,
            word("a"),
            Token::Dot,
            word("b"),
            Token::Close,
        ],
    );
    // A dot glued into a word is just part of the word.
    assert_tokens("1.5", vec![word("1.5")]);
}

#[test]
fn string_literals_are_verbatim() {
    assert_tokens(
        "(display \"hello world\")",
        vec![
            Token::Open,
            word("display"),
            Token::Str("hello world".to_string()),
            Token::Close,
        ],
    );
}

#[test]
fn strings_protect_delimiters_and_semicolons() {
    assert_tokens(
        "\"a ; (not a comment)\" x",
        vec![Token::Str("a ; (not a comment)".to_string()), word("x")],
    );
}

#[test]
fn no_escape_processing_inside_strings() {
    assert_tokens("\"a\\b\"", vec![Token::Str("a\\b".to_string())]);
}

#[test]
fn comments_run_to_end_of_line() {
    assert_tokens(
        "x ; the rest (is ignored\ny",
        vec![word("x"), word("y")],
    );
}

#[test]
fn empty_and_blank_input() {
    assert_tokens("", vec![]);
    assert_tokens("   \n\t\n; only a comment", vec![]);
}

#[test]
fn unterminated_string_is_an_error() {
    assert_eq!(
        tokenize("(display \"oops)"),
        Err(TokenizerError::UnterminatedString)
    );
}

#[test]
fn adjacent_strings_keep_their_contents() {
    assert_tokens(
        "\"a\"\"b\"",
        vec![Token::Str("a".to_string()), Token::Str("b".to_string())],
    );
}
