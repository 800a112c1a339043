//! Property test covering the string-literal delimiter/prefix cross-product
//! named in spec §8: for every admissible combination of quote shape
//! (`'`, `"`, `'''`, `"""`) and prefix (`""`, `r`, `b`, `rb`, `br`), the
//! lexer must accept the literal.

use proptest::prelude::*;

use ddl_emulator_core::lexer::{Lexer, TokenKind};

fn quote_shapes() -> impl Strategy<Value = &'static str> {
    prop_oneof!["'", "\"", "'''", "\"\"\""]
}

fn prefixes() -> impl Strategy<Value = &'static str> {
    prop_oneof!["", "r", "b", "rb", "br", "R", "B", "Rb", "bR"]
}

proptest! {
    #[test]
    fn string_literal_cross_product_always_lexes(
        quote in quote_shapes(),
        prefix in prefixes(),
        body in "[A-Za-z0-9 ]{0,12}",
    ) {
        let source = format!("{prefix}{quote}{body}{quote}");
        let tokens = Lexer::tokenize(&source).expect("every admissible literal form should lex");
        let is_bytes = prefix.to_ascii_lowercase().contains('b');
        match &tokens[0].kind {
            TokenKind::StringLiteral(decoded) => {
                prop_assert!(!is_bytes);
                prop_assert_eq!(decoded, &body);
            }
            TokenKind::BytesLiteral(decoded) => {
                prop_assert!(is_bytes);
                prop_assert_eq!(decoded, body.as_bytes());
            }
            other => prop_assert!(false, "expected a literal token, got {other:?}"),
        }
    }
}
