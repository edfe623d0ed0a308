use crate::Lexer;

#[test]
fn cursor_moves_forward_only_by_request() {
    let mut lexer = Lexer::new("abc");
    assert_eq!(0, lexer.pos());
    assert!(!lexer.is_done());
    lexer.fwd(2);
    assert_eq!("c", lexer.rest());
    assert_eq!("bc", lexer.substring_from(1));
    lexer.fwd(1);
    assert!(lexer.is_done());
    assert_eq!("", lexer.rest());
}
