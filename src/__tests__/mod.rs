mod autocompletion_test;
mod builtins_test;
mod highlevel_test;
mod lexer_test;
mod matcher_test;
