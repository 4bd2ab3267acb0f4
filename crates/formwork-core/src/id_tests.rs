use crate::{IdCategory, IdGenerator};

#[test]
fn ids_are_unique_within_a_run() {
    let mut ids = IdGenerator::new();

    let a = ids.next(IdCategory::CompileAst);
    let b = ids.next(IdCategory::CompileAst);
    let c = ids.next(IdCategory::CompilePseudo);

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn categories_count_independently() {
    let mut ids = IdGenerator::new();

    let ast = ids.next(IdCategory::CompileAst);
    let pseudo = ids.next(IdCategory::CompilePseudo);
    let runtime = ids.next(IdCategory::RuntimeAst);

    assert_eq!(ast.seq(), 1);
    assert_eq!(pseudo.seq(), 1);
    assert_eq!(runtime.seq(), 1);
    assert_ne!(ast, pseudo);
    assert_ne!(pseudo, runtime);
}

#[test]
fn display_renders_category_and_counter() {
    let mut ids = IdGenerator::new();

    ids.next(IdCategory::CompileAst);
    let second = ids.next(IdCategory::CompileAst);

    assert_eq!(second.to_string(), "compile_ast:2");
    assert_eq!(
        ids.next(IdCategory::CompilePseudo).to_string(),
        "compile_pseudo:1"
    );
}

#[test]
fn structural_equality_matches_string_equality() {
    let mut left = IdGenerator::new();
    let mut right = IdGenerator::new();

    let a = left.next(IdCategory::RuntimeAst);
    let b = right.next(IdCategory::RuntimeAst);

    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());
}
