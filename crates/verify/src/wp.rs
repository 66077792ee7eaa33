//! Weakest-precondition propagation.
//!
//! `wp(s, Q)` is the weakest condition that guarantees `Q` after executing
//! `s`. Verification conditions are built by folding `wp` right-to-left over
//! a basic path's statements.

use crate::expr::Expr;
use crate::path::PathStatement;

/// One backward step of the predicate transformer.
///
/// - `wp(assume c, Q) = c ⇒ Q`
/// - `wp(v := e, Q) = Q[v ↦ e]`
/// - `wp(a[i] := e, Q) = Q[a ↦ update(a, i, e, length(a))]`
///
/// The array case substitutes a whole-array update carrying the array's
/// length, so length invariance is preserved through the rewrite.
pub fn wp(stmt: &PathStatement, post: Expr) -> Expr {
    match stmt {
        PathStatement::Assume(cond) => Expr::implies(cond.clone(), post),
        PathStatement::Assign { var, value } => post.subst(&var.name, value),
        PathStatement::SubscriptAssign {
            array,
            index,
            value,
        } => {
            let arr = Expr::Var(array.clone());
            let update = Expr::Update {
                array: Box::new(arr.clone()),
                index: Box::new(index.clone()),
                value: Box::new(value.clone()),
                length: Box::new(Expr::Length(Box::new(arr))),
            };
            post.subst(&array.name, &update)
        }
    }
}

/// Propagate `post` backward through a whole statement sequence.
pub fn wp_all(statements: &[PathStatement], post: Expr) -> Expr {
    statements.iter().rev().fold(post, |q, s| wp(s, q))
}

/// Strict lexicographic order over two equal-length, non-empty tuples:
///
/// `lex_gt([a], [b]) = a > b`
/// `lex_gt(a₀:as, b₀:bs) = a₀ > b₀ ∨ (a₀ = b₀ ∧ lex_gt(as, bs))`
///
/// Callers check arity beforehand; equal non-zero length is an invariant
/// here.
pub fn lex_gt(lhs: &[Expr], rhs: &[Expr]) -> Expr {
    debug_assert!(!lhs.is_empty());
    debug_assert_eq!(lhs.len(), rhs.len());

    let first_gt = Expr::gt(lhs[0].clone(), rhs[0].clone());
    if lhs.len() == 1 {
        first_gt
    } else {
        Expr::Or(vec![
            first_gt,
            Expr::And(vec![
                Expr::eq(lhs[0].clone(), rhs[0].clone()),
                lex_gt(&lhs[1..], &rhs[1..]),
            ]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Variable;

    fn x() -> Variable {
        Variable::int("x")
    }

    fn q() -> Expr {
        Expr::gt(Expr::var(x()), Expr::IntLit(0))
    }

    #[test]
    fn wp_of_assume_is_implication() {
        let c = Expr::ge(Expr::var(Variable::int("y")), Expr::IntLit(0));
        let got = wp(&PathStatement::Assume(c.clone()), q());
        assert_eq!(got, Expr::implies(c, q()));
    }

    #[test]
    fn wp_of_assign_substitutes() {
        let stmt = PathStatement::Assign {
            var: x(),
            value: Expr::IntLit(5),
        };
        let got = wp(&stmt, q());
        assert_eq!(got, Expr::gt(Expr::IntLit(5), Expr::IntLit(0)));
    }

    #[test]
    fn wp_of_subscript_assign_rewrites_to_update() {
        // post: a[0] = 7, statement: a[0] := 7
        let a = Variable::array("a");
        let post = Expr::eq(
            Expr::Select(Box::new(Expr::var(a.clone())), Box::new(Expr::IntLit(0))),
            Expr::IntLit(7),
        );
        let stmt = PathStatement::SubscriptAssign {
            array: a.clone(),
            index: Expr::IntLit(0),
            value: Expr::IntLit(7),
        };
        let got = wp(&stmt, post);

        let arr = Expr::var(a);
        let update = Expr::Update {
            array: Box::new(arr.clone()),
            index: Box::new(Expr::IntLit(0)),
            value: Box::new(Expr::IntLit(7)),
            length: Box::new(Expr::Length(Box::new(arr))),
        };
        let expected = Expr::eq(
            Expr::Select(Box::new(update), Box::new(Expr::IntLit(0))),
            Expr::IntLit(7),
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn wp_all_folds_right_to_left() {
        // x := 1; assume x > 0, against post x = 1:
        // wp(assume) first, then the assignment substitutes into both sides.
        let stmts = vec![
            PathStatement::Assign {
                var: x(),
                value: Expr::IntLit(1),
            },
            PathStatement::Assume(Expr::gt(Expr::var(x()), Expr::IntLit(0))),
        ];
        let post = Expr::eq(Expr::var(x()), Expr::IntLit(1));
        let got = wp_all(&stmts, post);
        let expected = Expr::implies(
            Expr::gt(Expr::IntLit(1), Expr::IntLit(0)),
            Expr::eq(Expr::IntLit(1), Expr::IntLit(1)),
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn wp_all_empty_is_identity() {
        assert_eq!(wp_all(&[], q()), q());
    }

    #[test]
    fn lex_gt_singleton_is_plain_gt() {
        let a = Expr::var(x());
        let b = Expr::var(Variable::int("y"));
        assert_eq!(
            lex_gt(&[a.clone()], &[b.clone()]),
            Expr::gt(a, b)
        );
    }

    #[test]
    fn lex_gt_pair_structure() {
        let a0 = Expr::var(Variable::int("a0"));
        let a1 = Expr::var(Variable::int("a1"));
        let b0 = Expr::var(Variable::int("b0"));
        let b1 = Expr::var(Variable::int("b1"));
        let got = lex_gt(&[a0.clone(), a1.clone()], &[b0.clone(), b1.clone()]);
        let expected = Expr::Or(vec![
            Expr::gt(a0.clone(), b0.clone()),
            Expr::And(vec![Expr::eq(a0, b0), Expr::gt(a1, b1)]),
        ]);
        assert_eq!(got, expected);
    }
}
