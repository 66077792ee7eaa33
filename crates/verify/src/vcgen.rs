//! Verification condition generation.
//!
//! Every basic path yields up to three obligations:
//!
//! 1. **Path correctness**: the head annotation implies the weakest
//!    precondition of the tail annotation over the path's statements.
//! 2. **Ranking bound**: every component of the head measure is
//!    non-negative under the head annotation.
//! 3. **Ranking decrease**: executing the path strictly decreases the
//!    lexicographic measure, proved against a frozen snapshot of the
//!    pre-state.
//!
//! Each condition carries a human-readable description and a location for
//! error reporting, and validity of all of them implies the path respects
//! the surrounding contracts.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::IrError;
use crate::expr::{Expr, Variable, big_and};
use crate::ir::BlockId;
use crate::path::{BasicPath, PathStatement, TailKind};
use crate::wp::{lex_gt, wp_all};

/// Classification of verification conditions for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcKind {
    /// Head annotation implies wp of the tail annotation.
    PathCorrectness,
    /// Every head ranking component is non-negative.
    RankingNonNegative,
    /// The lexicographic measure strictly decreases along the path.
    RankingDecrease,
}

impl fmt::Display for VcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcKind::PathCorrectness => write!(f, "correctness"),
            VcKind::RankingNonNegative => write!(f, "ranking bound"),
            VcKind::RankingDecrease => write!(f, "ranking decrease"),
        }
    }
}

/// Location information for a verification condition.
#[derive(Debug, Clone)]
pub struct VcLocation {
    pub function: String,
    pub head_block: BlockId,
    pub tail_block: BlockId,
    pub vc_kind: VcKind,
}

/// A single proof obligation with metadata for error reporting.
#[derive(Debug, Clone)]
pub struct VerificationCondition {
    /// Human-readable description of what is being verified
    pub description: String,
    /// The obligation itself; validity means the path is correct
    pub formula: Expr,
    pub location: VcLocation,
}

impl fmt::Display for VerificationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.location.vc_kind, self.description, self.formula
        )
    }
}

/// Build the verification conditions for one basic path.
pub fn generate_vcs(path: &BasicPath) -> Result<Vec<VerificationCondition>, IrError> {
    let mut conditions = Vec::new();
    let span = span_label(path);

    // (1) Partial correctness: head ⇒ wp*(tail)
    let post = big_and(path.tail_conditions.iter().cloned());
    let correctness = Expr::implies(
        big_and(path.head_conditions.iter().cloned()),
        wp_all(&path.statements, post),
    );
    conditions.push(VerificationCondition {
        description: format!("correctness of {span}"),
        formula: correctness,
        location: location(path, VcKind::PathCorrectness),
    });

    // (2) Well-foundedness: the head measure is component-wise non-negative.
    if !path.head_ranking.is_empty() {
        let non_negative = big_and(
            path.head_ranking
                .iter()
                .map(|r| Expr::ge(r.clone(), Expr::IntLit(0))),
        );
        conditions.push(VerificationCondition {
            description: format!(
                "ranking functions non-negative at block {} of {}",
                path.head, path.function
            ),
            formula: Expr::implies(
                big_and(path.head_conditions.iter().cloned()),
                non_negative,
            ),
            location: location(path, VcKind::RankingNonNegative),
        });
    }

    // (3) Lexicographic decrease, only when the path closes a cycle on the
    // measure: both ends must carry ranking tuples. Assert tails and
    // measureless tails are known descending.
    if !path.head_ranking.is_empty() && !path.tail_ranking.is_empty() {
        if path.head_ranking.len() != path.tail_ranking.len() {
            return Err(IrError::RankingArity {
                function: path.function.clone(),
                head: path.head,
                tail: path.tail,
                head_len: path.head_ranking.len(),
                tail_len: path.tail_ranking.len(),
            });
        }

        // Freeze the pre-state: one consistent rename across the whole
        // tuple, fresh against every name in the path.
        let (rename, snapshot_pairs) = snapshot_map(path);
        let frozen_head: Vec<Expr> = path
            .head_ranking
            .iter()
            .map(|r| r.subst_map(&rename))
            .collect();

        let decrease = lex_gt(&frozen_head, &path.tail_ranking);
        let propagated = wp_all(&path.statements, decrease);

        let antecedent = big_and(
            snapshot_pairs
                .iter()
                .map(|(orig, copy)| {
                    Expr::eq(Expr::Var(orig.clone()), Expr::Var(copy.clone()))
                })
                .chain(path.head_conditions.iter().cloned()),
        );
        conditions.push(VerificationCondition {
            description: format!("ranking measure decreases along {span}"),
            formula: Expr::implies(antecedent, propagated),
            location: location(path, VcKind::RankingDecrease),
        });
    }

    tracing::debug!(
        function = %path.function,
        head = path.head,
        tail = path.tail,
        vc_count = conditions.len(),
        "Built verification conditions"
    );
    Ok(conditions)
}

fn location(path: &BasicPath, vc_kind: VcKind) -> VcLocation {
    VcLocation {
        function: path.function.clone(),
        head_block: path.head,
        tail_block: path.tail,
        vc_kind,
    }
}

fn span_label(path: &BasicPath) -> String {
    let tail = match &path.tail_kind {
        TailKind::CutPoint => format!("block {}", path.tail),
        TailKind::Assertion => format!("assertion in block {}", path.tail),
        TailKind::Call { callee } => format!("call to {callee} in block {}", path.tail),
    };
    format!("{}: block {} -> {tail}", path.function, path.head)
}

/// Build the pre-state snapshot for the head ranking tuple.
///
/// Returns the rename map (`x ↦ x_pre…`, one entry per free variable of the
/// tuple, consistent across every component) and the `(original, copy)`
/// pairs for the snapshot equalities, in deterministic name order. Copy
/// names are uniquified against every variable mentioned anywhere in the
/// path.
fn snapshot_map(path: &BasicPath) -> (HashMap<String, Expr>, Vec<(Variable, Variable)>) {
    let mut used = path_variable_names(path);

    // Sorted so equalities and declarations come out in a stable order.
    let mut to_copy: BTreeMap<String, Variable> = BTreeMap::new();
    for r in &path.head_ranking {
        for v in r.free_vars() {
            to_copy.insert(v.name.clone(), v);
        }
    }

    let mut rename = HashMap::new();
    let mut pairs = Vec::new();
    for (name, var) in to_copy {
        let mut copy_name = format!("{name}_pre");
        let mut counter = 1;
        while used.contains(&copy_name) {
            copy_name = format!("{name}_pre{counter}");
            counter += 1;
        }
        used.insert(copy_name.clone());

        let copy = Variable::new(copy_name, var.ty);
        rename.insert(name, Expr::Var(copy.clone()));
        pairs.push((var, copy));
    }
    (rename, pairs)
}

/// Every variable name mentioned anywhere in the path.
fn path_variable_names(path: &BasicPath) -> BTreeSet<String> {
    fn add_expr(e: &Expr, names: &mut BTreeSet<String>) {
        for v in e.free_vars() {
            names.insert(v.name);
        }
    }

    let mut names = BTreeSet::new();

    for e in path
        .head_conditions
        .iter()
        .chain(&path.tail_conditions)
        .chain(&path.head_ranking)
        .chain(&path.tail_ranking)
    {
        add_expr(e, &mut names);
    }
    for stmt in &path.statements {
        match stmt {
            PathStatement::Assume(c) => add_expr(c, &mut names),
            PathStatement::Assign { var, value } => {
                names.insert(var.name.clone());
                add_expr(value, &mut names);
            }
            PathStatement::SubscriptAssign {
                array,
                index,
                value,
            } => {
                names.insert(array.name.clone());
                add_expr(index, &mut names);
                add_expr(value, &mut names);
            }
        }
    }
    names
}
