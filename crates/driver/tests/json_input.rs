//! The JSON program format accepted by the CLI.
//!
//! Front ends hand programs over as JSON; these tests pin the shape of that
//! format and check a parsed program runs through the whole pipeline.

use std::cell::Cell;

use basalt_driver::{ApplyOptions, Verdict, apply};
use basalt_smtlib::Script;
use basalt_solver::{SolverBackend, SolverError, SolverResult};
use basalt_verify::Program;

/// Backend that proves everything; counts queries.
struct YesBackend {
    queries: Cell<usize>,
}

impl SolverBackend for YesBackend {
    fn check_sat(&self, _script: &Script) -> Result<SolverResult, SolverError> {
        self.queries.set(self.queries.get() + 1);
        Ok(SolverResult::Unsat)
    }
}

const SET_ONE: &str = r#"
{
  "functions": [
    {
      "name": "set_one",
      "params": [],
      "returns": [{ "name": "x", "ty": "Int" }],
      "precondition": 0,
      "postcondition": 2,
      "blocks": [
        {
          "kind": { "Precondition": { "conditions": [{ "BoolLit": true }] } },
          "successors": [1]
        },
        {
          "kind": "Basic",
          "statements": [
            { "Assign": { "var": { "name": "x", "ty": "Int" }, "value": { "IntLit": 1 } } }
          ],
          "successors": [2]
        },
        {
          "kind": {
            "Postcondition": {
              "conditions": [
                { "Eq": [{ "Var": { "name": "x", "ty": "Int" } }, { "IntLit": 1 }] }
              ]
            }
          }
        }
      ]
    }
  ]
}
"#;

#[test]
fn parses_and_verifies_a_minimal_program() {
    let program: Program = serde_json::from_str(SET_ONE).expect("program parses");
    assert_eq!(program.functions.len(), 1);
    assert_eq!(program.functions[0].blocks.len(), 3);
    assert!(program.predicates.is_empty());
    program.validate().expect("program validates");

    let backend = YesBackend {
        queries: Cell::new(0),
    };
    let outcome = apply(&program, &backend, &ApplyOptions::default()).unwrap();
    assert_eq!(outcome.verdict, Verdict::Ok);
    assert_eq!(outcome.vcs_checked, 1);
    assert_eq!(backend.queries.get(), 1);
}

#[test]
fn omitted_defaults_are_tolerated() {
    // statements/successors/ranking/predicates may all be absent.
    let program: Program = serde_json::from_str(SET_ONE).unwrap();
    let block = &program.functions[0].blocks[2];
    assert!(block.statements.is_empty());
    assert!(block.successors.is_empty());
}

#[test]
fn programs_round_trip_through_json() {
    let program: Program = serde_json::from_str(SET_ONE).unwrap();
    let text = serde_json::to_string(&program).unwrap();
    let again: Program = serde_json::from_str(&text).unwrap();
    assert_eq!(again.functions.len(), program.functions.len());
    assert_eq!(
        again.functions[0].blocks.len(),
        program.functions[0].blocks.len()
    );
    again.validate().expect("round-tripped program validates");
}

#[test]
fn malformed_programs_are_rejected_not_verified() {
    // Precondition id points at a basic block.
    let mut program: Program = serde_json::from_str(SET_ONE).unwrap();
    program.functions[0].precondition = 1;

    let backend = YesBackend {
        queries: Cell::new(0),
    };
    let err = apply(&program, &backend, &ApplyOptions::default()).unwrap_err();
    assert!(err.to_string().contains("malformed IR"));
    assert_eq!(backend.queries.get(), 0, "no oracle query for malformed IR");
}
